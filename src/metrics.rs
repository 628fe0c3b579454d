use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{DailyVolume, SentimentCount, TagCount, TagSentimentCount};

pub const AGENT_TOP_TAGS: usize = 5;
pub const HEATMAP_TOP_TAGS: usize = 6;
pub const RECENT_ESCALATIONS: usize = 4;
pub const RECENT_CALLS: usize = 5;
pub const SUPERVISOR_ESCALATIONS: usize = 10;
pub const LEADERBOARD_SIZE: usize = 15;
pub const BUSINESS_TOP_TAGS: usize = 20;
pub const ESCALATION_TOP_TAGS: usize = 10;

/// Days covered by the rolling weekly window, counted back from today's midnight.
pub const WEEKLY_WINDOW_DAYS: i64 = 7;

/// Score contribution of one analysed call.
pub fn sentiment_weight(sentiment: &str) -> f64 {
    match sentiment {
        "positive" => 1.0,
        "neutral" => 0.5,
        _ => 0.0,
    }
}

/// Mean sentiment weight rounded to two decimals, `None` when there are no calls.
pub fn performance_score<'a>(sentiments: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    let (total, count) = sentiments
        .into_iter()
        .fold((0.0, 0usize), |(total, count), s| (total + sentiment_weight(s), count + 1));

    if count == 0 {
        return None;
    }

    Some(round2(total / count as f64))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Competition ranking by volume, highest first: equal volumes share a rank
/// and the following rank skips.
pub fn rank_by_volume(volumes: &HashMap<String, i64>) -> HashMap<String, i64> {
    let mut ordered: Vec<(&String, i64)> = volumes.iter().map(|(id, v)| (id, *v)).collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut ranks = HashMap::with_capacity(ordered.len());
    let mut previous: Option<i64> = None;
    let mut current_rank = 0;

    for (position, (id, volume)) in ordered.into_iter().enumerate() {
        if previous != Some(volume) {
            current_rank = position as i64 + 1;
            previous = Some(volume);
        }
        ranks.insert(id.clone(), current_rank);
    }

    ranks
}

/// Expands every tag list one row per tag, then keeps the `limit` most
/// frequent. Equal counts are ordered by tag.
pub fn top_tags<'a, I>(tag_lists: I, limit: usize) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for tags in tag_lists {
        for tag in tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    rows.truncate(limit);
    rows
}

/// Sentiment histogram ordered by label.
pub fn count_by_sentiment<'a>(sentiments: impl IntoIterator<Item = &'a str>) -> Vec<SentimentCount> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for sentiment in sentiments {
        *counts.entry(sentiment).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(overall_sentiment, count)| SentimentCount {
            overall_sentiment: overall_sentiment.to_string(),
            count,
        })
        .collect()
}

/// Cross-tabulates tag × sentiment over the `limit` most frequent tags,
/// ordered by tag then sentiment.
pub fn tag_sentiment_heatmap<'a, I>(rows: I, limit: usize) -> Vec<TagSentimentCount>
where
    I: IntoIterator<Item = (&'a [String], &'a str)> + Clone,
{
    let top: Vec<String> = top_tags(rows.clone().into_iter().map(|(tags, _)| tags), limit)
        .into_iter()
        .map(|row| row.tag)
        .collect();

    let mut cells: BTreeMap<(&str, &str), i64> = BTreeMap::new();
    for (tags, sentiment) in rows {
        for tag in tags {
            if top.iter().any(|t| t == tag) {
                *cells.entry((tag.as_str(), sentiment)).or_insert(0) += 1;
            }
        }
    }

    cells
        .into_iter()
        .map(|((tag, overall_sentiment), count)| TagSentimentCount {
            tag: tag.to_string(),
            overall_sentiment: overall_sentiment.to_string(),
            count,
        })
        .collect()
}

/// Per-day call counts; days without calls produce no row.
pub fn daily_volume(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<DailyVolume> {
    let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for at in timestamps {
        *days.entry(at.date_naive()).or_insert(0) += 1;
    }

    days.into_iter()
        .map(|(day, count)| DailyVolume { day, count })
        .collect()
}

pub fn weekly_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    midnight(now.date_naive() - Duration::days(WEEKLY_WINDOW_DAYS))
}

pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    midnight(today.with_day(1).unwrap_or(today))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

const REFERENCE_TAGS: [(&str, [i64; 3]); 6] = [
    ("credit card", [50, 25, 25]),
    ("auto loan", [70, 20, 10]),
    ("interest rate", [60, 30, 10]),
    ("online banking", [65, 20, 15]),
    ("credit score", [70, 15, 15]),
    ("interest rates", [60, 25, 15]),
];

const REFERENCE_SENTIMENTS: [&str; 3] = ["positive", "neutral", "negative"];

/// Modeled sentiment percentages for the known product tags. This is a fixed
/// reference table and does not read live data.
pub fn sentiment_by_tag_reference() -> Vec<TagSentimentCount> {
    REFERENCE_TAGS
        .iter()
        .flat_map(|(tag, shares)| {
            REFERENCE_SENTIMENTS
                .iter()
                .zip(shares.iter())
                .map(move |(sentiment, share)| TagSentimentCount {
                    tag: tag.to_string(),
                    overall_sentiment: sentiment.to_string(),
                    count: *share,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn score_weights_sentiments() {
        let score = performance_score(["positive", "neutral", "negative"]);
        assert_eq!(score, Some(0.5));
        assert_eq!(performance_score(["positive", "positive", "neutral"]), Some(0.83));
        assert_eq!(performance_score(std::iter::empty::<&str>()), None);
    }

    #[test]
    fn unknown_sentiment_scores_zero() {
        assert_eq!(sentiment_weight("mixed"), 0.0);
    }

    #[test]
    fn ties_share_rank_and_next_rank_skips() {
        let volumes = HashMap::from([
            ("A1".to_string(), 10),
            ("A2".to_string(), 10),
            ("A3".to_string(), 5),
        ]);
        let ranks = rank_by_volume(&volumes);
        assert_eq!(ranks["A1"], 1);
        assert_eq!(ranks["A2"], 1);
        assert_eq!(ranks["A3"], 3);
    }

    #[test]
    fn tags_expand_one_row_per_tag() {
        let lists = [tags(&["billing", "urgent"]), tags(&["billing"])];
        let rows = top_tags(lists.iter().map(Vec::as_slice), 5);
        assert_eq!(
            rows,
            vec![
                TagCount { tag: "billing".to_string(), count: 2 },
                TagCount { tag: "urgent".to_string(), count: 1 },
            ]
        );
        assert!(rows.iter().all(|row| row.tag != "billing,urgent"));
    }

    #[test]
    fn top_tags_respects_limit() {
        let lists = [tags(&["a", "b", "c", "d"]), tags(&["a", "b"]), tags(&["a"])];
        let rows = top_tags(lists.iter().map(Vec::as_slice), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tag, "a");
        assert_eq!(rows[1].tag, "b");
    }

    #[test]
    fn sentiment_counts_are_ordered_by_label() {
        let rows = count_by_sentiment(["positive", "negative", "positive", "neutral"]);
        let labels: Vec<&str> = rows.iter().map(|r| r.overall_sentiment.as_str()).collect();
        assert_eq!(labels, vec!["negative", "neutral", "positive"]);
        assert_eq!(rows[2].count, 2);
    }

    #[test]
    fn heatmap_only_covers_top_tags() {
        let a = tags(&["billing", "urgent"]);
        let b = tags(&["billing"]);
        let c = tags(&["refund"]);
        let rows = vec![
            (a.as_slice(), "negative"),
            (b.as_slice(), "positive"),
            (c.as_slice(), "neutral"),
        ];
        let cells = tag_sentiment_heatmap(rows, 2);
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|cell| cell.tag != "urgent"));
        assert_eq!(cells[0].tag, "billing");
        assert_eq!(cells[0].overall_sentiment, "negative");
    }

    #[test]
    fn daily_volume_skips_empty_days() {
        let now = Utc::now();
        let rows = daily_volume([now, now - Duration::days(3), now - Duration::days(3)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[1].day, now.date_naive());
    }

    #[test]
    fn windows_start_at_midnight() {
        let now = Utc::now();
        assert_eq!(
            weekly_cutoff(now).date_naive(),
            now.date_naive() - Duration::days(7)
        );
        assert_eq!(month_start(now).day(), 1);
        assert_eq!(month_start(now).month(), now.month());
    }

    #[test]
    fn reference_table_is_static() {
        let rows = sentiment_by_tag_reference();
        assert_eq!(rows.len(), 18);
        assert_eq!(rows[0].tag, "credit card");
        assert_eq!(rows[0].overall_sentiment, "positive");
        assert_eq!(rows[0].count, 50);
        assert_eq!(rows[5].count, 10);
    }
}
