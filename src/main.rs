use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vocalytics_dashboard::report::{self, TeamSnapshot};
use vocalytics_dashboard::{db, Config, MemoryStore, MetricsStore, PgStore, ReportingClient};

#[derive(Parser)]
#[command(name = "vocalytics-dashboard")]
#[command(about = "Call-center analytics service for agent, supervisor and business dashboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        bind: Option<String>,
        /// Serve built-in sample data instead of Postgres
        #[arg(long)]
        demo: bool,
    },
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import analysed calls from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report for a supervisor's team
    Report {
        #[arg(long)]
        supervisor_id: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print an agent's headline metrics from a running service
    AgentSummary {
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vocalytics_dashboard=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port, bind, demo } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(bind) = bind {
                config.bind = bind;
            }

            let store: Arc<dyn MetricsStore> = if demo {
                info!("serving built-in sample data");
                Arc::new(MemoryStore::demo())
            } else {
                Arc::new(PgStore::connect(config.database_url()?, config.max_connections).await?)
            };

            let addr = config.socket_addr()?;
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!(%addr, "dashboard API listening");

            axum::serve(listener, vocalytics_dashboard::router(store))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("shutting down");
                })
                .await?;
        }
        Commands::InitDb => {
            let store = PgStore::connect(config.database_url()?, config.max_connections).await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let store = PgStore::connect(config.database_url()?, config.max_connections).await?;
            db::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let store = PgStore::connect(config.database_url()?, config.max_connections).await?;
            let inserted = db::import_csv(store.pool(), &csv).await?;
            println!("Imported {inserted} analysed calls from {}.", csv.display());
        }
        Commands::Report { supervisor_id, out } => {
            let store = PgStore::connect(config.database_url()?, config.max_connections).await?;
            let snapshot = TeamSnapshot::collect(&store, &supervisor_id)
                .await
                .context("failed to collect team metrics")?;
            let report = report::build_report(&supervisor_id, Utc::now().date_naive(), &snapshot);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::AgentSummary { agent_id, base_url } => {
            let base_url = base_url.unwrap_or(config.reporting_base_url);
            let client = ReportingClient::new(&base_url)?;
            let agent = client.agent();

            let (today, score, rank) = tokio::join!(
                agent.calls_today(&agent_id),
                agent.performance_score(&agent_id),
                agent.leaderboard_rank(&agent_id),
            );
            let tags = agent.calls_by_tag(&agent_id).await;

            println!("Agent {agent_id}");
            println!("- Calls today: {today}");
            println!("- Performance score: {:.0}%", score * 100.0);
            if rank > 0 {
                println!("- Leaderboard rank: #{rank}");
            } else {
                println!("- Leaderboard rank: unranked");
            }
            for tag in tags.iter() {
                println!("- {}: {} calls", tag.tag, tag.count);
            }
        }
    }

    Ok(())
}
