//! weblog-consumer — consume web access logs from Kafka, enrich them from
//! Redis and store the designated customer tier's events in SQL.
//!
//! # Usage
//!
//! ```bash
//! weblog-consumer run --config weblog.yaml
//! WEBLOG_DATABASE_URL=mysql://app:pw@db/logs weblog-consumer run
//! weblog-consumer check-config --config weblog.yaml
//! weblog-consumer info
//! ```

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use weblog_core::{EnrichmentLookup, PipelineLoop, RecordSink, StreamSource};
use weblog_kafka::KafkaStreamSource;
use weblog_redis::RedisLookup;
use weblog_storage::{MySqlRecordSink, SqliteRecordSink};

use config::{AppConfig, StorageBackend, ENV_DATABASE_URL, ENV_KAFKA_BROKERS, ENV_REDIS_NODES};

#[derive(Parser)]
#[command(
    name = "weblog-consumer",
    version,
    about = "Kafka web-log consumer with Redis tier enrichment and SQL persistence",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consume until interrupted (Ctrl-C or SIGTERM)
    Run {
        /// YAML config file; built-in defaults when omitted
        #[arg(short, long, env = "WEBLOG_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Load and validate the config, then print it with secrets masked
    CheckConfig {
        #[arg(short, long, env = "WEBLOG_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show version and default settings
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = AppConfig::load(config.as_deref())?;
            logging::init_tracing(&config.log)?;
            cmd_run(config).await
        }
        Commands::CheckConfig { config } => {
            let config = AppConfig::load(config.as_deref())?;
            print!("{}", serde_yaml::to_string(&config.redacted())?);
            Ok(())
        }
        Commands::Info => {
            cmd_info();
            Ok(())
        }
    }
}

async fn cmd_run(config: AppConfig) -> Result<()> {
    let source: Arc<dyn StreamSource> = Arc::new(
        KafkaStreamSource::connect(&config.kafka).context("connecting to Kafka")?,
    );
    let sink = connect_sink(&config).await?;
    let lookup: Arc<dyn EnrichmentLookup> = Arc::new(
        RedisLookup::connect(&config.redis)
            .await
            .context("connecting to Redis")?,
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown requested");
            cancel.cancel();
        }
    });

    let mut pipeline = PipelineLoop::new(config.pipeline.clone(), source, lookup, sink);
    let stats = pipeline.run(cancel).await;

    info!(
        batches = stats.batches,
        processed = stats.processed,
        persisted = stats.persisted,
        filtered = stats.filtered,
        decode_errors = stats.decode_errors,
        lookup_errors = stats.lookup_errors,
        persist_errors = stats.persist_errors,
        poll_errors = stats.poll_errors,
        "Consumer stopped"
    );
    Ok(())
}

async fn connect_sink(config: &AppConfig) -> Result<Arc<dyn RecordSink>> {
    let storage = &config.storage;
    let sink: Arc<dyn RecordSink> = match storage.backend {
        StorageBackend::Mysql => Arc::new(
            MySqlRecordSink::connect(&storage.url, storage.options.clone())
                .await
                .context("connecting to MySQL")?,
        ),
        StorageBackend::Sqlite => Arc::new(
            SqliteRecordSink::open(&storage.url, storage.options.clone())
                .await
                .context("opening SQLite database")?,
        ),
    };
    Ok(sink)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn cmd_info() {
    let defaults = AppConfig::default();
    println!("weblog-consumer v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Defaults:");
    println!("  kafka.brokers       {}", defaults.kafka.brokers);
    println!("  kafka.topic         {}", defaults.kafka.topic);
    println!("  kafka.group_id      {}", defaults.kafka.group_id);
    println!("  redis.nodes         {}", defaults.redis.nodes.join(","));
    println!("  storage.backend     {:?}", defaults.storage.backend);
    println!("  storage.table       {}", defaults.storage.options.table);
    println!("  pipeline.poll       {} ms", defaults.pipeline.poll_timeout_ms);
    println!("  pipeline.report     {} s", defaults.pipeline.report_interval_secs);
    println!(
        "  pipeline.tier       {}={}",
        defaults.pipeline.tier_attribute, defaults.pipeline.tier_code
    );
    println!();
    println!("Environment overrides:");
    println!("  {ENV_KAFKA_BROKERS}");
    println!("  {ENV_REDIS_NODES}");
    println!("  {ENV_DATABASE_URL}");
    println!("  RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_config() {
        let cli = Cli::try_parse_from(["weblog-consumer", "run", "--config", "app.yaml"]).unwrap();
        match cli.command {
            Commands::Run { config } => assert_eq!(config, Some(PathBuf::from("app.yaml"))),
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_check_config() {
        let cli = Cli::try_parse_from(["weblog-consumer", "check-config", "-c", "x.yaml"]).unwrap();
        assert!(matches!(cli.command, Commands::CheckConfig { config: Some(_) }));
    }

    #[tokio::test]
    async fn sqlite_backend_connects_in_memory() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.url = "sqlite::memory:".into();
        assert!(connect_sink(&config).await.is_ok());
    }
}
