//! samplesd - Image upload-and-annotate server daemon
//!
//! Serves the upload page, stores uploads under `static/Image` and runs the
//! configured analysis program on each of them.
//!
//! Usage:
//!   samplesd [OPTIONS]
//!
//! Without `--config` the built-in defaults are used and no analyzer runs.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use samples_api::config::AnalyzerSettings;
use samples_api::{create_router, AppConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "samplesd")]
#[command(version, about = "Image upload-and-annotate server")]
struct Args {
    /// Server config file (TOML)
    #[arg(short, long, env = "SAMPLESD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Analysis program run for every upload (overrides [analyzer])
    #[arg(short, long)]
    analyzer: Option<String>,

    /// Argument passed to the analysis program before the image location
    #[arg(long = "analyzer-arg", value_name = "ARG", allow_hyphen_values = true)]
    analyzer_args: Vec<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(program) = &self.analyzer {
            config.analyzer = Some(AnalyzerSettings {
                program: program.clone(),
                args: self.analyzer_args.clone(),
            });
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "samplesd=info,samples_api=info,samples_core=info,tower_http=info".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.json_logs);

    tracing::info!("Starting samplesd");

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            AppConfig::load(path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            AppConfig::default()
        }
    };
    args.apply(&mut config);

    match &config.analyzer {
        Some(analyzer) => tracing::info!(program = %analyzer.program, "Analyzer configured"),
        None => tracing::warn!("No analyzer configured; uploads are only stored"),
    }

    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.storage.upload_dir.display()
            )
        })?;

    let state = AppState::from_config(&config);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind {}:{}",
                    config.server.host, config.server.port
                )
            })?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_flags() {
        let args = Args::try_parse_from(["samplesd"]).unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.analyzer.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "samplesd",
            "--port",
            "9000",
            "--host",
            "0.0.0.0",
            "--analyzer",
            "python3",
            "--analyzer-arg",
            "local_analysis.py",
            "--analyzer-arg",
            "--quiet",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        let analyzer = config.analyzer.unwrap();
        assert_eq!(analyzer.program, "python3");
        assert_eq!(analyzer.args, vec!["local_analysis.py", "--quiet"]);
    }

    #[test]
    fn test_analyzer_from_config_kept_without_flag() {
        let args = Args::try_parse_from(["samplesd", "-p", "8081"]).unwrap();
        let mut config = AppConfig::from_toml(
            r#"
            [analyzer]
            program = "analyze.sh"
            "#,
        )
        .unwrap();
        args.apply(&mut config);

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.analyzer.unwrap().program, "analyze.sh");
    }
}
