//! Headless accessibility input interceptor.
//!
//! Reads raw input events as JSON lines on stdin, runs them through the
//! enabled chain links and writes whatever survives, plus any synthesized
//! events, as JSON lines on stdout. Logs go to stderr.
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML file, defaults on first run
//!  └─ InputInterceptor::new()  -- logging collaborators, stdout sink
//!  └─ PipelineRuntime::run()   -- tokio task owning the chain
//!  └─ pump_events(stdin)       -- until EOF or Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use a11y_core::FeatureFlags;
use a11y_interceptor::application::interceptor::InputInterceptor;
use a11y_interceptor::application::ports::Collaborators;
use a11y_interceptor::infrastructure::input_source::JsonLinesSource;
use a11y_interceptor::infrastructure::output::{
    LoggingMagnifier, LoggingNotifier, LoggingRegistration, NullFocus, StdoutTarget,
};
use a11y_interceptor::infrastructure::runtime::{pump_events, PipelineRuntime};
use a11y_interceptor::infrastructure::storage::config::{default_config_path, load_config};

#[derive(Debug, Parser)]
#[command(name = "a11y-interceptor", version, about = "Accessibility input interception pipeline")]
struct Cli {
    /// Path to the TOML config file. Defaults to the platform config directory.
    #[arg(long, env = "A11Y_INPUT_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated features to enable, overriding the config file
    /// (e.g. "touch-exploration,key-filtering").
    #[arg(long, value_parser = FeatureFlags::parse_list)]
    features: Option<FeatureFlags>,

    /// Log level used when RUST_LOG is unset, overriding the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => default_config_path().context("no --config given and no platform config dir")?,
    };
    let config = load_config(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    let level = cli
        .log_level
        .unwrap_or_else(|| config.service.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let features = cli
        .features
        .unwrap_or_else(|| config.service.feature_flags());
    info!(config = %path.display(), %features, "a11y-interceptor starting");

    let services = Collaborators {
        target: Arc::new(StdoutTarget::stdout()),
        notifier: Arc::new(LoggingNotifier),
        focus: Arc::new(NullFocus),
        magnifier: Arc::new(LoggingMagnifier),
        registration: Arc::new(LoggingRegistration),
    };
    let mut interceptor = InputInterceptor::new(config.pipeline, services);
    interceptor.set_features(features);

    let (runtime, handle) = PipelineRuntime::new(interceptor);
    let runtime_task = tokio::spawn(runtime.run());

    let source = JsonLinesSource::new(BufReader::new(tokio::io::stdin()));
    tokio::select! {
        pumped = pump_events(source, handle.clone()) => {
            let forwarded = pumped.context("reading input events from stdin")?;
            info!(forwarded, "input stream ended");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutdown signal received");
        }
    }

    if handle.shutdown().await.is_err() {
        warn!("runtime had already stopped");
    }
    runtime_task.await.context("pipeline runtime task panicked")?;
    info!("a11y-interceptor stopped");
    Ok(())
}
