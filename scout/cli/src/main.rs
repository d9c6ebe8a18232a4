//! rental-scout - Apartment search from the terminal
//!
//! Submits a search to the agent service, prints status updates as they
//! stream in, and finishes with the listing gallery and a map summary.
//!
//! # Usage
//!
//! ```bash
//! # Search against the configured service
//! rental-scout "2br in the mission with laundry, under \$3,500"
//!
//! # Pick models and cap the results
//! rental-scout "studio near a park" --planner claude-3.5-sonnet --max-listings 5
//!
//! # Replay a recorded event stream, 16 bytes at a time
//! rental-scout "replay" --replay recorded.sse --chunk-size 16 --chunk-delay-ms 20
//!
//! # Check the service is up
//! rental-scout --health
//!
//! # Verbose logging
//! RUST_LOG=debug rental-scout "1br in oakland"
//! ```
//!
//! # Environment Variables
//!
//! - `SCOUT_ENDPOINT`: Streaming search endpoint
//! - `SCOUT_CONFIG`: Config file path
//! - `MAPBOX_ACCESS_TOKEN`: Map access token
//! - `RUST_LOG`: Log filter (overrides `--log-level`)

mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use scout_core::map::ControlAction;
use scout_core::{
    load_config, load_config_from_path, ConfigOverrides, Gallery, HeadlessMap, HttpTransport,
    MapSync, ResetViewControl, ScoutConfig, ScriptedResponse, ScriptedTransport, SearchForm,
    SearchSession, SearchTransport, SubmitError, Transition, ViewState,
};

/// rental-scout - stream an apartment search and show the results
#[derive(Parser, Debug)]
#[command(name = "rental-scout")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// What you are looking for, in plain words
    #[arg(required_unless_present = "health")]
    description: Option<String>,

    /// Planner model (gpt-4o-mini, gpt-4o, claude-3.5-sonnet)
    #[arg(short = 'p', long)]
    planner: Option<String>,

    /// Executor model
    #[arg(short = 'e', long)]
    executor: Option<String>,

    /// Show the agent's browser window
    #[arg(long)]
    headed: bool,

    /// Maximum listings to collect (1-50)
    #[arg(short = 'n', long, value_name = "N")]
    max_listings: Option<String>,

    /// Streaming search endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Map access token
    #[arg(long, value_name = "TOKEN")]
    access_token: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "SCOUT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Replay a recorded event stream instead of calling the service
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Replay chunk size in bytes
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    /// Pause between replayed chunks
    #[arg(long, default_value_t = 0)]
    chunk_delay_ms: u64,

    /// Select listing N (1-based) once results are in
    #[arg(long, value_name = "N")]
    select: Option<usize>,

    /// Expand listing N (1-based); repeatable
    #[arg(long, value_name = "N")]
    expand: Vec<usize>,

    /// Show the discovered listing URLs
    #[arg(long)]
    show_urls: bool,

    /// Check the service health endpoint and exit
    #[arg(long)]
    health: bool,

    /// Output width in columns
    #[arg(long, env = "COLUMNS", default_value_t = 80)]
    width: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SCOUT_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("rental_scout={level},scout_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &Args) -> Result<ScoutConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(endpoint) = &args.endpoint {
        overrides = overrides.with_endpoint(endpoint.clone());
    }
    if let Some(token) = &args.access_token {
        overrides = overrides.with_access_token(token.clone());
    }
    overrides
        .apply(&mut config)
        .context("Invalid command-line override")?;

    info!(source = %config.source(), endpoint = %config.service.endpoint, "Configuration resolved");
    Ok(config)
}

async fn build_transport(args: &Args, config: &ScoutConfig) -> Result<Arc<dyn SearchTransport>> {
    let Some(path) = &args.replay else {
        let transport = HttpTransport::new(&config.service)
            .context("Failed to create HTTP transport")?;
        return Ok(Arc::new(transport));
    };

    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read replay file: {path:?}"))?;
    info!(path = ?path, bytes = body.len(), "Replaying recorded stream");

    let transport =
        ScriptedTransport::new([ScriptedResponse::body(body).with_chunk_size(args.chunk_size)]);
    Ok(Arc::new(if args.chunk_delay_ms > 0 {
        transport.with_chunk_delay(Duration::from_millis(args.chunk_delay_ms))
    } else {
        transport
    }))
}

fn build_form(args: &Args, config: &ScoutConfig) -> SearchForm {
    let mut form = config
        .search
        .form(args.description.clone().unwrap_or_default());
    if let Some(planner) = &args.planner {
        form = form.with_planner(planner.clone());
    }
    if let Some(executor) = &args.executor {
        form = form.with_executor(executor.clone());
    }
    if args.headed {
        form = form.with_headless(false);
    }
    if let Some(max) = &args.max_listings {
        form = form.with_max_listings(max.clone());
    }
    form
}

/// Print what a transition added to the state
fn report_progress(transition: Transition, state: &ViewState) {
    match transition {
        Transition::StatusAppended => {
            if let Some(message) = state.status_log().last() {
                eprintln!("… {message}");
            }
        }
        Transition::UrlsReplaced => {
            eprintln!("  {} candidate listing(s) found", state.discovered_urls().len());
        }
        Transition::ListingsReplaced => {
            eprintln!("  {} listing(s) received", state.listings().len());
        }
        Transition::Terminated { failed: true } => {
            eprintln!("✗ {}", state.error().unwrap_or("search failed"));
        }
        Transition::Terminated { failed: false } => eprintln!("✓ search finished"),
        Transition::Ignored => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = resolve_config(&args)?;
    let transport = build_transport(&args, &config).await?;

    if args.health {
        let healthy = transport.health_check().await;
        println!(
            "{}: {}",
            config.service.health_url(),
            if healthy { "healthy" } else { "unreachable" }
        );
        if !healthy {
            anyhow::bail!("Service health check failed");
        }
        return Ok(());
    }

    let mut map = match MapSync::new(HeadlessMap::new(&config.map), &config.map) {
        Ok(mut map) => {
            map.attach_control(Box::new(ResetViewControl::new()), ControlAction::ResetView);
            Some(map)
        }
        Err(e) => {
            warn!(error = %e, "Map disabled");
            None
        }
    };
    let mut gallery = Gallery::new();
    let mut session = SearchSession::new(transport);

    match session.submit_form(&build_form(&args, &config)).await {
        Ok(generation) => info!(%generation, "Search submitted"),
        Err(SubmitError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{field}: {message}");
            }
            anyhow::bail!("Invalid search");
        }
        Err(e) => return Err(e.into()),
    }

    loop {
        tokio::select! {
            transition = session.next_transition() => {
                let Some(transition) = transition else { break };
                report_progress(transition, session.state());
                if let Some(map) = map.as_mut() {
                    map.sync(session.state());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, abandoning search");
                break;
            }
        }
    }

    if let Some(n) = args.select {
        if !session.select(n.checked_sub(1)) {
            warn!(listing = n, "No such listing to select");
        }
    }
    gallery.sync(session.state());
    for n in &args.expand {
        if let Some(index) = n.checked_sub(1) {
            gallery.toggle_expanded(index);
        }
    }
    if args.show_urls {
        gallery.toggle_urls_panel();
    }

    let view = gallery.view(session.state());
    print!("{}", render::render_status(&view.status, args.width));
    print!("{}", render::render_cards(&view, args.width));
    if let Some(map) = map.as_mut() {
        map.sync(session.state());
        print!("{}", render::render_map(map.surface(), args.width));
    }

    if session.state().error().is_some() {
        std::process::exit(1);
    }
    Ok(())
}
