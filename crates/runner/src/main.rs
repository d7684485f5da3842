//! The mantis runtime entry point.
//!
//! Wires the live host, the strategy registry, and the executor together,
//! then runs until terminated.
//!
//! # Usage
//!
//! ```bash
//! # Watch a public endpoint with the demo strategy
//! cargo run --release -- --watch https://api.example.com/api/v3/depth?symbol=BTCUSDT
//!
//! # Poll faster
//! cargo run --release -- --watch <url> --period-ms 250
//! ```
//!
//! Real deployments register their own strategies in place of the demo
//! watcher; see `watcher.rs` for the shape of one.

use std::process::exit;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use engine::{Executor, StrategyRegistry};
use host_core::{Host, LogNotifier, Notifier};
use host_http::{HttpHost, HttpHostConfig, WebhookNotifier};
use tracing::{error, info};

mod watcher;

fn print_usage() {
    eprintln!("Usage: mantis [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --watch <url>       Register the demo watcher on <url>");
    eprintln!("  --period-ms <n>     Poll period for the watcher (default 1000)");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("Environment variables:");
    eprintln!("  MANTIS_API_KEY        API key for signed requests");
    eprintln!("  MANTIS_API_SECRET     Secret key for signed requests");
    eprintln!("  MANTIS_WEBHOOK_URL    Webhook for notice/emergency notifications");
    eprintln!("  MANTIS_LOCAL_ADDRS    Comma-separated local addresses for pollers");
    eprintln!("  RUST_LOG              Log filter (default: info)");
}

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment.
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("Loaded environment from: {}", path.display()),
        Err(dotenvy::Error::Io(_)) => {}
        Err(err) => eprintln!("Warning: cannot load .env file: {err}"),
    }

    common::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut watch_url: Option<String> = None;
    let mut period = Duration::from_millis(1000);

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--watch" | "-w" => match iter.next() {
                Some(url) => watch_url = Some(url.clone()),
                None => {
                    eprintln!("--watch requires a URL");
                    print_usage();
                    exit(1);
                }
            },
            "--period-ms" => match iter.next().and_then(|raw| raw.parse().ok()) {
                Some(ms) => period = Duration::from_millis(ms),
                None => {
                    eprintln!("--period-ms requires a number");
                    print_usage();
                    exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                exit(1);
            }
        }
    }

    let notifier: Arc<dyn Notifier> = match WebhookNotifier::from_env() {
        Some(webhook) => {
            info!("webhook notifications enabled");
            Arc::new(webhook)
        }
        None => Arc::new(LogNotifier),
    };

    let host = HttpHost::new(HttpHostConfig::default());
    host.install_signals();

    let mut registry = StrategyRegistry::new();
    if let Some(url) = watch_url {
        let period_for = period;
        registry.register("watcher", move |ctx| {
            let url = url.clone();
            async move { watcher::run(ctx, url, period_for).await }
        });
    }
    if registry.is_empty() {
        eprintln!("No strategies registered; pass --watch <url> or register your own.");
        print_usage();
        exit(1);
    }

    let strategy_names = registry.names();
    let metrics = metrics::create_metrics();
    let mut executor = Executor::new(
        Rc::clone(&host) as Rc<dyn Host>,
        registry,
        Arc::clone(&metrics),
    );

    info!(strategies = ?strategy_names, "starting mantis");
    notifier.notice("mantis started").await;

    match executor.run().await {
        Ok(()) => {
            for name in &strategy_names {
                info!("\n{}", metrics.snapshot(name));
            }
            notifier.notice("mantis terminated").await;
        }
        Err(err) => {
            error!(error = %err, "executor aborted");
            notifier
                .emergency(&format!("mantis aborted: {err}"))
                .await;
            exit(1);
        }
    }
}
