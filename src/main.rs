mod config;
mod coordinator;
mod emitter;
mod error;
mod feed;
mod normalize;
mod prompt;
mod queue;
mod types;

use anyhow::{Context, Result};
use config::Config;
use coordinator::Collector;
use emitter::Emitter;
use normalize::StaticDirectory;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "ytt.toml";
const DEFAULT_LOG_FILTER: &str = "ytt_collector=info";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args: Vec<String> = env::args().collect();
    let _bin = args.remove(0);
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    match args[0].as_str() {
        "run" => run_collector(&args[1..]).await,
        "check-config" => check_config(&args[1..]),
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            Err(anyhow::anyhow!("unknown command: {other}"))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env::var("RUST_LOG").ok()))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` wins when set and valid; otherwise the collector logs at info.
fn log_filter(spec: Option<String>) -> EnvFilter {
    spec.filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn run_collector(args: &[String]) -> Result<()> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut events_path: Option<PathBuf> = None;
    let mut output_dir: Option<PathBuf> = None;
    let mut queue_len: Option<usize> = None;
    let mut cooldown: Option<usize> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let value = args.get(i + 1).context("--config requires a value")?;
                config_path = PathBuf::from(value);
                i += 2;
            }
            "--events" => {
                let value = args.get(i + 1).context("--events requires a value")?;
                events_path = Some(PathBuf::from(value));
                i += 2;
            }
            "--output-dir" => {
                let value = args.get(i + 1).context("--output-dir requires a value")?;
                output_dir = Some(PathBuf::from(value));
                i += 2;
            }
            "--queue-len" => {
                let value = args.get(i + 1).context("--queue-len requires a value")?;
                queue_len = Some(value.parse().context("invalid --queue-len")?);
                i += 2;
            }
            "--cooldown" => {
                let value = args.get(i + 1).context("--cooldown requires a value")?;
                cooldown = Some(value.parse().context("invalid --cooldown")?);
                i += 2;
            }
            "--help" | "-h" => {
                print_run_usage();
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown run argument: {other}"));
            }
        }
    }

    let mut cfg = Config::load(&config_path)?;
    if let Some(dir) = output_dir {
        cfg.output.dir = dir;
    }
    if let Some(len) = queue_len {
        cfg.collector.queue_len = len;
    }
    if let Some(n) = cooldown {
        cfg.collector.cooldown = n;
    }
    cfg.validate()?;

    info!(
        channels = cfg.collector.allowed_channels.len(),
        queue_len = cfg.collector.queue_len,
        cooldown = cfg.collector.cooldown,
        output_dir = %cfg.output.dir.display(),
        "starting collector"
    );

    let persona = cfg.persona.as_ref().map(|p| p.identity());
    let directory = Arc::new(StaticDirectory::new(cfg.users.clone()));
    let collector = Collector::new(
        cfg.collector.clone(),
        persona,
        Emitter::new(cfg.output.dir.clone()),
        directory,
    );

    let events = feed::open(events_path.as_deref()).await?;
    collector.run(events).await
}

fn check_config(args: &[String]) -> Result<()> {
    let path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let cfg = Config::load(&path)?;
    info!(
        path = %path.display(),
        channels = ?cfg.collector.allowed_channels,
        filters = ?cfg.collector.filters(),
        "config ok"
    );
    Ok(())
}

fn print_usage() {
    eprintln!(
        "ytt-collector usage:\n  ytt-collector run [options]\n  ytt-collector check-config [path]"
    );
}

fn print_run_usage() {
    eprintln!(
        "ytt-collector run options:\n  --config <path>\n  --events <path>   (default: stdin)\n  --output-dir <path>\n  --queue-len <n>\n  --cooldown <n>"
    );
}
