//! offline-cache CLI: drive a disk-backed cache worker from the command line.
//!
//! Usage:
//!   offline-cache-cli classify <url>          Show how a request would be routed
//!   offline-cache-cli fetch <url>             Run a GET through the cache layer
//!   offline-cache-cli install                 Pre-warm the static partition and activate
//!   offline-cache-cli activate                Delete partitions outside the current version
//!   offline-cache-cli send <json>             Send a control message, print the reply
//!   offline-cache-cli size                    Total cached body bytes
//!   offline-cache-cli clear                   Delete every partition
//!   offline-cache-cli list                    List partitions and entry counts

use anyhow::Context;
use offline_cache::cache::PartitionName;
use offline_cache::config::{StoreConfig, WorkerConfig};
use offline_cache::control::ControlMessage;
use offline_cache::strategy::Route;
use offline_cache::types::Request;
use offline_cache::CacheWorker;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_ORIGIN: &str = "http://localhost:3000/";
const DEFAULT_DIR: &str = ".offline-cache";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "classify" => cmd_classify(&args[2..]),
        "fetch" => cmd_fetch(&args[2..]).await,
        "install" => cmd_install(&args[2..]).await,
        "activate" => cmd_activate(&args[2..]).await,
        "send" => cmd_send(&args[2..]).await,
        "size" => cmd_size(&args[2..]).await,
        "clear" => cmd_clear(&args[2..]).await,
        "list" => cmd_list(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("offline-cache-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"offline-cache-cli

USAGE:
    offline-cache-cli <COMMAND> [OPTIONS]

COMMANDS:
    classify <url>              Show the route (bypass or strategy) for a GET of <url>
    fetch <url>                 Run a GET through the cache layer and print the status
    install                     Pre-warm the static partition, then activate
    activate                    Delete partitions outside the current version set
    send <json>                 Send a control message, e.g. '{{"type":"GET_CACHE_SIZE"}}'
    size                        Print the total cached body size in bytes
    clear                       Delete every partition
    list                        List partitions with entry counts
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <path>             YAML worker configuration
    --dir <path>                Cache directory (default: .offline-cache)

ENVIRONMENT:
    OFFLINE_CACHE_ORIGIN        Origin for precache paths (default: {DEFAULT_ORIGIN})
    OFFLINE_CACHE_VERSION       Partition version tag
    OFFLINE_CACHE_DIR           Cache directory
    RUST_LOG                    Log filter (default: info)"#
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
            continue;
        }
        if arg.starts_with("--") {
            skip = true;
            continue;
        }
        return Some(arg);
    }
    None
}

fn load_config(args: &[String]) -> anyhow::Result<WorkerConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => WorkerConfig::from_yaml_file(path)?,
        None => WorkerConfig::new(Url::parse(DEFAULT_ORIGIN)?).with_store(StoreConfig::Disk {
            path: PathBuf::from(DEFAULT_DIR),
        }),
    };
    let mut config = config.apply_env()?;
    if let Some(dir) = flag_value(args, "--dir") {
        config.store = StoreConfig::Disk {
            path: PathBuf::from(dir),
        };
    }
    Ok(config)
}

fn build_worker(args: &[String]) -> anyhow::Result<CacheWorker> {
    Ok(CacheWorker::builder(load_config(args)?).build()?)
}

fn cmd_classify(args: &[String]) -> anyhow::Result<()> {
    let url = positional(args).context("missing <url>")?;
    let config = load_config(args)?;
    let classifier = offline_cache::strategy::Classifier::new(&config.rules)?;
    let partitions = config.partition_set()?;
    match classifier.route(&Request::get(url)?) {
        Route::Bypass(reason) => println!("bypass ({})", reason.as_str()),
        Route::Cache(strategy) => {
            println!("{} -> {}", strategy, partitions.for_strategy(strategy))
        }
    }
    Ok(())
}

async fn cmd_fetch(args: &[String]) -> anyhow::Result<()> {
    let url = positional(args).context("missing <url>")?;
    let worker = build_worker(args)?;
    let response = worker.respond(&Request::get(url)?).await?;
    // Let any background refresh land before the process exits.
    worker.settle().await;
    println!("HTTP {} ({} bytes)", response.status, response.body.len());
    if let Some(ct) = response.header("content-type") {
        println!("content-type: {ct}");
    }
    Ok(())
}

async fn cmd_install(args: &[String]) -> anyhow::Result<()> {
    let worker = build_worker(args)?;
    worker.install().await?;
    let activation = worker.activate().await?;
    println!(
        "installed {} precache entries into {}",
        worker.lifecycle().precache().len(),
        worker.partitions().static_assets
    );
    if activation.deleted.is_empty() {
        println!("no stale partitions");
    } else {
        println!("deleted stale partitions: {}", activation.deleted.join(", "));
    }
    Ok(())
}

/// Garbage collection only: a fresh process has no install to activate from.
async fn cmd_activate(args: &[String]) -> anyhow::Result<()> {
    let worker = build_worker(args)?;
    let keep = worker.partitions().current_names();
    let deleted = worker.registry().delete_all_except(&keep).await?;
    if deleted.is_empty() {
        println!("no stale partitions");
    } else {
        println!("deleted stale partitions: {}", deleted.join(", "));
    }
    Ok(())
}

async fn cmd_send(args: &[String]) -> anyhow::Result<()> {
    let raw = positional(args).context("missing <json>")?;
    let worker = build_worker(args)?;
    let message = ControlMessage::from_json(raw)?;
    match worker.post_message(&message).await? {
        Some(reply) => println!("{}", reply.to_json()?),
        None => println!("(no reply)"),
    }
    Ok(())
}

async fn cmd_size(args: &[String]) -> anyhow::Result<()> {
    let worker = build_worker(args)?;
    println!("{}", worker.cache_size().await?);
    Ok(())
}

async fn cmd_clear(args: &[String]) -> anyhow::Result<()> {
    let worker = build_worker(args)?;
    let deleted = worker.clear().await?;
    println!("deleted {} partition(s)", deleted.len());
    Ok(())
}

async fn cmd_list(args: &[String]) -> anyhow::Result<()> {
    let worker = build_worker(args)?;
    let registry = worker.registry();
    let names = registry.list_names().await?;
    if names.is_empty() {
        println!("(no partitions)");
        return Ok(());
    }
    for name in names {
        let current = if worker.partitions().contains(&name) {
            "current"
        } else if PartitionName::parse(&name).is_ok() {
            "stale"
        } else {
            "foreign"
        };
        let count = registry.entry_count(&name).await?;
        println!("{name:<24} {count:>6} entries  {current}");
    }
    Ok(())
}
