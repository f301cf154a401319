use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::net::IpAddr;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use knock::cli::Args;
use knock::config::Config;
use knock::export::export_csv;
use knock::lookup;
use knock::monitor::ProbeEngine;
use knock::printer::{JsonPrinter, Observer, PrinterOptions, TextPrinter};
use knock::probe::{interface_source_ip, validate_interface};
use knock::state::Target;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Diagnostics go to stderr and stay quiet unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from(&args);

    // Resolve the target up front; a startup resolution failure is fatal
    let resolved = lookup::resolve(&args.host, config.family, config.resolve_timeout)
        .await
        .with_context(|| format!("failed to resolve target: {}", args.host))?;

    // Source binding: an interface name becomes its first usable address of
    // the target's family
    let source_ip: Option<IpAddr> = if let Some(ref name) = args.interface {
        let info = validate_interface(name)?;
        Some(interface_source_ip(&info, resolved.is_ipv6())?)
    } else {
        args.source_ip
    };

    if let Some(src) = source_ip {
        if src.is_ipv4() != resolved.is_ipv4() {
            anyhow::bail!(
                "Source address {} and target {} are different address families",
                src,
                resolved
            );
        }
    }

    let target = Target::new(args.host.clone(), resolved, args.port, config.family);

    let observer: Box<dyn Observer> = if args.json {
        Box::new(JsonPrinter::new())
    } else {
        Box::new(TextPrinter::new(PrinterOptions::from(&args)))
    };

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        cancel_clone.cancel();
    });

    let mut engine = ProbeEngine::new(config, target, observer, cancel, source_ip);
    let outcome = engine.run().await;

    if let Some(ref path) = args.csv {
        let file =
            File::create(path).with_context(|| format!("failed to create CSV file: {}", path))?;
        export_csv(engine.stats(), file)?;
    }

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
