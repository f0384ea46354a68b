//! serialcup - Serial Capture and Query
//!
//! Captures serial device output into rotating files and queries it back by time or label.

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use serialcup::capture::{spawn_operator_thread, CaptureEngine, CaptureSession};
use serialcup::clock::SystemClock;
use serialcup::device::{find_device, list_devices, open_device, parse_baud_rate};
use serialcup::query::{QueryEngine, QueryRequest};
use serialcup::Settings;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

fn cli() -> Command {
    Command::new("serialcup")
        .version(serialcup::VERSION)
        .about("Capture serial device output into rotating files and query it back")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List serial devices with their serial numbers"))
        .subcommand(
            Command::new("capture")
                .about("Capture a device into hourly files")
                .long_about(
                    "Capture lines from the device with the given serial number into hourly \
                     files under <dir>. Hit <Enter> to pause/resume; type text and hit <Enter> \
                     to insert it as an annotation line.",
                )
                .arg(Arg::new("dir").help("Directory for captured data").required(true))
                .arg(
                    Arg::new("device_id")
                        .help("Serial number of the device")
                        .required(true),
                )
                .arg(Arg::new("rate").help("Baud rate").required(true)),
        )
        .subcommand(
            Command::new("query")
                .about("Print captured lines within a range")
                .long_about(
                    "Print captured lines between <start> and <end>. Each bound is either a \
                     label (an annotation line to match exactly) or a time: Unix seconds or \
                     milliseconds, 'YYYY-MM-DD HH:MM:SS' local time, 'now', or 'now-10m' \
                     (units s, m, h, d). '-' leaves a side unbounded.\n\n\
                     Examples:\n  \
                     serialcup query /tmp/serialcup A9XYZ123 now-1h now\n  \
                     serialcup query /tmp/serialcup A9XYZ123 label1 label2 '([0-9]+),.*' 'timestamp:\\1'",
                )
                .arg(Arg::new("dir").help("Directory with captured data").required(true))
                .arg(
                    Arg::new("device_id")
                        .help("Serial number of the device")
                        .required(true),
                )
                .arg(
                    Arg::new("start")
                        .help("Start of the range: label or time")
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(
                    Arg::new("end")
                        .help("End of the range: label or time")
                        .required(true)
                        .allow_hyphen_values(true),
                )
                .arg(Arg::new("pattern").help("Regex the printed lines must match"))
                .arg(
                    Arg::new("rewrite")
                        .help("Replacement for matches; supports groups captured by <pattern>")
                        .requires("pattern"),
                ),
        )
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{name}>"))
}

fn list(settings: &Settings) -> Result<()> {
    let devices = list_devices(&settings.device_dir)?;
    if devices.is_empty() {
        log::info!("no devices in {}", settings.device_dir.display());
    }
    for device in devices {
        println!(
            "{} - {} S/N: {}",
            device.target.display(),
            device.name,
            device.serial_number.as_deref().unwrap_or("n/a")
        );
    }
    Ok(())
}

async fn capture(settings: &Settings, args: &ArgMatches) -> Result<()> {
    let dir = PathBuf::from(required(args, "dir")?);
    let device_id = required(args, "device_id")?;
    let baud = parse_baud_rate(required(args, "rate")?)?;

    // Resolve and open the device before anything is written to disk.
    let device = find_device(&settings.device_dir, device_id)?;
    let source = open_device(&device, baud)
        .with_context(|| format!("failed to open device {device_id}"))?;

    let mut session = CaptureSession::open(
        &dir,
        device_id,
        settings.file_extension.clone(),
        Arc::new(SystemClock),
    )
    .with_context(|| format!("failed to start capture in {}", dir.display()))?;

    let (operator_tx, operator_rx) = mpsc::unbounded_channel();
    spawn_operator_thread(BufReader::new(std::io::stdin()), operator_tx);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("cannot listen for interrupts: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let mut engine = CaptureEngine::new(
        source,
        operator_rx,
        std::io::stdout(),
        settings.read_timeout(),
    );
    engine.run(&mut session, shutdown).await?;
    Ok(())
}

fn query(args: &ArgMatches) -> Result<()> {
    let mut request = QueryRequest::new(
        required(args, "dir")?,
        required(args, "device_id")?,
        required(args, "start")?,
        required(args, "end")?,
    );
    if let Some(pattern) = args.get_one::<String>("pattern") {
        request = request.with_filter(pattern, args.get_one::<String>("rewrite").cloned());
    }

    let lines = QueryEngine::default().run(&request)?;
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let count = lines.write_to(&mut out)?;
    log::debug!("query printed {} lines", count);
    Ok(())
}

fn load_settings() -> Result<Settings> {
    Settings::load().context("failed to load settings")
}

/// Run the selected subcommand. Only the device commands read settings.
async fn dispatch(matches: &ArgMatches, settings: fn() -> Result<Settings>) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => list(&settings()?),
        Some(("capture", args)) => capture(&settings()?, args).await,
        Some(("query", args)) => query(args),
        Some((other, _)) => anyhow::bail!("unknown command: {other}"),
        None => anyhow::bail!("no command given"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; RUST_LOG controls verbosity
    env_logger::init();

    let matches = cli().get_matches();
    dispatch(&matches, load_settings).await
}
