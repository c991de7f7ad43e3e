use clap::{Parser, Subcommand};
use iamlog::core::config::{Config, FormatConfig, LoggingConfig};
use iamlog::core::listener::ReportingListener;
use iamlog::core::normalize::{normalize, NormalizerConfig};
use iamlog::core::traits::EventSource;
use iamlog::formats::json::JsonlWriter;
use iamlog::formats::queue::spawn_writer;
use iamlog::sources::keycloak::{parse_line, JsonlEventReader};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "iamlog")]
#[command(about = "Identity event reporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replays exported events and writes reports.
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Event file (JSON lines); reads stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        errors_only: bool,
        #[arg(long)]
        include_representation: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        max_events: Option<u64>,
    },
    /// Normalizes one event read from stdin and prints the report.
    Normalize {
        #[arg(long)]
        errors_only: bool,
        #[arg(long)]
        include_representation: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Replay {
            config,
            input,
            output,
            errors_only,
            include_representation,
            dry_run,
            max_events,
        } => {
            let mut loaded = Config::from_path(&config)?;

            if let Some(dir) = output {
                loaded.output.dir = dir.to_string_lossy().to_string();
            }
            loaded.errors_only |= errors_only;
            loaded.include_representation |= include_representation;

            if dry_run {
                println!("config loaded: {loaded:#?}");
                return Ok(());
            }

            init_tracing(&loaded.logging);
            replay(&loaded, input, max_events)?;
        }
        Commands::Normalize {
            errors_only,
            include_representation,
        } => {
            init_tracing(&LoggingConfig::default());
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            let event = parse_line(raw.trim(), include_representation)?;
            if let Some(report) = normalize(&event, &NormalizerConfig { errors_only }) {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn replay(
    config: &Config,
    input: Option<PathBuf>,
    max_events: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = match &input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut source = JsonlEventReader::new(reader, config.include_representation);

    let writer = match &config.output.format {
        FormatConfig::Jsonl(options) => JsonlWriter::new(
            &config.output.dir,
            config.output.target_size_mb,
            config.output.max_age_seconds,
            options.compression.as_deref(),
        )?,
    };
    let (sink, handle) = spawn_writer(
        Box::new(writer),
        config.output.queue_depth,
        Duration::from_secs(1),
    );
    let listener = ReportingListener::new(sink, config.normalizer());

    tracing::info!(
        errors_only = config.errors_only,
        output = %config.output.dir,
        "replaying events"
    );
    let started = Instant::now();
    let mut read = 0_u64;
    while max_events.map_or(true, |max| read < max) {
        let Some(event) = source.next_event() else {
            break;
        };
        listener.dispatch(&event);
        read += 1;
    }

    let sink = listener.into_sink();
    handle.close()?;
    let counters = sink.counters();
    tracing::info!(
        events = read,
        malformed = source.skipped(),
        reports = counters.reports.load(Ordering::Relaxed),
        bytes = counters.bytes.load(Ordering::Relaxed),
        failures = counters.failures.load(Ordering::Relaxed),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "replay finished"
    );
    Ok(())
}
