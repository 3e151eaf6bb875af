#![warn(clippy::all)]

// main entry point
use clap::Parser;
use log::{debug, error, info, warn, LevelFilter, SetLoggerError};
use redirq::error::Result;
use redirq::network::core::{Channel, Queue};
use redirq::network::processing::{processor, RedirectPolicy};
use redirq::settings::Settings;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

// Simple console logger implementation
struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let mut stdout = io::stdout();
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                stdout,
                "[{}] {} - {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            )
            .unwrap_or_else(|e| eprintln!("Failed to write log: {}", e));
            stdout
                .flush()
                .unwrap_or_else(|e| eprintln!("Failed to flush stdout: {}", e));
        }
    }

    fn flush(&self) {
        io::stdout()
            .flush()
            .unwrap_or_else(|e| eprintln!("Failed to flush stdout: {}", e));
    }
}

static LOGGER: SimpleLogger = SimpleLogger;

/// Initialize the application logger
///
/// Sets up the SimpleLogger with Info level filtering
fn init_logger() -> std::result::Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info))
}

#[derive(Parser, Debug)]
#[command(
    name = "redirq",
    version,
    about = "Redirects non-local IPv4 traffic diverted to an NFQUEUE queue"
)]
struct Cli {
    /// Number of the kernel packet queue to service
    queue_num: u16,

    /// Load settings from a TOML file instead of command-line flags
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: Settings,
}

/// Main entry point for the redirq filter
fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger() {
        eprintln!("Failed to initialize logger: {}", e);
        process::exit(1);
    }

    info!("Redirq starting up, servicing queue {}", cli.queue_num);

    if !is_root() {
        warn!("Redirq usually needs root (CAP_NET_ADMIN) to open the netfilter socket.");
    }

    if let Err(e) = run(cli) {
        error!("Fatal: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            Settings::load(path)?
        }
        None => cli.settings,
    };

    let mut channel = Channel::open()?;
    let port_id = channel.bind()?;
    debug!("Channel bound with port id {}", port_id);

    let mut queue = Queue::new(channel, cli.queue_num, settings.redirect.mark);
    queue.configure(&settings.queue)?;

    let policy = RedirectPolicy::new(&settings.redirect);
    info!("Packet redirect system initialized");
    processor::run(queue, &policy)
}

/// Check if the current process is running as root.
///
/// Opening the netfilter netlink socket normally requires CAP_NET_ADMIN;
/// without it the channel open fails with a permission error.
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
