use clap::{Parser, Subcommand};
use eyre::WrapErr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tapwedge::config::DEFAULT_CONFIG_PATH;
use tapwedge::discovery::READER_PATTERNS;
use tapwedge::emit::system_keyboard;
use tapwedge::logging::setup_logging;
use tapwedge::{
    Backend, Config, ConfigSource, DEFAULT_POLL_INTERVAL, Discovered, Emitter, Keyboard,
    PcscUidSource, StdoutKeyboard, UidFormat, UsbUidSource, Wedge, discover,
};
use tapwedge_apdu_transport_pcsc::{PcscDeviceManager, PcscError, event::card_event_channel};
use tapwedge_apdu_transport_usb::{ACR122U_PRODUCT_ID, ACR122U_VENDOR_ID, AcrUsbDevice, UsbError};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(version, about = "Type the UID of cards tapped on an ACR122U as keyboard input")]
struct Cli {
    /// Path to the JSON configuration file (created with defaults if missing)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Reader backend
    #[arg(short, long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// Reader name fragment to look for (repeatable, replaces the built-in ACR122U names)
    #[arg(short, long)]
    reader: Vec<String>,

    /// Interval between reads when polling over USB
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    poll_interval_ms: u64,

    /// Print UIDs to stdout instead of typing them
    #[arg(long)]
    dry_run: bool,

    /// Debug level output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Wait for cards and type their UIDs (default)
    Run,

    /// List available readers
    List,
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run);

    // Listing readers must not leave a config file behind
    let (config, source) = match command {
        Commands::Run => Config::load(&cli.config),
        Commands::List => Config::load_existing(&cli.config),
    };
    setup_logging(config.log_level, cli.verbose);
    report_config(&cli.config, &config, source);

    match command {
        Commands::List => list_readers(&cli.reader),
        Commands::Run => run(&cli, &config),
    }
}

fn report_config(path: &Path, config: &Config, source: ConfigSource) {
    match source {
        ConfigSource::File => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Created => info!("Created default configuration at {}", path.display()),
        ConfigSource::Missing => debug!("No configuration at {}, using defaults", path.display()),
        ConfigSource::Defaults(e) => warn!("Error loading config: {e}; using defaults"),
    }
    if let UidFormat::Unknown(tag) = &config.format {
        warn!("Unknown UID format {tag:?}, using HEX");
    }
}

fn run(cli: &Cli, config: &Config) -> eyre::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || shutdown.store(true, Ordering::Release))
            .wrap_err("Failed to install Ctrl+C handler")?;
    }

    let keyboard: Box<dyn Keyboard> = if cli.dry_run {
        Box::new(StdoutKeyboard::stdout())
    } else {
        system_keyboard().wrap_err("Failed to create virtual keyboard")?
    };
    let emitter = Emitter::from_config(keyboard, config);

    match discover(cli.backend, &cli.reader)? {
        Discovered::Pcsc { manager, reader } => {
            let transport = manager.open_reader(reader.name())?;
            let mut wedge = Wedge::new(PcscUidSource::new(transport), emitter);

            let monitor = manager.monitor()?;
            let (sender, receiver) = card_event_channel();
            monitor.monitor_cards_channel(sender)?;

            let result = wedge.run_events(&receiver, reader.name(), &shutdown);
            monitor.stop();
            result?;
        }
        Discovered::Usb(transport) => {
            let mut wedge = Wedge::new(UsbUidSource::new(transport), emitter);
            wedge.run_polling(Duration::from_millis(cli.poll_interval_ms), &shutdown);
        }
    }

    info!("Exiting...");
    Ok(())
}

fn list_readers(patterns: &[String]) -> eyre::Result<()> {
    let patterns: Vec<&str> = if patterns.is_empty() {
        READER_PATTERNS.to_vec()
    } else {
        patterns.iter().map(String::as_str).collect()
    };

    match PcscDeviceManager::new().and_then(|manager| manager.list_readers()) {
        Ok(readers) => {
            println!("PC/SC readers:");
            for (i, reader) in readers.iter().enumerate() {
                let card = if reader.has_card() { "card present" } else { "empty" };
                let marker = if reader.matches_any(&patterns) { " [ACR122U]" } else { "" };
                println!("  {}. {} ({card}){marker}", i + 1, reader.name());
            }
        }
        Err(PcscError::NoReadersAvailable) => println!("PC/SC readers: none"),
        Err(e) => println!("PC/SC unavailable: {e}"),
    }

    println!(
        "{}",
        usb_status(AcrUsbDevice::is_present(ACR122U_VENDOR_ID, ACR122U_PRODUCT_ID))
    );

    Ok(())
}

fn usb_status(presence: Result<bool, UsbError>) -> String {
    match presence {
        Ok(attached) => format!(
            "USB device {ACR122U_VENDOR_ID:04x}:{ACR122U_PRODUCT_ID:04x}: {}",
            if attached { "attached" } else { "not attached" }
        ),
        Err(e) => format!("USB unavailable: {e}"),
    }
}
