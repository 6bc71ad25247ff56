use clap::{App, Arg, SubCommand};
use fifodev::{
    error::FifoDevError, ControlCommand, ControlReply, DeviceRegistry, LocalHost, RegistryConfig,
    Result,
};
use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("fifodev-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bounded FIFO pseudo-device CLI Tool")
        .subcommand(
            SubCommand::with_name("run")
                .about("Bring up FIFO devices and drive them with commands from stdin")
                .arg(
                    Arg::with_name("devices")
                        .short("d")
                        .long("devices")
                        .value_name("COUNT")
                        .help("Number of devices")
                        .default_value("1")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("capacity")
                        .short("c")
                        .long("capacity")
                        .value_name("BYTES")
                        .help("Initial capacity of every device")
                        .default_value("32")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("info")
                .about("Show version and build information"),
        )
        .get_matches();

    match matches.subcommand() {
        ("run", Some(run_matches)) => handle_run(run_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn handle_run(matches: &clap::ArgMatches) -> Result<()> {
    let devices: i32 = matches
        .value_of("devices")
        .unwrap()
        .parse()
        .map_err(|_| FifoDevError::invalid_parameter("devices", "Invalid device count"))?;
    let capacity: usize = matches
        .value_of("capacity")
        .unwrap()
        .parse()
        .map_err(|_| FifoDevError::invalid_parameter("capacity", "Invalid capacity"))?;

    let host = Arc::new(LocalHost::new());
    let config = RegistryConfig::new(devices).with_capacity(capacity);
    let registry = DeviceRegistry::start(host.clone(), config)?;

    println!(
        "{} devices live ({} bytes each)",
        registry.len(),
        registry.config().default_capacity
    );
    list_devices(&host);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| FifoDevError::invalid_parameter("stdin", e.to_string()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        if let Err(err) = execute(&host, line) {
            println!("error: {} (errno {})", err, err.errno());
        }
        let _ = io::stdout().flush();
    }

    Ok(())
}

fn execute(host: &LocalHost, line: &str) -> Result<()> {
    let mut parts = line.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();

    if command == "list" {
        list_devices(host);
        return Ok(());
    }

    let device = parts
        .next()
        .ok_or_else(|| FifoDevError::invalid_parameter("device", "Missing device name"))?;
    let rest = parts.next().unwrap_or_default();
    let session = host.open(device)?;

    match command {
        "write" => {
            let written = session.write(rest.as_bytes())?;
            println!("wrote {} of {} bytes", written, rest.len());
        }
        "read" => {
            let count: usize = rest
                .trim()
                .parse()
                .map_err(|_| FifoDevError::invalid_parameter("count", "Invalid byte count"))?;
            let data = session.read(count)?;
            println!("read {} bytes: {}", data.len(), String::from_utf8_lossy(&data));
        }
        "info" => {
            if let ControlReply::Info(info) = session.control(ControlCommand::Info)? {
                println!(
                    "capacity={} available={} length={}",
                    info.capacity, info.available, info.length
                );
            }
        }
        "clear" => {
            session.control(ControlCommand::Clear)?;
            println!("cleared {}", device);
        }
        "resize" => {
            let size: i64 = rest
                .trim()
                .parse()
                .map_err(|_| FifoDevError::invalid_parameter("size", "Invalid size"))?;
            session.control(ControlCommand::Resize(size))?;
            println!("resized {} to {} bytes", device, size);
        }
        other => {
            return Err(FifoDevError::invalid_parameter(
                "command",
                format!("Unknown command '{}'", other),
            ));
        }
    }

    Ok(())
}

fn list_devices(host: &LocalHost) {
    for name in host.published_names() {
        if let Some(number) = host.lookup(&name) {
            println!("  {} ({})", name, number);
        }
    }
}

fn show_info() -> Result<()> {
    println!("fifodev pseudo-device FIFOs");
    println!("Version: {}", fifodev::VERSION);

    println!("\nControl requests:");
    println!("  FIFO_CLEAR  0x{:08x}", fifodev::FIFO_CLEAR);
    println!("  FIFO_INFO   0x{:08x}", fifodev::FIFO_INFO);
    println!("  FIFO_RESIZE 0x{:08x}", fifodev::FIFO_RESIZE);

    println!("\nCapabilities:");
    println!("  - Bounded byte FIFOs with short writes");
    println!("  - Staged bring-up with exact rollback");
    println!("  - Clear, info and resize control commands");
    println!("  - Maximum capacity {} bytes", fifodev::config::MAX_CAPACITY);

    Ok(())
}
