//! Etherlink - raw Ethernet messaging tool
//!
//! Lists capture-capable interfaces, listens for mesh frames, and sends single
//! messages over a BPF device.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use etherlink::{Config, EthSockaddr};
use macaddr::MacAddr6;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "etherlink")]
#[command(about = "Send and receive mesh messages over raw Ethernet")]
#[command(version)]
struct Cli {
    /// Show a hex preview of every received payload
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List interfaces a capture device can be bound to
    List,
    /// Print every message received on an interface
    Listen {
        /// Interface name (defaults to the configured interface)
        interface: Option<String>,
    },
    /// Send one text message
    Send {
        /// Interface name (e.g., en0)
        interface: String,
        /// Destination MAC address, or "broadcast"
        destination: String,
        /// Message text
        text: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List => {
            let devices =
                etherlink::netif::list_devices().context("Failed to enumerate interfaces")?;
            if devices.is_empty() {
                println!("No usable interfaces found.");
            }
            for name in devices {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Listen { interface } => {
            let interface = interface
                .or_else(|| config.interface.clone())
                .context("No interface given and none configured")?;
            listen(&interface, &config, cli.verbose)
        }
        Commands::Send {
            interface,
            destination,
            text,
        } => {
            let dest = parse_destination(&destination)?;
            send(&interface, dest, text.as_bytes(), &config)
        }
    }
}

/// Parse a destination given as a MAC address or the word "broadcast".
fn parse_destination(s: &str) -> Result<EthSockaddr> {
    if s.eq_ignore_ascii_case("broadcast") {
        return Ok(EthSockaddr::broadcast());
    }
    let mac: MacAddr6 = s
        .parse()
        .with_context(|| format!("Invalid destination '{}'", s))?;
    Ok(EthSockaddr::unicast(mac))
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn listen(interface: &str, config: &Config, verbose: bool) -> Result<()> {
    use std::os::unix::io::AsRawFd;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use etherlink::{ConsoleReporter, EthInterface};

    let reporter = ConsoleReporter::new().with_verbose(verbose);
    let mut eth = EthInterface::open(interface, reporter, &config.acquire_policy())
        .with_context(|| format!("Failed to open interface {}", interface))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    eth.sink().on_start(interface);

    let fd = eth.device().as_raw_fd();
    while running.load(Ordering::SeqCst) {
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
        let ready = unsafe { libc::poll(&mut pfd, 1, 200) };
        if ready < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err).context("poll failed");
        }
        if ready > 0 && pfd.revents & libc::POLLIN != 0 {
            eth.handle_readable();
        }
    }

    eth.sink().on_stop();
    let stats = eth.stats();
    tracing::info!(
        frames = stats.frames_received,
        delivered = stats.delivered,
        dropped = stats.dropped_runt
            + stats.dropped_version
            + stats.dropped_length
            + stats.dropped_magic,
        "listener stopped"
    );
    Ok(())
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
fn send(interface: &str, dest: EthSockaddr, payload: &[u8], config: &Config) -> Result<()> {
    use etherlink::{ConsoleReporter, EthInterface};

    let mut eth = EthInterface::open(interface, ConsoleReporter::new(), &config.acquire_policy())
        .with_context(|| format!("Failed to open interface {}", interface))?;
    eth.send_to(dest, payload).context("Failed to send message")?;

    let stats = eth.stats();
    if stats.sent == 1 {
        println!("sent {} bytes to {}", payload.len(), dest);
        Ok(())
    } else if stats.send_oversize > 0 {
        anyhow::bail!(
            "message of {} bytes exceeds the {} byte limit",
            payload.len(),
            etherlink::MAX_PACKET_SIZE
        )
    } else {
        anyhow::bail!("the device did not accept the frame")
    }
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn listen(_interface: &str, _config: &Config, _verbose: bool) -> Result<()> {
    anyhow::bail!("BPF capture devices are not available on this platform")
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn send(_interface: &str, _dest: EthSockaddr, _payload: &[u8], _config: &Config) -> Result<()> {
    anyhow::bail!("BPF capture devices are not available on this platform")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_destination_broadcast() {
        let dest = parse_destination("BROADCAST").unwrap();
        assert!(dest.broadcast);
    }

    #[test]
    fn test_parse_destination_mac() {
        let dest = parse_destination("02:00:00:aa:bb:cc").unwrap();
        assert!(!dest.broadcast);
        assert_eq!(dest.mac, MacAddr6::new(0x02, 0, 0, 0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_parse_destination_rejects_garbage() {
        assert!(parse_destination("not-a-mac").is_err());
    }

    #[test]
    fn test_cli_parses_send() {
        let cli = Cli::try_parse_from(["etherlink", "send", "en0", "broadcast", "hi"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Send { ref interface, .. } if interface == "en0"
        ));
    }
}
