//! Console-based message reporter.

use std::io::{self, Write};

use crate::domain::{EthSockaddr, Message, ETH_SOCKADDR_SIZE};
use crate::reporter::MessageSink;

/// Bytes of payload shown in verbose mode.
const PREVIEW_LEN: usize = 32;

/// Prints every delivered message to stdout.
pub struct ConsoleReporter {
    /// Whether to show a hex preview of the payload
    verbose: bool,
    received: u64,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            verbose: false,
            received: 0,
        }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Messages reported so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Called when the listener starts.
    pub fn on_start(&self, interface: &str) {
        println!("Listening for messages on interface: {}", interface);
        println!("Press Ctrl+C to stop.\n");
    }

    /// Called when the listener stops.
    pub fn on_stop(&self) {
        println!("\nStopped after {} messages.", self.received);
    }

    fn format_message(&self, from: &EthSockaddr, payload: &[u8]) -> String {
        let mut output = format!("[RECV] From: {} | {} bytes", from, payload.len());

        if self.verbose && !payload.is_empty() {
            let shown = &payload[..payload.len().min(PREVIEW_LEN)];
            output.push_str(" | ");
            output.push_str(&hex(shown));
            if payload.len() > PREVIEW_LEN {
                output.push_str("...");
            }
        }

        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for ConsoleReporter {
    fn deliver(&mut self, mut msg: Message<'_>) {
        let mut record = [0u8; ETH_SOCKADDR_SIZE];
        if msg.pop(&mut record).is_err() {
            tracing::debug!("Delivered message without an address record");
            return;
        }
        self.received += 1;

        let output = self.format_message(&EthSockaddr::from_bytes(&record), msg.bytes());
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use macaddr::MacAddr6;

    fn sender() -> EthSockaddr {
        EthSockaddr::unicast(MacAddr6::new(0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee))
    }

    #[test]
    fn test_format_plain() {
        let reporter = ConsoleReporter::new();
        let line = reporter.format_message(&sender(), b"hello");
        assert_eq!(
            line.to_lowercase(),
            "[recv] from: 02:aa:bb:cc:dd:ee | 5 bytes"
        );
    }

    #[test]
    fn test_format_verbose_preview() {
        let reporter = ConsoleReporter::new().with_verbose(true);
        let line = reporter.format_message(&EthSockaddr::broadcast(), &[0xab; 40]);

        assert!(line.contains("(broadcast)"));
        assert!(line.contains(&"ab".repeat(PREVIEW_LEN)));
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_deliver_counts_messages() {
        let mut region = [0u8; 64];
        let mut msg = Message::new(&mut region, 32).unwrap();
        msg.truncate(4).unwrap();
        msg.push(&sender().to_bytes()).unwrap();

        let mut reporter = ConsoleReporter::new();
        reporter.deliver(msg);
        assert_eq!(reporter.received(), 1);
    }
}
