//! Upward delivery of decoded messages.
//!
//! This module defines the `MessageSink` trait (ISP, DIP) through which the
//! adapter hands messages to the layer above, and a console implementation
//! used by the command line tool.

mod console_reporter;

pub use console_reporter::ConsoleReporter;

use crate::domain::Message;

/// Consumer of inbound messages.
///
/// Every delivered message begins with an
/// [`EthSockaddr`](crate::domain::EthSockaddr) record naming the sender,
/// followed by the payload. The message borrows per-frame scratch space, so
/// implementations copy out whatever they keep.
pub trait MessageSink {
    fn deliver(&mut self, msg: Message<'_>);
}
