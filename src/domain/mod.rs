//! Domain models for the Ethernet link adapter.
//!
//! This module contains the core types shared by the send and receive paths,
//! independent of the capture device behind them.

mod arena;
mod message;
mod sockaddr;

pub use arena::{ArenaScope, ScratchArena};
pub use message::Message;
pub use sockaddr::{EthSockaddr, ETH_SOCKADDR_SIZE, FLAG_BROADCAST, SOCKADDR_OVERHEAD};
