//! Test harness for the MeshCore host stack.
//!
//! Provides a [`SimDevice`]: a scripted companion-radio node speaking the
//! real wire protocol over an in-memory duplex pipe, plus the
//! [`PipeConnector`] that plugs the other end into a
//! [`meshcore_core::Transport`]. Integration tests drive a real client
//! against it without hardware.

mod connector;
mod sim_device;

pub use connector::PipeConnector;
pub use sim_device::{Replies, SimDevice, payload};
