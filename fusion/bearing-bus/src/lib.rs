//! The message-bus transport: frame I/O, reply correlation, and the
//! client/server endpoints built on top of `bearing-proto`'s wire schema.

mod client;
mod error;
mod frame;
mod idgen;
mod pending;
mod reply_future;
mod server;

pub use client::{ClientCallbacks, DataClient, Outbound};
pub use error::BusError;
pub use frame::{read_frame, Frame, MAX_FRAME_BYTES};
pub use idgen::{now_secs, IdGenerator};
pub use pending::PendingReplies;
pub use reply_future::ReplyFuture;
pub use server::DataServer;
