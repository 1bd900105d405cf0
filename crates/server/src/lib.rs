//! Remote navigation server.
//!
//! Two transports share one navigation language:
//! - gRPC (`cosmos.navigation.Navigation`): a bidirectional `Session` stream
//!   with per-stream location, plus a one-shot `Execute`.
//! - Line JSON over TCP: one command per line in, one JSON [`Response`]
//!   per line out.
//!
//! The universe is shared read-only; every session has its own navigator.
//!
//! # Invariants
//! - Exactly one reply per non-blank request, in request order.
//! - A session never observes another session's location.

mod grpc;
mod protocol;
mod server;
mod session;

pub use grpc::{
    CommandReply, CommandRequest, Navigation, NavigationClient, NavigationServer,
    NavigationService, serve_grpc,
};
pub use protocol::{MAX_LINE_LEN, Response};
pub use server::{
    DEFAULT_LINE_PORT, DEFAULT_PORT, ServerConfig, ServerError, bind, serve, start_server,
};
