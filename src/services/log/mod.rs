pub mod client;
pub mod server;
pub mod sink;

pub use client::RemoteLogger;
pub use server::create_router;
pub use sink::{FileSink, HttpSink, LogError, LogSink};
