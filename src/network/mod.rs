pub mod client;
pub mod codec;
pub mod dispatcher;
pub mod router;
pub mod session;

pub use client::{ChannelClient, ChannelConfig};
pub use dispatcher::Dispatcher;
