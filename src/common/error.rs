use thiserror::Error;

/// A user action rejected before anything is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message text is empty")]
    EmptyMessage,
    #[error("assignment title is empty")]
    EmptyTitle,
    #[error("due date `{value}` is not a YYYY-MM-DD calendar date")]
    InvalidDueDate { value: String },
    #[error("study session topic is empty")]
    EmptyTopic,
    #[error("study session duration must be at least one minute")]
    ZeroDuration,
}

/// The channel is unavailable or failed.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection task is no longer running")]
    QueueClosed,
}

/// A frame that does not parse as Engine.IO / Socket.IO.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty frame")]
    Empty,
    #[error("unknown {layer} packet type `{kind}`")]
    UnknownPacketType { layer: &'static str, kind: char },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("event packet is not a [name, ...args] array")]
    BadEvent,
    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
}

/// A known inbound event whose payload does not have the expected shape.
#[derive(Debug, Error)]
#[error("malformed `{event}` payload: {source}")]
pub struct RouteError {
    pub event: &'static str,
    #[source]
    pub source: serde_json::Error,
}
