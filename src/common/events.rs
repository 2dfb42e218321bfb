use super::types::{Assignment, ChatMessage};

/// Named events the server pushes to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    NewMessage(ChatMessage),
    AssignmentAdded(Assignment),
}

impl InboundEvent {
    pub const NEW_MESSAGE: &'static str = "new-message";
    pub const ASSIGNMENT_ADDED: &'static str = "assignment-added";
}

/// Events the connection manager sends up to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected { sid: String },
    Disconnected { reason: String },
    Inbound(InboundEvent),
    /// An outbound event was discarded because the channel was not open.
    SendDropped { event: &'static str },
}
