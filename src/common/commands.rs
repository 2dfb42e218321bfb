use serde_json::Value;

use super::types::{Assignment, RoomMessage, StudySessionRequest};

/// Named events the client emits on the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    SendMessage(RoomMessage),
    AddAssignment(Assignment),
    StartStudySession(StudySessionRequest),
}

impl OutboundEvent {
    pub const SEND_MESSAGE: &'static str = "send-message";
    pub const ADD_ASSIGNMENT: &'static str = "add-assignment";
    pub const START_STUDY_SESSION: &'static str = "start-study-session";

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::SendMessage(_) => Self::SEND_MESSAGE,
            OutboundEvent::AddAssignment(_) => Self::ADD_ASSIGNMENT,
            OutboundEvent::StartStudySession(_) => Self::START_STUDY_SESSION,
        }
    }

    pub fn payload(&self) -> serde_json::Result<Value> {
        match self {
            OutboundEvent::SendMessage(message) => serde_json::to_value(message),
            OutboundEvent::AddAssignment(assignment) => serde_json::to_value(assignment),
            OutboundEvent::StartStudySession(request) => serde_json::to_value(request),
        }
    }
}

/// Commands the UI sends down to the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCommand {
    Emit(OutboundEvent),
    /// End of the application session: close the channel.
    Shutdown,
}
