pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use commands::{ChannelCommand, OutboundEvent};
pub use error::{CodecError, ConnectionError, RouteError, ValidationError};
pub use events::{ChannelEvent, InboundEvent};
pub use types::{
    Assignment, AssignmentDraft, ChatMessage, LocalIdentity, RoomMessage, StudySessionRequest,
};
