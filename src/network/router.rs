use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::{Assignment, ChatMessage, InboundEvent, RouteError};

/// Maps a named inbound event to its typed form.
///
/// Returns `Ok(None)` for names this client does not listen to. Only the
/// first argument is read, matching a single-payload `emit` on the server.
pub fn route(name: &str, args: Vec<Value>) -> Result<Option<InboundEvent>, RouteError> {
    let payload = args.into_iter().next().unwrap_or(Value::Null);

    let event = match name {
        InboundEvent::NEW_MESSAGE => {
            InboundEvent::NewMessage(decode::<ChatMessage>(InboundEvent::NEW_MESSAGE, payload)?)
        }
        InboundEvent::ASSIGNMENT_ADDED => InboundEvent::AssignmentAdded(decode::<Assignment>(
            InboundEvent::ASSIGNMENT_ADDED,
            payload,
        )?),
        other => {
            log::debug!("Ignoring unrouted event `{other}`");
            return Ok(None);
        }
    };

    Ok(Some(event))
}

fn decode<T: DeserializeOwned>(event: &'static str, payload: Value) -> Result<T, RouteError> {
    serde_json::from_value(payload).map_err(|source| RouteError { event, source })
}
