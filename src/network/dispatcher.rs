use tokio::sync::mpsc::{self, error::TrySendError};

use crate::common::{ChannelCommand, ConnectionError, OutboundEvent};

/// UI-side handle for handing outbound events to the connection manager.
///
/// Never blocks the UI thread. Dropping the dispatcher ends the session.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    command_sender: mpsc::Sender<ChannelCommand>,
}

impl Dispatcher {
    pub fn new(command_sender: mpsc::Sender<ChannelCommand>) -> Self {
        Self { command_sender }
    }

    pub fn dispatch(&self, event: OutboundEvent) -> Result<(), ConnectionError> {
        let name = event.name();
        self.command_sender
            .try_send(ChannelCommand::Emit(event))
            .map_err(|err| {
                let err = match err {
                    TrySendError::Full(_) => ConnectionError::QueueFull,
                    TrySendError::Closed(_) => ConnectionError::QueueClosed,
                };
                log::warn!("Failed to dispatch `{name}`: {err}");
                err
            })
    }

    pub fn shutdown(&self) {
        if let Err(err) = self.command_sender.try_send(ChannelCommand::Shutdown) {
            log::debug!("Shutdown not delivered: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StudySessionRequest;

    fn announcement() -> OutboundEvent {
        OutboundEvent::StartStudySession(StudySessionRequest {
            host: "You".into(),
            topic: "Pharmacology".into(),
            duration: 45,
        })
    }

    #[test]
    fn dispatch_queues_emit_command() {
        let (tx, mut rx) = mpsc::channel(4);
        let dispatcher = Dispatcher::new(tx);

        dispatcher.dispatch(announcement()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ChannelCommand::Emit(announcement()));
    }

    #[test]
    fn full_and_closed_queues_are_reported() {
        let (tx, rx) = mpsc::channel(1);
        let dispatcher = Dispatcher::new(tx);

        dispatcher.dispatch(announcement()).unwrap();
        assert!(matches!(
            dispatcher.dispatch(announcement()),
            Err(ConnectionError::QueueFull)
        ));

        drop(rx);
        assert!(matches!(
            dispatcher.dispatch(announcement()),
            Err(ConnectionError::QueueClosed)
        ));
    }

    #[test]
    fn shutdown_is_queued() {
        let (tx, mut rx) = mpsc::channel(1);
        Dispatcher::new(tx).shutdown();
        assert_eq!(rx.try_recv().unwrap(), ChannelCommand::Shutdown);
    }
}
