use std::time::Duration;

use serde_json::Value;

use crate::common::{ChannelEvent, OutboundEvent};

use super::codec::{EnginePacket, SocketFrame, SocketPacket};
use super::router;

/// How long the server has to send its `open` packet.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingOpen,
    AwaitingConnect,
    Open,
}

/// What the connection loop must do after one inbound frame.
#[derive(Debug, Default, PartialEq)]
pub struct Step {
    /// Frames to write back, in order.
    pub replies: Vec<String>,
    pub event: Option<ChannelEvent>,
    /// New liveness deadline, measured from now.
    pub rearm: Option<Duration>,
    /// The channel is gone; the reason is reported upward.
    pub lost: Option<String>,
}

/// Protocol state of one WebSocket connection, free of any I/O.
#[derive(Debug)]
pub struct ProtocolSession {
    phase: Phase,
    auth: Option<Value>,
    heartbeat: Duration,
}

impl ProtocolSession {
    pub fn new(auth: Option<Value>) -> Self {
        Self {
            phase: Phase::AwaitingOpen,
            auth,
            heartbeat: HANDSHAKE_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, Phase::Open)
    }

    /// Deadline for the next sign of life from the server.
    pub fn heartbeat(&self) -> Duration {
        self.heartbeat
    }

    pub fn on_frame(&mut self, text: &str) -> Step {
        let mut step = Step::default();

        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                log::warn!("Dropping undecodable frame: {err}");
                return step;
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                if self.phase != Phase::AwaitingOpen {
                    log::debug!("Ignoring repeated open packet");
                    return step;
                }
                log::debug!(
                    "Engine.IO session {} (ping every {}ms, upgrades {:?}, max payload {:?})",
                    handshake.sid,
                    handshake.ping_interval,
                    handshake.upgrades,
                    handshake.max_payload
                );
                self.heartbeat =
                    Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
                self.phase = Phase::AwaitingConnect;
                step.replies
                    .push(SocketFrame::new(SocketPacket::Connect(self.auth.clone())).to_frame());
                step.rearm = Some(self.heartbeat);
            }
            EnginePacket::Ping(data) => {
                step.replies.push(EnginePacket::Pong(data).encode());
                step.rearm = Some(self.heartbeat);
            }
            EnginePacket::Close => {
                step.lost = Some("server closed the session".to_string());
            }
            EnginePacket::Message(data) => self.on_message(&data, &mut step),
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }

        step
    }

    fn on_message(&mut self, data: &str, step: &mut Step) {
        let frame = match SocketFrame::decode(data) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Dropping undecodable socket.io packet: {err}");
                return;
            }
        };
        if !frame.is_default_namespace() {
            log::debug!("Ignoring packet for namespace {}", frame.namespace);
            return;
        }

        match frame.packet {
            SocketPacket::Connect(payload) => {
                if self.phase != Phase::AwaitingConnect {
                    return;
                }
                let sid = payload
                    .as_ref()
                    .and_then(|value| value.get("sid"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                log::info!("Namespace connected (sid {sid})");
                self.phase = Phase::Open;
                step.event = Some(ChannelEvent::Connected { sid });
            }
            SocketPacket::ConnectError(reason) => {
                step.lost = Some(format!("connect refused: {reason}"));
            }
            SocketPacket::Disconnect => {
                step.lost = Some("server disconnected the client".to_string());
            }
            SocketPacket::Event { name, args, .. } => {
                if !self.is_open() {
                    log::debug!("Ignoring `{name}` received before connect");
                    return;
                }
                match router::route(&name, args) {
                    Ok(Some(event)) => step.event = Some(ChannelEvent::Inbound(event)),
                    Ok(None) => {}
                    Err(err) => log::warn!("{err}"),
                }
            }
            SocketPacket::Ack { ack, .. } => {
                log::debug!("Ignoring ack {ack}");
            }
        }
    }

    /// Frame for an outbound event, or `None` while the channel is not open.
    pub fn encode_outbound(&self, event: &OutboundEvent) -> Option<String> {
        if !self.is_open() {
            return None;
        }
        match event.payload() {
            Ok(payload) => Some(SocketFrame::event(event.name(), payload).to_frame()),
            Err(err) => {
                log::warn!("Failed to serialize `{}`: {err}", event.name());
                None
            }
        }
    }

    /// Frame announcing a client-side disconnect, if there is anything to leave.
    pub fn farewell(&self) -> Option<String> {
        self.is_open()
            .then(|| SocketFrame::new(SocketPacket::Disconnect).to_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{InboundEvent, StudySessionRequest};
    use serde_json::json;

    const OPEN: &str =
        r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    fn opened() -> ProtocolSession {
        let mut session = ProtocolSession::new(None);
        session.on_frame(OPEN);
        session.on_frame(r#"40{"sid":"sock-1"}"#);
        session
    }

    #[test]
    fn open_packet_triggers_namespace_connect() {
        let mut session = ProtocolSession::new(Some(json!({"user": "You"})));
        let step = session.on_frame(OPEN);

        assert_eq!(step.replies, vec![r#"40{"user":"You"}"#.to_string()]);
        assert_eq!(step.rearm, Some(Duration::from_millis(45_000)));
        assert_eq!(session.phase(), &Phase::AwaitingConnect);
        assert!(!session.is_open());
    }

    #[test]
    fn connect_ack_opens_the_channel() {
        let mut session = ProtocolSession::new(None);
        session.on_frame(OPEN);
        let step = session.on_frame(r#"40{"sid":"sock-1"}"#);

        assert_eq!(
            step.event,
            Some(ChannelEvent::Connected {
                sid: "sock-1".into()
            })
        );
        assert!(session.is_open());
    }

    #[test]
    fn ping_is_answered_and_rearms_heartbeat() {
        let mut session = opened();
        let step = session.on_frame("2");

        assert_eq!(step.replies, vec!["3".to_string()]);
        assert_eq!(step.rearm, Some(Duration::from_millis(45_000)));
        assert_eq!(step.lost, None);
    }

    #[test]
    fn inbound_events_are_routed_once_open() {
        let mut session = opened();
        let step = session.on_frame(
            r##"42["new-message",{"text":"hi","user":"Hina","timestamp":"9:00:00 AM","avatarColor":"#29B6F6"}]"##,
        );

        let Some(ChannelEvent::Inbound(InboundEvent::NewMessage(message))) = step.event else {
            panic!("expected inbound message");
        };
        assert_eq!(message.text, "hi");
    }

    #[test]
    fn events_before_connect_are_ignored() {
        let mut session = ProtocolSession::new(None);
        session.on_frame(OPEN);
        let step = session.on_frame(
            r#"42["new-message",{"text":"early","user":"Hina","timestamp":"9:00:00 AM"}]"#,
        );
        assert_eq!(step.event, None);
    }

    #[test]
    fn malformed_event_payload_is_dropped_without_losing_channel() {
        let mut session = opened();
        let step = session.on_frame(r#"42["assignment-added",{"title":7}]"#);
        assert_eq!(step, Step::default());
        assert!(session.is_open());
    }

    #[test]
    fn server_disconnect_and_close_lose_the_channel() {
        let mut session = opened();
        assert!(session.on_frame("41").lost.is_some());

        let mut session = opened();
        assert!(session.on_frame("1").lost.is_some());

        let mut session = ProtocolSession::new(None);
        session.on_frame(OPEN);
        let step = session.on_frame(r#"44{"message":"unauthorized"}"#);
        assert!(step.lost.unwrap().contains("unauthorized"));
    }

    #[test]
    fn outbound_frames_only_exist_when_open() {
        let event = OutboundEvent::StartStudySession(StudySessionRequest {
            host: "You".into(),
            topic: "Cardiology Review".into(),
            duration: 60,
        });

        let pending = ProtocolSession::new(None);
        assert_eq!(pending.encode_outbound(&event), None);
        assert_eq!(pending.farewell(), None);

        let session = opened();
        assert_eq!(
            session.encode_outbound(&event).unwrap(),
            r#"42["start-study-session",{"duration":60,"host":"You","topic":"Cardiology Review"}]"#
        );
        assert_eq!(session.farewell().as_deref(), Some("41"));
    }
}
