//! Text framing for Engine.IO v4 / Socket.IO v5 over a WebSocket.
//!
//! Every WebSocket text frame is one Engine.IO packet: a single type digit
//! followed by its data. Engine.IO `message` packets carry one Socket.IO
//! packet: a type digit, an optional `/namespace,` prefix, an optional ack
//! id, then JSON.

use serde::Deserialize;
use serde_json::Value;

use crate::common::CodecError;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Parameters the server announces in its `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, CodecError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(CodecError::Empty)?;
        let data = chars.as_str();

        let packet = match kind {
            '0' => EnginePacket::Open(serde_json::from_str(data)?),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(data.to_string()),
            '3' => EnginePacket::Pong(data.to_string()),
            '4' => EnginePacket::Message(data.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => {
                return Err(CodecError::UnknownPacketType {
                    layer: "engine.io",
                    kind: other,
                });
            }
        };
        Ok(packet)
    }

    /// Client-side encoding. `Open` is server-only and never sent.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event {
        ack: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        ack: u64,
        args: Vec<Value>,
    },
    ConnectError(Value),
}

/// A Socket.IO packet addressed to a namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketFrame {
    pub namespace: String,
    pub packet: SocketPacket,
}

impl SocketFrame {
    pub fn new(packet: SocketPacket) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            packet,
        }
    }

    pub fn event(name: &str, payload: Value) -> Self {
        Self::new(SocketPacket::Event {
            ack: None,
            name: name.to_string(),
            args: vec![payload],
        })
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }

    pub fn decode(data: &str) -> Result<Self, CodecError> {
        let mut chars = data.chars();
        let kind = chars.next().ok_or(CodecError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(CodecError::Unsupported("binary socket.io packets"));
        }

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let ack = if digits > 0 {
            rest[..digits].parse::<u64>().ok()
        } else {
            None
        };
        let body = &rest[digits..];

        let packet = match kind {
            '0' => SocketPacket::Connect(parse_optional(body)?),
            '1' => SocketPacket::Disconnect,
            '2' => {
                let (name, args) = split_event(body)?;
                SocketPacket::Event { ack, name, args }
            }
            '3' => SocketPacket::Ack {
                ack: ack.ok_or(CodecError::BadEvent)?,
                args: match parse_optional(body)? {
                    Some(Value::Array(args)) => args,
                    Some(other) => vec![other],
                    None => Vec::new(),
                },
            },
            '4' => SocketPacket::ConnectError(parse_optional(body)?.unwrap_or(Value::Null)),
            other => {
                return Err(CodecError::UnknownPacketType {
                    layer: "socket.io",
                    kind: other,
                });
            }
        };

        Ok(Self { namespace, packet })
    }

    /// Encoded as the data of an Engine.IO `message` packet.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let (kind, ack, body) = match &self.packet {
            SocketPacket::Connect(auth) => ('0', None, auth.as_ref().map(Value::to_string)),
            SocketPacket::Disconnect => ('1', None, None),
            SocketPacket::Event { ack, name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *ack, Some(Value::Array(items).to_string()))
            }
            SocketPacket::Ack { ack, args } => {
                ('3', Some(*ack), Some(Value::Array(args.clone()).to_string()))
            }
            SocketPacket::ConnectError(value) => ('4', None, Some(value.to_string())),
        };

        out.push(kind);
        if !self.is_default_namespace() {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(ack) = ack {
            out.push_str(&ack.to_string());
        }
        if let Some(body) = body {
            out.push_str(&body);
        }
        out
    }

    /// Wrapped in an Engine.IO `message` packet, ready for the socket.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

fn parse_optional(body: &str) -> Result<Option<Value>, CodecError> {
    if body.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::from_str(body)?))
    }
}

fn split_event(body: &str) -> Result<(String, Vec<Value>), CodecError> {
    let Value::Array(mut items) = serde_json::from_str::<Value>(body)? else {
        return Err(CodecError::BadEvent);
    };
    if items.is_empty() {
        return Err(CodecError::BadEvent);
    }
    let Value::String(name) = items.remove(0) else {
        return Err(CodecError::BadEvent);
    };
    Ok((name, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(handshake) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
        assert_eq!(handshake.ping_interval, 25_000);
        assert_eq!(handshake.ping_timeout, 20_000);
        assert_eq!(handshake.max_payload, Some(1_000_000));
    }

    #[test]
    fn ping_is_answered_with_matching_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
    }

    #[test]
    fn rejects_empty_and_unknown_engine_frames() {
        assert!(matches!(EnginePacket::decode(""), Err(CodecError::Empty)));
        assert!(matches!(
            EnginePacket::decode("9x"),
            Err(CodecError::UnknownPacketType { kind: '9', .. })
        ));
    }

    #[test]
    fn decodes_event_with_payload() {
        let frame = SocketFrame::decode(r#"2["new-message",{"text":"hi"}]"#).unwrap();
        assert!(frame.is_default_namespace());
        assert_eq!(
            frame.packet,
            SocketPacket::Event {
                ack: None,
                name: "new-message".into(),
                args: vec![json!({"text": "hi"})],
            }
        );
    }

    #[test]
    fn decodes_namespace_and_ack_id() {
        let frame = SocketFrame::decode(r#"2/admin,13["ping",1]"#).unwrap();
        assert_eq!(frame.namespace, "/admin");
        assert_eq!(
            frame.packet,
            SocketPacket::Event {
                ack: Some(13),
                name: "ping".into(),
                args: vec![json!(1)],
            }
        );

        let connect = SocketFrame::decode("0/admin,").unwrap();
        assert_eq!(connect.namespace, "/admin");
        assert_eq!(connect.packet, SocketPacket::Connect(None));
    }

    #[test]
    fn decodes_connect_ack_with_sid() {
        let frame = SocketFrame::decode(r#"0{"sid":"abc"}"#).unwrap();
        assert_eq!(frame.packet, SocketPacket::Connect(Some(json!({"sid": "abc"}))));
    }

    #[test]
    fn rejects_events_without_a_name() {
        assert!(matches!(SocketFrame::decode("2[]"), Err(CodecError::BadEvent)));
        assert!(matches!(SocketFrame::decode("2[1,2]"), Err(CodecError::BadEvent)));
        assert!(matches!(SocketFrame::decode(r#"2{"a":1}"#), Err(CodecError::BadEvent)));
    }

    #[test]
    fn rejects_binary_packets() {
        assert!(matches!(
            SocketFrame::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn encodes_outbound_event_frame() {
        let frame = SocketFrame::event("start-study-session", json!({"topic": "ECG"}));
        assert_eq!(frame.to_frame(), r#"42["start-study-session",{"topic":"ECG"}]"#);
    }

    #[test]
    fn encodes_connect_and_disconnect() {
        assert_eq!(SocketFrame::new(SocketPacket::Connect(None)).to_frame(), "40");
        assert_eq!(
            SocketFrame::new(SocketPacket::Connect(Some(json!({"user": "You"})))).to_frame(),
            r#"40{"user":"You"}"#
        );
        assert_eq!(SocketFrame::new(SocketPacket::Disconnect).to_frame(), "41");
    }
}
