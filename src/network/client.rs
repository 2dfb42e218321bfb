use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::common::{ChannelCommand, ChannelEvent, ConnectionError, LocalIdentity, OutboundEvent};
use crate::config::ReconnectPolicy;

use super::session::ProtocolSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Everything the connection manager needs to know about where to connect.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub identity: LocalIdentity,
    pub reconnect: ReconnectPolicy,
}

impl ChannelConfig {
    /// `http(s)://host:port` becomes the Socket.IO WebSocket transport URL.
    pub fn socket_url(&self) -> Result<Url, ConnectionError> {
        let invalid = |reason: String| ConnectionError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let mut url = Url::parse(&self.endpoint).map_err(|err| invalid(err.to_string()))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(invalid(format!("unsupported scheme `{other}`"))),
        };
        url.set_scheme(scheme)
            .map_err(|()| invalid("cannot switch scheme".to_string()))?;

        if url.path() == "/" || url.path().is_empty() {
            url.set_path("/socket.io/");
        }
        url.query_pairs_mut()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }
}

/// Makes ring the process-wide rustls provider for `wss://` endpoints.
/// Safe to call more than once.
pub fn install_tls_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// How one connected period ended.
enum SessionEnd {
    Shutdown,
    Lost(String),
}

/// Owns the single channel to the collaboration server.
pub struct ChannelClient {
    config: ChannelConfig,
    event_sender: mpsc::Sender<ChannelEvent>,
    command_receiver: mpsc::Receiver<ChannelCommand>,
}

impl ChannelClient {
    pub fn new(
        config: ChannelConfig,
        event_sender: mpsc::Sender<ChannelEvent>,
        command_receiver: mpsc::Receiver<ChannelCommand>,
    ) -> Self {
        Self {
            config,
            event_sender,
            command_receiver,
        }
    }

    /// Runs until shutdown is requested or every command sender is gone.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        let url = self.config.socket_url()?;
        install_tls_provider();
        log::info!(
            "Session {} connecting to {url}",
            self.config.identity.session_id
        );

        let mut attempt = 0u32;
        loop {
            match connect_async(url.as_str()).await {
                Ok((ws, _)) => {
                    log::info!("WebSocket established to {url}");
                    attempt = 0;
                    match self.drive(ws).await {
                        SessionEnd::Shutdown => {
                            log::info!("Channel closed on shutdown");
                            return Ok(());
                        }
                        SessionEnd::Lost(reason) => {
                            log::warn!("Channel lost: {reason}");
                            self.notify(ChannelEvent::Disconnected { reason }).await;
                        }
                    }
                }
                Err(err) => {
                    let err = ConnectionError::Connect {
                        url: url.to_string(),
                        source: Box::new(err),
                    };
                    log::error!("{err}");
                    self.notify(ChannelEvent::Disconnected {
                        reason: err.to_string(),
                    })
                    .await;
                }
            }

            attempt += 1;
            let Some(delay) = self.config.reconnect.delay_for(attempt) else {
                log::warn!("Giving up on {url}; outbound events will be dropped");
                self.drain_offline().await;
                return Ok(());
            };

            log::warn!("Reconnecting in {delay:?} (attempt {attempt})");
            if !self.wait_offline(Instant::now() + delay).await {
                return Ok(());
            }
        }
    }

    async fn drive(&mut self, ws: WsStream) -> SessionEnd {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let identity = &self.config.identity;
        let mut session = ProtocolSession::new(Some(json!({
            "user": identity.display_name,
            "sessionId": identity.session_id.to_string(),
        })));

        let heartbeat = sleep(session.heartbeat());
        tokio::pin!(heartbeat);

        loop {
            tokio::select! {
                command = self.command_receiver.recv() => match command {
                    None | Some(ChannelCommand::Shutdown) => {
                        if let Some(frame) = session.farewell() {
                            let _ = ws_tx.send(Message::Text(frame.into())).await;
                        }
                        let _ = ws_tx.close().await;
                        return SessionEnd::Shutdown;
                    }
                    Some(ChannelCommand::Emit(event)) => {
                        let Some(frame) = session.encode_outbound(&event) else {
                            self.drop_send(&event).await;
                            continue;
                        };
                        log::trace!("-> {frame}");
                        if let Err(err) = ws_tx.send(Message::Text(frame.into())).await {
                            self.drop_send(&event).await;
                            return SessionEnd::Lost(format!("send failed: {err}"));
                        }
                    }
                },
                frame = ws_rx.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        log::trace!("<- {}", text.as_str());
                        let step = session.on_frame(text.as_str());
                        for reply in step.replies {
                            if let Err(err) = ws_tx.send(Message::Text(reply.into())).await {
                                return SessionEnd::Lost(format!("send failed: {err}"));
                            }
                        }
                        if let Some(rearm) = step.rearm {
                            heartbeat.as_mut().reset(Instant::now() + rearm);
                        }
                        if let Some(event) = step.event {
                            if let ChannelEvent::Connected { sid } = &event {
                                log::info!("Connected to server (sid {sid})");
                            }
                            self.notify(event).await;
                        }
                        if let Some(reason) = step.lost {
                            let _ = ws_tx.close().await;
                            return SessionEnd::Lost(reason);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Lost("connection closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return SessionEnd::Lost(err.to_string()),
                },
                () = &mut heartbeat => {
                    return SessionEnd::Lost("server heartbeat timed out".to_string());
                }
            }
        }
    }

    /// Waits until `deadline`, dropping sends meanwhile. `false` means stop.
    async fn wait_offline(&mut self, deadline: Instant) -> bool {
        loop {
            tokio::select! {
                () = sleep_until(deadline) => return true,
                command = self.command_receiver.recv() => match command {
                    None | Some(ChannelCommand::Shutdown) => return false,
                    Some(ChannelCommand::Emit(event)) => self.drop_send(&event).await,
                },
            }
        }
    }

    async fn drain_offline(&mut self) {
        while let Some(command) = self.command_receiver.recv().await {
            match command {
                ChannelCommand::Shutdown => break,
                ChannelCommand::Emit(event) => self.drop_send(&event).await,
            }
        }
    }

    async fn drop_send(&self, event: &OutboundEvent) {
        log::warn!("Dropping `{}`: channel is not open", event.name());
        self.notify(ChannelEvent::SendDropped {
            event: event.name(),
        })
        .await;
    }

    async fn notify(&self, event: ChannelEvent) {
        if let Err(err) = self.event_sender.send(event).await {
            log::debug!("UI stopped listening: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChatMessage, InboundEvent, RoomMessage};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    fn config(endpoint: &str) -> ChannelConfig {
        ChannelConfig {
            endpoint: endpoint.to_string(),
            identity: LocalIdentity::new("You", "#E91E63"),
            reconnect: ReconnectPolicy::disabled(),
        }
    }

    #[test]
    fn http_endpoint_maps_to_socket_io_url() {
        let url = config("http://localhost:5000").socket_url().unwrap();
        assert_eq!(
            url.as_str(),
            "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
        );

        let url = config("https://study.example.org").socket_url().unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn unsupported_endpoint_is_rejected() {
        assert!(matches!(
            config("ftp://localhost").socket_url(),
            Err(ConnectionError::InvalidEndpoint { .. })
        ));
        assert!(config("not a url").socket_url().is_err());
    }

    #[tokio::test]
    async fn secure_endpoint_reaches_tls_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        install_tls_provider();
        let url = config(&format!("https://{addr}")).socket_url().unwrap();
        assert_eq!(url.scheme(), "wss");

        match timeout(Duration::from_secs(5), connect_async(url.as_str()))
            .await
            .unwrap()
        {
            Ok(_) => panic!("a plain TCP peer cannot complete a TLS handshake"),
            Err(err) => assert!(
                !matches!(
                    err,
                    tokio_tungstenite::tungstenite::Error::Url(
                        tokio_tungstenite::tungstenite::error::UrlError::TlsFeatureNotEnabled
                    )
                ),
                "TLS support missing: {err}"
            ),
        }
    }

    async fn serve_handshake(ws: &mut WebSocketStream<TcpStream>, sid: &str) {
        ws.send(Message::Text(
            r#"0{"sid":"eio","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#.into(),
        ))
        .await
        .unwrap();
        let connect = next_text(ws).await;
        assert!(connect.starts_with("40{"), "unexpected connect frame {connect}");
        ws.send(Message::Text(format!(r#"40{{"sid":"{sid}"}}"#).into()))
            .await
            .unwrap();
    }

    async fn next_text(
        ws: &mut WebSocketStream<TcpStream>,
    ) -> String {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
                Some(Ok(_)) => continue,
                other => panic!("server stream ended: {other:?}"),
            }
        }
    }

    async fn next_event(events: &mut mpsc::Receiver<ChannelEvent>) -> ChannelEvent {
        timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for channel event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn full_session_against_loopback_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            serve_handshake(&mut ws, "sock").await;

            ws.send(Message::Text("2".into())).await.unwrap();
            assert_eq!(next_text(&mut ws).await, "3");

            ws.send(Message::Text(
                r##"42["new-message",{"text":"hello","user":"Menna","timestamp":"8:00:00 AM","avatarColor":"#7E57C2"}]"##.into(),
            ))
            .await
            .unwrap();

            let emitted = next_text(&mut ws).await;
            let farewell = next_text(&mut ws).await;
            (emitted, farewell)
        });

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let client = ChannelClient::new(config(&format!("http://{addr}")), event_tx, cmd_rx);
        let client_task = tokio::spawn(client.run());

        assert_eq!(
            next_event(&mut event_rx).await,
            ChannelEvent::Connected { sid: "sock".into() }
        );
        let ChannelEvent::Inbound(InboundEvent::NewMessage(message)) =
            next_event(&mut event_rx).await
        else {
            panic!("expected routed message");
        };
        assert_eq!(message.user, "Menna");

        cmd_tx
            .send(ChannelCommand::Emit(OutboundEvent::SendMessage(RoomMessage {
                message: ChatMessage {
                    text: "hi all".into(),
                    user: "You".into(),
                    timestamp: "8:01:00 AM".into(),
                    avatar_color: "#E91E63".into(),
                },
                room_id: "medical-group".into(),
            })))
            .await
            .unwrap();
        cmd_tx.send(ChannelCommand::Shutdown).await.unwrap();

        let (emitted, farewell) = timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(emitted.starts_with(r#"42["send-message","#));
        assert!(emitted.contains(r#""roomId":"medical-group""#));
        assert_eq!(farewell, "41");

        timeout(Duration::from_secs(5), client_task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_reports_disconnect_and_drops_sends() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let client = ChannelClient::new(config(&format!("http://{addr}")), event_tx, cmd_rx);
        let client_task = tokio::spawn(client.run());

        assert!(matches!(
            next_event(&mut event_rx).await,
            ChannelEvent::Disconnected { .. }
        ));

        cmd_tx
            .send(ChannelCommand::Emit(OutboundEvent::StartStudySession(
                crate::common::StudySessionRequest {
                    host: "You".into(),
                    topic: "Cardiology Review".into(),
                    duration: 60,
                },
            )))
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut event_rx).await,
            ChannelEvent::SendDropped {
                event: "start-study-session"
            }
        );

        drop(cmd_tx);
        timeout(Duration::from_secs(5), client_task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn reconnects_after_established_channel_is_lost() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            serve_handshake(&mut ws, "first").await;
            drop(ws);

            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            serve_handshake(&mut ws, "second").await;
            next_text(&mut ws).await
        });

        let mut channel = config(&format!("http://{addr}"));
        channel.reconnect = ReconnectPolicy {
            enabled: true,
            initial_delay_ms: 10,
            max_delay_ms: 50,
            max_attempts: Some(3),
        };
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let client_task = tokio::spawn(ChannelClient::new(channel, event_tx, cmd_rx).run());

        assert_eq!(
            next_event(&mut event_rx).await,
            ChannelEvent::Connected { sid: "first".into() }
        );
        assert!(matches!(
            next_event(&mut event_rx).await,
            ChannelEvent::Disconnected { .. }
        ));
        assert_eq!(
            next_event(&mut event_rx).await,
            ChannelEvent::Connected {
                sid: "second".into()
            }
        );

        cmd_tx.send(ChannelCommand::Shutdown).await.unwrap();
        let farewell = timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(farewell, "41");

        timeout(Duration::from_secs(5), client_task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
