use super::{Command, ConnectionState, StateCell};
use crate::error::ConnectionError;
use crate::event::{AppEvent, ConnectionId, InboundFrame};
use futures::{SinkExt, StreamExt};
use std::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

/// Where to connect, plus the upload's session cookie so the backend can
/// find the parsed resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub url: String,
    pub cookie: Option<String>,
}

impl Handshake {
    pub fn into_request(self) -> Result<Request, ConnectionError> {
        let mut request = self.url.as_str().into_client_request()?;
        if let Some(cookie) = self.cookie {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|err| ConnectionError::Request(format!("invalid cookie header: {err}")))?;
            request.headers_mut().insert(COOKIE, value);
        }
        Ok(request)
    }
}

fn fail(
    tx: &mpsc::Sender<AppEvent>,
    state: &StateCell,
    connection: ConnectionId,
    message: String,
) {
    warn!(%connection, "chat connection failed: {message}");
    state.set(ConnectionState::Closed);
    let _ = tx.send(AppEvent::ChatFailed {
        connection,
        message,
    });
}

pub(crate) async fn run(
    id: ConnectionId,
    handshake: Handshake,
    state: StateCell,
    mut commands: UnboundedReceiver<Command>,
    tx: mpsc::Sender<AppEvent>,
) {
    let url = handshake.url.clone();
    let request = match handshake.into_request() {
        Ok(request) => request,
        Err(err) => {
            fail(&tx, &state, id, err.to_string());
            return;
        }
    };

    let connecting = connect_async(request);
    tokio::pin!(connecting);
    let ws_stream = loop {
        tokio::select! {
            result = &mut connecting => match result {
                Ok((stream, _)) => break stream,
                Err(err) => {
                    fail(&tx, &state, id, ConnectionError::from(err).to_string());
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Send(_)) => {
                    warn!(connection = %id, "dropping message sent before the connection opened");
                }
                Some(Command::Close) | None => {
                    debug!(connection = %id, "connection closed while connecting");
                    state.set(ConnectionState::Closed);
                    return;
                }
            },
        }
    };

    if !state.advance(ConnectionState::Connecting, ConnectionState::Open) {
        state.set(ConnectionState::Closed);
        return;
    }
    info!(connection = %id, %url, "chat connection open");
    let _ = tx.send(AppEvent::ChatOpened(id));

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let mut close_reason = None;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if let Err(err) = ws_tx.send(WsMessage::Text(text)).await {
                        fail(&tx, &state, id, ConnectionError::from(err).to_string());
                        return;
                    }
                }
                Some(Command::Close) | None => {
                    state.set(ConnectionState::Closing);
                    if let Err(err) = ws_tx.send(WsMessage::Close(None)).await {
                        debug!(connection = %id, "close handshake failed: {err}");
                    }
                    break;
                }
            },
            message = ws_rx.next() => match message {
                Some(Ok(WsMessage::Text(text))) => {
                    let _ = tx.send(AppEvent::ChatFrame {
                        connection: id,
                        frame: InboundFrame::Text(text),
                    });
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    let _ = tx.send(AppEvent::ChatFrame {
                        connection: id,
                        frame: InboundFrame::Binary(bytes),
                    });
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    close_reason = frame
                        .map(|frame| frame.reason.to_string())
                        .filter(|reason| !reason.is_empty());
                    // flushes the queued close reply
                    if let Err(err) = ws_tx.close().await {
                        debug!(connection = %id, "close reply failed: {err}");
                    }
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    fail(&tx, &state, id, ConnectionError::from(err).to_string());
                    return;
                }
                None => break,
            },
        }
    }

    state.set(ConnectionState::Closed);
    info!(connection = %id, "chat connection closed");
    let _ = tx.send(AppEvent::ChatClosed {
        connection: id,
        reason: close_reason,
    });
}
