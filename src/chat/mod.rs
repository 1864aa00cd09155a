use crate::error::SendError;
use crate::event::{AppEvent, ConnectionId};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::debug;

pub mod live;
pub mod simulated;

pub use live::Handshake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }
}

/// Ready state shared between the handle and its connection task.
#[derive(Debug, Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ConnectionState::Connecting.as_u8())))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Moves `from` to `to`; false if another transition got there first.
    pub(crate) fn advance(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Send(String),
    Close,
}

/// Owned handle to the single chat connection. Dropping it closes the socket.
pub struct ChatConnection {
    id: ConnectionId,
    state: StateCell,
    commands: UnboundedSender<Command>,
}

impl ChatConnection {
    pub fn open_live(
        id: ConnectionId,
        handshake: Handshake,
        runtime: &Handle,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let (commands, rx) = unbounded_channel();
        let state = StateCell::new();
        runtime.spawn(live::run(id, handshake, state.clone(), rx, tx));
        Self {
            id,
            state,
            commands,
        }
    }

    pub fn open_simulated(
        id: ConnectionId,
        delay: Duration,
        end_of_turn: String,
        runtime: &Handle,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let (commands, rx) = unbounded_channel();
        let state = StateCell::new();
        runtime.spawn(simulated::run(
            id,
            delay,
            end_of_turn,
            state.clone(),
            rx,
            tx,
        ));
        Self {
            id,
            state,
            commands,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Writes one text frame. Fails without writing unless the connection is open.
    pub fn send(&self, text: String) -> Result<(), SendError> {
        match self.state() {
            ConnectionState::Open => self
                .commands
                .send(Command::Send(text))
                .map_err(|_| SendError::ChannelClosed),
            other => Err(SendError::NotOpen(other.name())),
        }
    }

    pub fn close(&self) {
        if matches!(self.state(), ConnectionState::Closing | ConnectionState::Closed) {
            return;
        }
        self.state.set(ConnectionState::Closing);
        debug!(connection = %self.id, "closing chat connection");
        let _ = self.commands.send(Command::Close);
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.close();
    }
}
