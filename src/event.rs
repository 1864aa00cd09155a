use crate::error::UploadError;
use crate::session::ResumeFile;
use crate::upload::UploadReceipt;

/// Identifies one chat connection so events from a replaced one can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug)]
pub enum AppEvent {
    UploadFinished {
        file: ResumeFile,
        result: Result<UploadReceipt, UploadError>,
    },
    ChatOpened(ConnectionId),
    ChatFrame {
        connection: ConnectionId,
        frame: InboundFrame,
    },
    ChatClosed {
        connection: ConnectionId,
        reason: Option<String>,
    },
    ChatFailed {
        connection: ConnectionId,
        message: String,
    },
}
