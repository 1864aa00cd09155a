use super::{Message, MessageId, ResumeFile};

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingFirstChunk,
    Streaming,
}

/// One inbound unit from the chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Fragment(String),
    EndOfTurn,
}

impl Inbound {
    /// Only an exact match of the end-of-turn literal ends the turn.
    pub fn classify(text: String, end_of_turn: &str) -> Self {
        if text == end_of_turn {
            Self::EndOfTurn
        } else {
            Self::Fragment(text)
        }
    }
}

/// What an inbound unit did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnUpdate {
    Opened(MessageId),
    Appended(MessageId),
    Ended,
}

#[derive(Debug, Default)]
pub struct SessionState {
    uploaded_file: Option<ResumeFile>,
    messages: Vec<Message>,
    is_loading: bool,
    phase: TurnPhase,
}

impl SessionState {
    pub fn uploaded_file(&self) -> Option<&ResumeFile> {
        self.uploaded_file.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Fresh session for a newly uploaded file.
    pub fn start(&mut self, file: ResumeFile) {
        *self = Self {
            uploaded_file: Some(file),
            ..Self::default()
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn begin_turn(&mut self, content: impl Into<String>) -> MessageId {
        let message = Message::user(content);
        let id = message.id;
        self.messages.push(message);
        self.is_loading = true;
        self.phase = TurnPhase::AwaitingFirstChunk;
        id
    }

    pub fn apply_inbound(&mut self, inbound: Inbound) -> TurnUpdate {
        let fragment = match inbound {
            Inbound::EndOfTurn => {
                self.is_loading = false;
                self.phase = TurnPhase::Idle;
                return TurnUpdate::Ended;
            }
            Inbound::Fragment(fragment) => fragment,
        };

        match self.messages.last() {
            Some(last) if last.is_assistant() => {
                let updated = last.extended(&fragment);
                let id = updated.id;
                self.replace_last(updated);
                self.phase = TurnPhase::Streaming;
                TurnUpdate::Appended(id)
            }
            _ => {
                let message = Message::assistant(fragment);
                let id = message.id;
                self.messages.push(message);
                self.is_loading = false;
                self.phase = TurnPhase::Streaming;
                TurnUpdate::Opened(id)
            }
        }
    }

    /// Connection went away: stop waiting but keep whatever was received.
    pub fn interrupt(&mut self) {
        self.is_loading = false;
        self.phase = TurnPhase::Idle;
    }

    fn replace_last(&mut self, message: Message) {
        if let Some(slot) = self.messages.last_mut() {
            *slot = message;
        }
    }
}
