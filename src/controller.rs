use crate::chat::{ChatConnection, ConnectionState, Handshake};
use crate::config::{AppConfig, ChatMode};
use crate::error::{SendError, UploadError};
use crate::event::{AppEvent, ConnectionId, InboundFrame};
use crate::notify::{Notice, Notifier};
use crate::session::{Inbound, ResumeFile, SessionState};
use crate::upload::{self, UploadReceipt};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const MAX_DIAGNOSTICS: usize = 200;

/// Owns the session and the chat connection; every state change goes through here.
pub struct PageController<N: Notifier> {
    config: AppConfig,
    runtime: Handle,
    tx: mpsc::Sender<AppEvent>,
    http: reqwest::Client,
    session: SessionState,
    connection: Option<ChatConnection>,
    next_connection: u64,
    upload_in_flight: bool,
    notifier: N,
    diagnostics: VecDeque<String>,
}

impl<N: Notifier> PageController<N> {
    pub fn new(config: AppConfig, runtime: Handle, tx: mpsc::Sender<AppEvent>, notifier: N) -> Self {
        Self {
            config,
            runtime,
            tx,
            http: reqwest::Client::new(),
            session: SessionState::default(),
            connection: None,
            next_connection: 0,
            upload_in_flight: false,
            notifier,
            diagnostics: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.connection.as_ref().map(ChatConnection::state)
    }

    pub fn upload_in_flight(&self) -> bool {
        self.upload_in_flight
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &String> {
        self.diagnostics.iter()
    }

    fn timestamp() -> String {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }

    pub fn log_diagnostic(&mut self, message: impl Into<String>) {
        if self.diagnostics.len() == MAX_DIAGNOSTICS {
            self.diagnostics.pop_front();
        }
        self.diagnostics
            .push_back(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    /// Drag-and-drop path: unsupported files are ignored without a notice.
    pub fn offer_dropped_file(&mut self, path: &Path, declared_media_type: Option<&str>) {
        match upload::accept_file(path, declared_media_type) {
            Ok(file) => self.start_upload(file),
            Err(err) => {
                debug!("ignoring dropped file: {err}");
                self.log_diagnostic(format!("ignored dropped file: {err}"));
            }
        }
    }

    /// File-picker path: same validation, but a rejection is reported.
    pub fn pick_file(&mut self, path: &Path) {
        match upload::accept_file(path, None) {
            Ok(file) => self.start_upload(file),
            Err(err) => {
                self.log_diagnostic(format!("rejected picked file: {err}"));
                let description = match err {
                    UploadError::UnsupportedMediaType { .. } => {
                        "Please choose a PDF or Word document.".to_string()
                    }
                    other => other.to_string(),
                };
                self.notifier
                    .notify(Notice::error("Unsupported file", description));
            }
        }
    }

    fn start_upload(&mut self, file: ResumeFile) {
        if self.upload_in_flight {
            self.log_diagnostic(format!("upload already in progress, ignoring {}", file.name));
            return;
        }
        self.upload_in_flight = true;
        self.log_diagnostic(format!("uploading {} ({})", file.name, file.media_type));

        if self.config.mode == ChatMode::Simulated {
            self.handle_event(AppEvent::UploadFinished {
                file,
                result: Ok(UploadReceipt::default()),
            });
            return;
        }

        let tx = self.tx.clone();
        let client = self.http.clone();
        let url = self.config.upload_url.clone();
        self.runtime.spawn(async move {
            let result = upload::upload(&client, &url, &file).await;
            let _ = tx.send(AppEvent::UploadFinished { file, result });
        });
    }

    pub fn remove_file(&mut self) {
        self.teardown_connection();
        self.session.clear();
        self.log_diagnostic("resume removed");
        self.notifier.notify(Notice::info(
            "Resume removed",
            "Upload a new resume to continue.",
        ));
    }

    /// Sends one user message. Nothing is recorded unless the write was accepted.
    pub fn send_message(&mut self, content: String) -> Result<(), SendError> {
        let result = match self.connection.as_ref() {
            Some(connection) => connection.send(content.clone()),
            None => Err(SendError::NotConnected),
        };

        if let Err(err) = result {
            warn!("message not sent: {err}");
            self.log_diagnostic(format!("send failed: {err}"));
            self.notifier.notify(Notice::error(
                "Connection not available",
                "Please upload a resume to start chatting.",
            ));
            return Err(err);
        }

        self.session.begin_turn(content);
        Ok(())
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::UploadFinished { file, result } => {
                self.upload_in_flight = false;
                match result {
                    Ok(receipt) => self.commit_upload(file, receipt),
                    Err(err) => {
                        warn!(name = %file.name, "upload failed: {err}");
                        self.log_diagnostic(format!("upload failed: {err}"));
                        self.notifier.notify(Notice::error(
                            "Upload failed",
                            "Could not upload resume. Please ensure the backend is running and try again.",
                        ));
                    }
                }
            }
            AppEvent::ChatOpened(connection) => {
                if !self.is_current(connection) {
                    return;
                }
                self.log_diagnostic(format!("connection {connection} open"));
                self.notifier.notify(Notice::info(
                    "Connection established",
                    "You can now start chatting with your resume.",
                ));
            }
            AppEvent::ChatFrame { connection, frame } => {
                if !self.is_current(connection) {
                    return;
                }
                let inbound = match frame {
                    InboundFrame::Text(text) => Inbound::classify(text, &self.config.end_of_turn),
                    InboundFrame::Binary(bytes) => {
                        warn!(%connection, len = bytes.len(), "binary frame treated as text");
                        self.log_diagnostic(format!(
                            "binary frame of {} bytes treated as text",
                            bytes.len()
                        ));
                        Inbound::Fragment(String::from_utf8_lossy(&bytes).into_owned())
                    }
                };
                self.session.apply_inbound(inbound);
            }
            AppEvent::ChatClosed { connection, reason } => {
                if !self.is_current(connection) {
                    return;
                }
                self.session.interrupt();
                let detail = reason.map(|r| format!(": {r}")).unwrap_or_default();
                self.log_diagnostic(format!("connection {connection} closed{detail}"));
                self.notifier.notify(Notice::info(
                    "Connection closed",
                    "The connection to the chat service has been closed.",
                ));
            }
            AppEvent::ChatFailed {
                connection,
                message,
            } => {
                if !self.is_current(connection) {
                    return;
                }
                self.session.interrupt();
                self.log_diagnostic(format!("connection {connection} failed: {message}"));
                self.notifier.notify(Notice::error(
                    "Connection closed",
                    format!("The connection to the chat service failed: {message}"),
                ));
            }
        }
    }

    fn commit_upload(&mut self, file: ResumeFile, receipt: UploadReceipt) {
        self.teardown_connection();
        info!(name = %file.name, "resume accepted");
        self.notifier.notify(Notice::info(
            "Resume uploaded!",
            format!("{} is ready for analysis.", file.name),
        ));
        self.session.start(file);
        self.open_connection(receipt.cookie);
    }

    fn open_connection(&mut self, cookie: Option<String>) {
        self.next_connection += 1;
        let id = ConnectionId(self.next_connection);
        let connection = match self.config.mode {
            ChatMode::Live => ChatConnection::open_live(
                id,
                Handshake {
                    url: self.config.chat_url.clone(),
                    cookie,
                },
                &self.runtime,
                self.tx.clone(),
            ),
            ChatMode::Simulated => ChatConnection::open_simulated(
                id,
                Duration::from_millis(self.config.simulated_delay_ms),
                self.config.end_of_turn.clone(),
                &self.runtime,
                self.tx.clone(),
            ),
        };
        self.log_diagnostic(format!("connection {id} connecting"));
        self.connection = Some(connection);
    }

    fn teardown_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.log_diagnostic(format!("connection {} torn down", connection.id()));
            connection.close();
        }
        self.session.interrupt();
    }

    fn is_current(&self, connection: ConnectionId) -> bool {
        let current = self.connection.as_ref().map(ChatConnection::id) == Some(connection);
        if !current {
            debug!(%connection, "dropping event from stale connection");
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::PageController;
    use crate::chat::ConnectionState;
    use crate::config::{AppConfig, ChatMode};
    use crate::error::{SendError, UploadError};
    use crate::event::{AppEvent, ConnectionId, InboundFrame};
    use crate::notify::{Notice, Severity};
    use crate::session::{ResumeFile, Role, TurnPhase};
    use crate::upload::UploadReceipt;
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn resume(name: &str) -> ResumeFile {
        ResumeFile {
            name: name.to_string(),
            path: PathBuf::from(format!("/tmp/{name}")),
            media_type: "application/pdf".to_string(),
            size_bytes: 1024,
        }
    }

    fn simulated() -> AppConfig {
        AppConfig {
            mode: ChatMode::Simulated,
            simulated_delay_ms: 60_000,
            ..AppConfig::default()
        }
    }

    struct Harness {
        _runtime: tokio::runtime::Runtime,
        rx: mpsc::Receiver<AppEvent>,
        controller: PageController<Vec<Notice>>,
    }

    impl Harness {
        fn new(config: AppConfig) -> Self {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .expect("runtime should build");
            let (tx, rx) = mpsc::channel();
            let controller =
                PageController::new(config, runtime.handle().clone(), tx, Vec::new());
            Self {
                _runtime: runtime,
                rx,
                controller,
            }
        }

        fn upload(&mut self, name: &str) {
            self.controller.handle_event(AppEvent::UploadFinished {
                file: resume(name),
                result: Ok(UploadReceipt::default()),
            });
        }

        /// Pumps events into the controller until the connection reports open.
        fn wait_until_open(&mut self) -> ConnectionId {
            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                assert!(Instant::now() < deadline, "connection should open");
                if let Ok(event) = self.rx.recv_timeout(Duration::from_millis(20)) {
                    let opened = match &event {
                        AppEvent::ChatOpened(id) => Some(*id),
                        _ => None,
                    };
                    self.controller.handle_event(event);
                    if let Some(id) = opened {
                        if self.controller.connection_state() == Some(ConnectionState::Open) {
                            return id;
                        }
                    }
                }
            }
        }

        fn frame(&mut self, connection: ConnectionId, text: &str) {
            self.controller.handle_event(AppEvent::ChatFrame {
                connection,
                frame: InboundFrame::Text(text.to_string()),
            });
        }

        fn titles(&self) -> Vec<&str> {
            self.controller
                .notifier()
                .iter()
                .map(|notice| notice.title.as_str())
                .collect()
        }
    }

    #[test]
    fn send_without_upload_fails_fast_with_notice() {
        let mut harness = Harness::new(simulated());

        let result = harness.controller.send_message("What skills?".to_string());
        assert_eq!(result, Err(SendError::NotConnected));
        assert!(harness.controller.session().messages().is_empty());
        assert!(!harness.controller.session().is_loading());

        let notice = harness.controller.notifier().last().cloned().expect("notice");
        assert_eq!(notice.title, "Connection not available");
        assert_eq!(notice.severity, Severity::Error);
    }

    #[test]
    fn resume_scenario_streams_reply_into_history() {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        assert_eq!(
            harness.controller.session().uploaded_file().map(|f| f.name.as_str()),
            Some("resume.pdf")
        );
        let id = harness.wait_until_open();

        harness
            .controller
            .send_message("What skills?".to_string())
            .expect("open connection accepts sends");
        let session = harness.controller.session();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::User);
        assert_eq!(session.messages()[0].content, "What skills?");
        assert!(session.is_loading());

        harness.frame(id, "Tech");
        assert!(!harness.controller.session().is_loading());
        harness.frame(id, "nical skills: X");
        harness.frame(id, "[DONE]");

        let session = harness.controller.session();
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].role, Role::Assistant);
        assert_eq!(session.messages()[1].content, "Technical skills: X");
        assert!(!session.is_loading());
        assert_eq!(session.phase(), TurnPhase::Idle);

        assert_eq!(
            harness.titles(),
            vec!["Resume uploaded!", "Connection established"]
        );
    }

    #[test]
    fn removing_the_file_resets_everything() {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        let id = harness.wait_until_open();
        for n in 0..5 {
            harness
                .controller
                .send_message(format!("q{n}"))
                .expect("open connection accepts sends");
            harness.frame(id, "partial");
        }

        harness.controller.remove_file();
        let session = harness.controller.session();
        assert!(session.uploaded_file().is_none());
        assert!(session.messages().is_empty());
        assert!(!session.is_loading());
        assert_eq!(harness.controller.connection_state(), None);
        assert_eq!(harness.titles().last(), Some(&"Resume removed"));

        assert_eq!(
            harness.controller.send_message("again".to_string()),
            Err(SendError::NotConnected)
        );
    }

    #[test]
    fn events_from_a_replaced_connection_are_ignored() {
        let mut harness = Harness::new(simulated());
        harness.upload("first.pdf");
        let first = harness.wait_until_open();

        harness.upload("second.pdf");
        let second = harness.wait_until_open();
        assert_ne!(first, second);

        harness
            .controller
            .send_message("hello".to_string())
            .expect("open connection accepts sends");
        harness.frame(first, "stale text");
        harness.controller.handle_event(AppEvent::ChatClosed {
            connection: first,
            reason: None,
        });

        let session = harness.controller.session();
        assert_eq!(session.messages().len(), 1);
        assert!(session.is_loading());
        assert_eq!(
            session.uploaded_file().map(|f| f.name.as_str()),
            Some("second.pdf")
        );
    }

    #[test]
    fn server_close_keeps_partial_reply_and_notifies() {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        let id = harness.wait_until_open();
        harness
            .controller
            .send_message("q".to_string())
            .expect("open connection accepts sends");
        harness.frame(id, "half an ans");

        harness.controller.handle_event(AppEvent::ChatClosed {
            connection: id,
            reason: Some("going away".to_string()),
        });
        assert!(!harness.controller.session().is_loading());
        assert_eq!(harness.controller.session().messages()[1].content, "half an ans");
        assert_eq!(harness.titles().last(), Some(&"Connection closed"));
    }

    /// Sends one question and checks the turn is waiting on its first fragment.
    fn awaiting_reply() -> (Harness, ConnectionId) {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        let id = harness.wait_until_open();
        harness
            .controller
            .send_message("What skills?".to_string())
            .expect("open connection accepts sends");
        let session = harness.controller.session();
        assert!(session.is_loading());
        assert_eq!(session.phase(), TurnPhase::AwaitingFirstChunk);
        (harness, id)
    }

    #[test]
    fn server_close_while_awaiting_reply_clears_loading() {
        let (mut harness, id) = awaiting_reply();
        harness.controller.handle_event(AppEvent::ChatClosed {
            connection: id,
            reason: None,
        });

        let session = harness.controller.session();
        assert!(!session.is_loading());
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(harness.titles().last(), Some(&"Connection closed"));
    }

    #[test]
    fn connection_failure_while_awaiting_reply_clears_loading() {
        let (mut harness, id) = awaiting_reply();
        harness.controller.handle_event(AppEvent::ChatFailed {
            connection: id,
            message: "connection reset".to_string(),
        });

        let session = harness.controller.session();
        assert!(!session.is_loading());
        assert_eq!(session.phase(), TurnPhase::Idle);
        let notice = harness.controller.notifier().last().cloned().expect("notice");
        assert_eq!(notice.title, "Connection closed");
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.description.contains("connection reset"));
    }

    #[test]
    fn removing_the_file_while_awaiting_reply_clears_loading() {
        let (mut harness, _) = awaiting_reply();
        harness.controller.remove_file();

        let session = harness.controller.session();
        assert!(!session.is_loading());
        assert_eq!(session.phase(), TurnPhase::Idle);
        assert!(session.messages().is_empty());
        assert_eq!(harness.controller.connection_state(), None);
    }

    #[test]
    fn diagnostics_are_clock_stamped_and_bounded() {
        let mut harness = Harness::new(simulated());
        for n in 0..super::MAX_DIAGNOSTICS + 5 {
            harness.controller.log_diagnostic(format!("entry {n}"));
        }

        let entries: Vec<&String> = harness.controller.diagnostics().collect();
        assert_eq!(entries.len(), super::MAX_DIAGNOSTICS);
        let first = entries[0];
        assert!(first.ends_with("] entry 5"), "unexpected entry {first}");
        let stamp = first
            .strip_prefix('[')
            .and_then(|rest| rest.split(']').next())
            .expect("entry starts with a bracketed stamp");
        assert!(chrono::NaiveTime::parse_from_str(stamp, "%H:%M:%S").is_ok());
    }

    #[test]
    fn binary_frames_are_treated_as_fragments() {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        let id = harness.wait_until_open();
        harness
            .controller
            .send_message("q".to_string())
            .expect("open connection accepts sends");

        harness.controller.handle_event(AppEvent::ChatFrame {
            connection: id,
            frame: InboundFrame::Binary(b"bytes\xff".to_vec()),
        });
        assert_eq!(harness.controller.session().messages()[1].content, "bytes\u{fffd}");
    }

    #[test]
    fn failed_upload_leaves_session_untouched() {
        let mut harness = Harness::new(simulated());
        harness.upload("resume.pdf");
        harness.wait_until_open();

        harness.controller.handle_event(AppEvent::UploadFinished {
            file: resume("other.pdf"),
            result: Err(UploadError::Rejected {
                status: 500,
                body: "Failed to read or parse PDF file.".to_string(),
            }),
        });

        assert_eq!(
            harness.controller.session().uploaded_file().map(|f| f.name.as_str()),
            Some("resume.pdf")
        );
        assert_eq!(
            harness.controller.connection_state(),
            Some(ConnectionState::Open)
        );
        let notice = harness.controller.notifier().last().cloned().expect("notice");
        assert_eq!(notice.title, "Upload failed");
        assert_eq!(notice.severity, Severity::Error);
    }

    #[test]
    fn picker_rejects_unsupported_files_with_notice() {
        let mut harness = Harness::new(simulated());
        let dir = tempfile::tempdir().expect("temp dir should be created");
        harness.controller.pick_file(&dir.path().join("notes.txt"));

        assert!(harness.controller.session().uploaded_file().is_none());
        assert_eq!(harness.titles(), vec!["Unsupported file"]);
    }

    #[test]
    fn dropped_unsupported_file_is_ignored_silently() {
        let mut harness = Harness::new(simulated());
        let dir = tempfile::tempdir().expect("temp dir should be created");
        harness
            .controller
            .offer_dropped_file(&dir.path().join("photo.png"), Some("image/png"));

        assert!(harness.controller.session().uploaded_file().is_none());
        assert!(harness.controller.notifier().is_empty());
        assert!(!harness.controller.upload_in_flight());
    }

    #[test]
    fn dropped_pdf_is_accepted_in_simulated_mode() {
        let mut harness = Harness::new(simulated());
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let path = dir.path().join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.4").expect("fixture should write");

        harness.controller.offer_dropped_file(&path, None);
        assert!(!harness.controller.upload_in_flight());
        assert_eq!(
            harness.controller.session().uploaded_file().map(|f| f.size_bytes),
            Some(8)
        );
        harness.wait_until_open();
    }
}
