use crate::chat::ConnectionState;
use crate::composer::{Composer, ComposerGate};
use crate::controller::PageController;
use crate::event::AppEvent;
use crate::notify::{Severity, ToastQueue};
use crate::session::{Message, Role};
use crate::theme::Theme;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

const SUGGESTIONS: [&str; 3] = [
    "What are the key skills?",
    "Summarize the experience",
    "What's the education background?",
];

const BACKGROUND_POLL: Duration = Duration::from_millis(100);

pub struct ResumeChatApp {
    rx: Receiver<AppEvent>,
    controller: PageController<ToastQueue>,
    composer: Composer,
    theme: Theme,
    picker_path: String,
    scroll_to_bottom: bool,
}

impl ResumeChatApp {
    pub fn new(rx: Receiver<AppEvent>, controller: PageController<ToastQueue>, theme: Theme) -> Self {
        Self {
            rx,
            controller,
            composer: Composer::default(),
            theme,
            picker_path: String::new(),
            scroll_to_bottom: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.controller.handle_event(event);
                    self.scroll_to_bottom = true;
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.controller.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn has_background_work(&self) -> bool {
        self.controller.upload_in_flight()
            || matches!(
                self.controller.connection_state(),
                Some(ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Closing)
            )
            || !self.controller.notifier().is_empty()
    }

    fn connection_label(&self) -> (&'static str, Color32) {
        match self.controller.connection_state() {
            Some(ConnectionState::Open) => ("Connected", self.theme.success),
            Some(ConnectionState::Connecting) => ("Connecting...", self.theme.warning),
            Some(ConnectionState::Closing) => ("Closing...", self.theme.warning),
            Some(ConnectionState::Closed) => ("Disconnected", self.theme.danger),
            None => ("No resume", self.theme.text_muted),
        }
    }

    fn gate(&self) -> ComposerGate {
        let session = self.controller.session();
        ComposerGate {
            is_loading: session.is_loading(),
            disabled: session.uploaded_file().is_none(),
        }
    }

    fn submit(&mut self, message: String) {
        if self.controller.send_message(message).is_ok() {
            self.scroll_to_bottom = true;
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.first().cloned(),
            )
        });

        if self.controller.session().uploaded_file().is_some() {
            return false;
        }

        if let Some(file) = dropped {
            match file.path {
                Some(path) => {
                    let declared = Some(file.mime.as_str()).filter(|mime| !mime.is_empty());
                    self.controller.offer_dropped_file(&path, declared);
                }
                None => self
                    .controller
                    .log_diagnostic(format!("dropped file {} has no path", file.name)),
            }
        }
        hovering
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        let (status_label, status_color) = self.connection_label();
        let mut remove_clicked = false;
        egui::TopBottomPanel::top("header")
            .frame(self.theme.panel_frame(self.theme.surface_0, self.theme.spacing_12 as i8))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new("✨").size(20.0).color(self.theme.accent_primary));
                    ui.vertical(|ui| {
                        ui.strong("Resume Chat");
                        ui.label(
                            RichText::new("AI-powered resume analysis")
                                .small()
                                .color(self.theme.text_muted),
                        );
                    });

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if let Some(file) = self.controller.session().uploaded_file() {
                            if ui
                                .small_button("✕")
                                .on_hover_text("Remove resume")
                                .clicked()
                            {
                                remove_clicked = true;
                            }
                            self.theme.chip_frame().show(ui, |ui| {
                                ui.label(RichText::new(format!("📄 {}", file.name)).small());
                            });
                        }
                        ui.label(RichText::new(status_label).small().color(status_color));
                    });
                });
            });

        if remove_clicked {
            self.composer.set_text("");
            self.controller.remove_file();
        }
    }

    fn render_upload(&mut self, ui: &mut egui::Ui, dragging: bool) {
        ui.vertical_centered(|ui| {
            ui.add_space((ui.available_height() * 0.15).max(self.theme.spacing_24));
            ui.set_max_width(520.0);
            ui.heading(RichText::new("Chat with your Resume").color(self.theme.accent_primary));
            ui.label(
                RichText::new(
                    "Upload your resume and ask any questions about it.\nGet instant, intelligent insights.",
                )
                .color(self.theme.text_muted),
            );
            ui.add_space(self.theme.spacing_16);

            self.theme.drop_zone_frame(dragging).show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.vertical_centered(|ui| {
                    let title = if dragging {
                        "Drop your resume here"
                    } else {
                        "Upload your resume"
                    };
                    ui.label(RichText::new("⬆").size(32.0));
                    ui.label(RichText::new(title).size(18.0).strong());
                    ui.label(
                        RichText::new("Drag & drop or enter a file path below")
                            .color(self.theme.text_muted),
                    );
                    ui.label(
                        RichText::new("Supports PDF")
                            .small()
                            .color(self.theme.text_muted),
                    );
                });
            });

            ui.add_space(self.theme.spacing_12);
            let uploading = self.controller.upload_in_flight();
            let mut pick = false;
            ui.horizontal(|ui| {
                let response = ui.add_enabled(
                    !uploading,
                    egui::TextEdit::singleline(&mut self.picker_path)
                        .hint_text("/path/to/resume.pdf")
                        .desired_width(ui.available_width() - 96.0),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    pick = true;
                }
                if uploading {
                    ui.add(egui::Spinner::new());
                } else {
                    pick |= ui
                        .add_enabled(
                            !self.picker_path.trim().is_empty(),
                            egui::Button::new("Upload"),
                        )
                        .clicked();
                }
            });

            if pick && !uploading {
                let path = PathBuf::from(self.picker_path.trim());
                self.controller.pick_file(&path);
            }
        });
    }

    fn render_message(&self, ui: &mut egui::Ui, message: &Message) {
        let from_user = message.role == Role::User;
        let layout = if from_user {
            egui::Layout::right_to_left(egui::Align::TOP)
        } else {
            egui::Layout::left_to_right(egui::Align::TOP)
        };
        let bubble_width = ui.available_width() * 0.75;

        ui.with_layout(layout, |ui| {
            let avatar = if from_user { "🙂" } else { "✨" };
            ui.label(RichText::new(avatar).size(18.0));
            self.theme.bubble_frame(from_user).show(ui, |ui| {
                ui.set_max_width(bubble_width);
                ui.vertical(|ui| {
                    ui.add(egui::Label::new(RichText::new(&message.content)).wrap());
                    ui.label(
                        RichText::new(message.local_time_label())
                            .small()
                            .color(self.theme.text_muted),
                    );
                });
            });
        });
    }

    fn render_transcript(&mut self, ui: &mut egui::Ui) {
        let session = self.controller.session();
        if session.messages().is_empty() && !session.is_loading() {
            let mut suggestion = None;
            ui.vertical_centered(|ui| {
                ui.add_space((ui.available_height() * 0.25).max(self.theme.spacing_24));
                ui.label(RichText::new("✨").size(28.0).color(self.theme.accent_primary));
                ui.label(RichText::new("Ask anything about the uploaded resume").size(16.0));
                ui.add_space(self.theme.spacing_8);
                ui.horizontal_wrapped(|ui| {
                    for text in SUGGESTIONS {
                        let clicked = self
                            .theme
                            .chip_frame()
                            .show(ui, |ui| ui.add(egui::Label::new(text).sense(egui::Sense::click())))
                            .inner
                            .clicked();
                        if clicked {
                            suggestion = Some(text);
                        }
                    }
                });
            });
            if let Some(text) = suggestion {
                self.composer.set_text(text);
            }
            return;
        }

        ScrollArea::vertical()
            .id_salt("chat_transcript")
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for message in session.messages() {
                    self.render_message(ui, message);
                    ui.add_space(self.theme.spacing_8);
                }

                if session.is_loading() {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(RichText::new("Thinking...").color(self.theme.text_muted));
                    });
                }

                if self.scroll_to_bottom {
                    ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                }
            });
        self.scroll_to_bottom = false;
    }

    fn render_composer(&mut self, ctx: &egui::Context) {
        let gate = self.gate();
        egui::TopBottomPanel::bottom("composer")
            .frame(self.theme.panel_frame(self.theme.surface_1, self.theme.spacing_16 as i8))
            .show(ctx, |ui| {
                let composer_id = egui::Id::new("composer_input");
                let focused = ui.memory(|m| m.has_focus(composer_id));
                let (enter, shift) = if focused {
                    ui.input(|i| (i.key_pressed(egui::Key::Enter), i.modifiers.shift))
                } else {
                    (false, false)
                };
                if enter && !shift {
                    ui.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
                }

                let hint = if gate.disabled {
                    "Upload a resume to start chatting..."
                } else {
                    "Ask about the resume..."
                };

                let mut outgoing = None;
                self.theme.composer_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.add_enabled(
                            gate.accepts_input(),
                            egui::TextEdit::multiline(self.composer.buffer_mut())
                                .id(composer_id)
                                .hint_text(hint)
                                .desired_rows(1)
                                .frame(false)
                                .desired_width(ui.available_width() - 64.0),
                        );

                        if gate.is_loading {
                            ui.add(egui::Spinner::new());
                        } else if ui
                            .add_enabled(self.composer.can_submit(gate), egui::Button::new("Send"))
                            .clicked()
                        {
                            outgoing = self.composer.submit(gate);
                        }
                    });
                });

                if enter {
                    outgoing = outgoing.or_else(|| self.composer.on_enter(shift, gate));
                }
                if let Some(message) = outgoing {
                    self.submit(message);
                }

                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("Press Enter to send, Shift + Enter for new line")
                            .small()
                            .color(self.theme.text_muted),
                    );
                });

                egui::CollapsingHeader::new("Diagnostics")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("diagnostics_log")
                            .max_height(90.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                for entry in self.controller.diagnostics() {
                                    ui.label(RichText::new(entry).monospace().small());
                                }
                            });
                    });
            });
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        let toasts = self.controller.notifier_mut();
        toasts.prune(Instant::now());
        if toasts.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -120.0))
            .show(ctx, |ui| {
                for (index, toast) in self.controller.notifier().visible().enumerate() {
                    let accent = match toast.notice.severity {
                        Severity::Info => self.theme.accent_primary,
                        Severity::Error => self.theme.danger,
                    };
                    self.theme.card_frame().show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&toast.notice.title).strong().color(accent));
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.small_button("✕").clicked() {
                                    dismissed = Some(index);
                                }
                            });
                        });
                        ui.label(&toast.notice.description);
                    });
                }
            });

        if let Some(index) = dismissed {
            self.controller.notifier_mut().dismiss(index);
        }
    }
}

impl eframe::App for ResumeChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);
        let dragging = self.handle_dropped_files(ctx);

        self.render_header(ctx);
        if self.controller.session().uploaded_file().is_some() {
            self.render_composer(ctx);
        }
        egui::CentralPanel::default()
            .frame(self.theme.panel_frame(self.theme.surface_1, self.theme.spacing_16 as i8))
            .show(ctx, |ui| {
                if self.controller.session().uploaded_file().is_none() {
                    self.render_upload(ui, dragging);
                } else {
                    self.render_transcript(ui);
                }
            });
        self.render_toasts(ctx);

        if self.has_background_work() {
            ctx.request_repaint_after(BACKGROUND_POLL);
        }
    }
}
