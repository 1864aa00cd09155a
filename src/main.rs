use eframe::egui;
use resume_chat::app::ResumeChatApp;
use resume_chat::config;
use resume_chat::controller::PageController;
use resume_chat::notify::ToastQueue;
use resume_chat::theme::Theme;
use std::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("resume_chat=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (app_config, warnings) = config::load();
    info!(
        mode = ?app_config.mode,
        upload_url = %app_config.upload_url,
        chat_url = %app_config.chat_url,
        "starting resume chat"
    );

    let (tx, rx) = mpsc::channel();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("resume-chat-runtime")
        .build()?;

    let mut controller =
        PageController::new(app_config, runtime.handle().clone(), tx, ToastQueue::default());
    for warning in warnings {
        warn!("config warning: {warning}");
        controller.log_diagnostic(format!("config warning: {warning}"));
    }

    let theme = Theme::default();
    let app = ResumeChatApp::new(rx, controller, theme.clone());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Resume Chat")
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Resume Chat",
        native_options,
        Box::new(move |creation_context| {
            theme.apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
