//! In-process stand-in for the chat backend. Answers with canned replies keyed
//! on words in the question, streamed the same way the live service streams.

use super::{Command, ConnectionState, StateCell};
use crate::event::{AppEvent, ConnectionId, InboundFrame};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;
use tracing::{debug, info};

const FRAGMENT_INTERVAL: Duration = Duration::from_millis(25);

const SKILLS: &str = "Based on the resume, the key skills include:\n\n\
• **Technical Skills**: JavaScript, TypeScript, React, Node.js, Python\n\
• **Soft Skills**: Leadership, Problem-solving, Communication\n\
• **Tools**: Git, Docker, AWS, Figma\n\n\
The candidate demonstrates a strong full-stack development background with emphasis on modern web technologies.";

const EXPERIENCE: &str = "The resume shows progressive career growth:\n\n\
**Senior Developer** at Tech Corp (2021-Present)\n\
• Led a team of 5 developers on a major product redesign\n\
• Improved application performance by 40%\n\n\
**Developer** at StartupXYZ (2019-2021)\n\
• Built core features for the main product\n\
• Collaborated with cross-functional teams\n\n\
Total experience: 5+ years in software development.";

const EDUCATION: &str = "**Education Background:**\n\n\
🎓 **Bachelor of Science in Computer Science**\n\
University of Technology, 2019\n\
GPA: 3.8/4.0\n\n\
**Certifications:**\n\
• AWS Certified Developer\n\
• Google Cloud Professional\n\n\
The candidate has a solid academic foundation complemented by industry-recognized certifications.";

const SUMMARY: &str = "**Resume Summary:**\n\n\
This is a well-qualified candidate with 5+ years of experience in full-stack development. Key highlights:\n\n\
✨ Strong technical skills in modern web technologies\n\
✨ Proven leadership experience\n\
✨ Excellent educational background\n\
✨ Industry certifications from major cloud providers\n\n\
The candidate appears well-suited for senior developer or technical lead positions.";

const HELP: &str = "I've analyzed the resume and can help you understand various aspects. Here are some questions you might want to ask:\n\n\
• What are the key technical skills?\n\
• Can you summarize the work experience?\n\
• What's the educational background?\n\
• What makes this candidate stand out?\n\n\
Feel free to ask any specific questions about the resume!";

fn mentions(question: &str, words: &[&str]) -> bool {
    words.iter().any(|word| question.contains(word))
}

pub fn simulated_response(question: &str) -> &'static str {
    let question = question.to_lowercase();

    if mentions(&question, &["skill"]) {
        SKILLS
    } else if mentions(&question, &["experience", "work"]) {
        EXPERIENCE
    } else if mentions(&question, &["education", "degree"]) {
        EDUCATION
    } else if mentions(&question, &["summary", "overview"]) {
        SUMMARY
    } else {
        HELP
    }
}

/// Splits `text` into word-sized pieces that concatenate back to `text`.
pub fn fragments(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

enum Flow {
    Continue,
    Stop,
}

fn take_command(command: Option<Command>, pending: &mut VecDeque<String>) -> Flow {
    match command {
        Some(Command::Send(question)) => {
            pending.push_back(question);
            Flow::Continue
        }
        Some(Command::Close) | None => Flow::Stop,
    }
}

pub(crate) async fn run(
    id: ConnectionId,
    delay: Duration,
    end_of_turn: String,
    state: StateCell,
    mut commands: UnboundedReceiver<Command>,
    tx: mpsc::Sender<AppEvent>,
) {
    if !state.advance(ConnectionState::Connecting, ConnectionState::Open) {
        state.set(ConnectionState::Closed);
        return;
    }
    info!(connection = %id, "simulated chat connection open");
    let _ = tx.send(AppEvent::ChatOpened(id));

    let emit = |text: String| {
        let _ = tx.send(AppEvent::ChatFrame {
            connection: id,
            frame: InboundFrame::Text(text),
        });
    };

    let mut pending = VecDeque::new();
    'session: loop {
        if pending.is_empty() {
            if let Flow::Stop = take_command(commands.recv().await, &mut pending) {
                break;
            }
        }
        let Some(question) = pending.pop_front() else {
            continue;
        };
        debug!(connection = %id, "simulating reply to {} chars", question.len());

        let thinking = time::sleep(delay);
        tokio::pin!(thinking);
        loop {
            tokio::select! {
                _ = &mut thinking => break,
                command = commands.recv() => {
                    if let Flow::Stop = take_command(command, &mut pending) {
                        break 'session;
                    }
                }
            }
        }

        for fragment in fragments(simulated_response(&question)) {
            emit(fragment);
            time::sleep(FRAGMENT_INTERVAL).await;
            let command = match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Disconnected) => None,
            };
            if let Flow::Stop = take_command(command, &mut pending) {
                break 'session;
            }
        }
        emit(end_of_turn.clone());
    }

    state.set(ConnectionState::Closed);
    info!(connection = %id, "simulated chat connection closed");
    let _ = tx.send(AppEvent::ChatClosed {
        connection: id,
        reason: None,
    });
}
