//! Interactive terminal front end
//!
//! Reads commands and answers from stdin, prints the conversation to stdout
//! and pumps speech-capture events in between.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::history::HistorySession;
use crate::interview::{Message, MessageKind, Sender, SessionController, Topic};
use crate::speech::{SpeechCaptureController, SpeechError, SpeechUpdate};

const HELP: &str = "\
Commands:
  /topics            list interview topics
  /start <TOPIC>     start a session, e.g. /start JAVA_CORE
  /next              next question on the current topic
  /history           list stored sessions
  /load <n|id>       resume a stored session
  /listen            start dictating your answer
  /stop              stop dictating
  /send              submit the dictated text
  /help              show this help
  /quit              exit
Anything else is submitted as your answer or follow-up question.";

const SPEECH_UNAVAILABLE_NOTICE: &str =
    "Note: speech recognition is not available here. Type your answers instead.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Topics,
    Start(String),
    Next,
    History,
    Load(String),
    Listen,
    Stop,
    Send,
    Help,
    Quit,
    Input(String),
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Input(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (rest, String::new()),
    };

    match name.to_ascii_lowercase().as_str() {
        "topics" => Command::Topics,
        "start" | "topic" => Command::Start(arg),
        "next" => Command::Next,
        "history" => Command::History,
        "load" => Command::Load(arg),
        "listen" => Command::Listen,
        "stop" => Command::Stop,
        "send" => Command::Send,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

pub fn render_message(msg: &Message) -> String {
    let who = match msg.sender {
        Sender::Ai => "interviewer",
        Sender::User => "you",
    };
    let mut out = format!("{who} › {}", msg.content);

    if let (MessageKind::Evaluation, Some(eval)) = (msg.kind, &msg.evaluation) {
        out.push_str(&format!("\n  Score: {}/100", eval.score));
        out.push_str(&format!("\n  Analysis: {}", eval.analysis));
        if !eval.missing_points.is_empty() {
            out.push_str("\n  Missing points:");
            for point in &eval.missing_points {
                out.push_str(&format!("\n    - {point}"));
            }
        }
        out.push_str(&format!("\n  Ideal answer:\n{}", eval.ideal_answer));
    }
    out
}

pub fn render_history_line(index: usize, session: &HistorySession) -> String {
    let date = Utc
        .timestamp_millis_opt(session.start_time)
        .single()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string());
    format!(
        "{index:>3}. [{}] {date}  {}",
        session.topic.id(),
        session.preview
    )
}

/// Tracks which messages have been printed already
#[derive(Default)]
struct Cursor {
    session_id: Option<String>,
    shown: usize,
}

impl Cursor {
    fn print_new(&mut self, controller: &SessionController) {
        let session_id = controller.session_id().map(str::to_string);
        if session_id != self.session_id || controller.messages().len() < self.shown {
            self.session_id = session_id;
            self.shown = 0;
        }
        for msg in &controller.messages()[self.shown..] {
            println!("\n{}", render_message(msg));
        }
        self.shown = controller.messages().len();
    }
}

fn prompt(controller: &SessionController, speech: &SpeechCaptureController) {
    let mic = if speech.is_listening() { " 🎙" } else { "" };
    print!("\n[{}{mic}] > ", controller.phase());
    let _ = std::io::stdout().flush();
}

/// History sessions newest first, as listed by `/history`
fn history_newest_first(controller: &SessionController) -> Vec<&HistorySession> {
    controller.history().sessions().iter().rev().collect()
}

pub async fn run(
    mut controller: SessionController,
    mut speech: SpeechCaptureController,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut cursor = Cursor::default();

    let mut speech_notice_shown = false;

    cursor.print_new(&controller);
    println!("\n{HELP}");

    loop {
        prompt(&controller, &speech);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };

                match parse_command(&line) {
                    Command::Empty => {}
                    Command::Help => println!("{HELP}"),
                    Command::Topics => {
                        for topic in Topic::ALL {
                            println!("  {:<20} {}", topic.id(), topic.label());
                        }
                    }
                    Command::Start(arg) => match arg.parse::<Topic>() {
                        Ok(topic) => {
                            println!("Generating a question on {}...", topic.label());
                            match controller.select_topic(topic).await {
                                Ok(()) => cursor.print_new(&controller),
                                Err(e) => println!("{e}"),
                            }
                        }
                        Err(e) => println!("{e}. Use /topics to see the list."),
                    },
                    Command::Next => {
                        match controller.advance_to_next_question().await {
                            Ok(()) => cursor.print_new(&controller),
                            Err(e) => println!("{e}"),
                        }
                    }
                    Command::Input(text) => {
                        if controller.current_question().is_none() {
                            println!("Pick a topic first with /start <TOPIC>.");
                            continue;
                        }
                        controller.pending_input().push_fragment(&text);
                        submit(&mut controller, &mut cursor).await;
                    }
                    Command::Send => {
                        if controller.pending_input().is_blank() {
                            println!("Nothing dictated yet.");
                            continue;
                        }
                        submit(&mut controller, &mut cursor).await;
                    }
                    Command::History => {
                        let sessions = history_newest_first(&controller);
                        if sessions.is_empty() {
                            println!("No stored sessions yet.");
                        }
                        for (i, session) in sessions.iter().enumerate() {
                            println!("{}", render_history_line(i + 1, session));
                        }
                    }
                    Command::Load(arg) => {
                        let id = match arg.parse::<usize>() {
                            Ok(n) if n >= 1 => history_newest_first(&controller)
                                .get(n - 1)
                                .map(|s| s.id.clone())
                                .unwrap_or(arg),
                            _ => arg,
                        };
                        match controller.load_history_by_id(&id) {
                            Ok(()) => {
                                cursor = Cursor::default();
                                cursor.print_new(&controller);
                            }
                            Err(e) => println!("{e}"),
                        }
                    }
                    Command::Listen => match speech.start().await {
                        Ok(()) => println!("Listening ({})... /stop to finish, /send to submit.", speech.locale()),
                        Err(SpeechError::Unavailable) if !speech_notice_shown => {
                            speech_notice_shown = true;
                            println!("{SPEECH_UNAVAILABLE_NOTICE}");
                        }
                        Err(SpeechError::Unavailable) => {}
                        Err(e) => println!("Could not start listening: {e}"),
                    },
                    Command::Stop => {
                        if let Err(e) = speech.stop().await {
                            println!("Could not stop listening cleanly: {e}");
                        }
                    }
                    Command::Quit => break,
                    Command::Unknown(name) => println!("Unknown command /{name}. Try /help."),
                }
            }

            Some(update) = speech.next_update(), if speech.has_open_stream() => match update {
                Ok(SpeechUpdate::Appended(text)) => println!("\n🎙 {text}"),
                Ok(SpeechUpdate::Stopped) => {
                    let pending = controller.pending_input().snapshot();
                    if pending.trim().is_empty() {
                        println!("\nListening stopped.");
                    } else {
                        println!("\nListening stopped. Dictated so far: {pending}\n/send to submit it.");
                    }
                }
                Ok(other) => debug!("Speech update: {:?}", other),
                Err(e) => println!("\nSpeech capture stopped: {e}"),
            },
        }
    }

    if speech.is_listening() {
        let _ = speech.stop().await;
    }
    Ok(())
}

async fn submit(controller: &mut SessionController, cursor: &mut Cursor) {
    match controller.submit_pending().await {
        Ok(true) => cursor.print_new(controller),
        Ok(false) => println!("Nothing to submit."),
        Err(e) => println!("{e}"),
    }
}
