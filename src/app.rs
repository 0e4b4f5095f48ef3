use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config;
use crate::models::{Message, Topic};
use crate::services::export::export_to_markdown;
use crate::services::markdown::render_terminal;
use crate::services::{
    AppSettings, ChatController, ChatError, Database, NoticeLevel, Route, SettingsService,
    UiEvent,
};

const HELP: &str = "\
Type a question and press Enter to ask the coach.

  /new              start a new conversation
  /sessions         list your conversations
  /open <id>        switch to a conversation
  /delete <id>      delete a conversation
  /search <text>    search past conversations
  /refresh          reload this conversation and the session list
  /topic <name>     prefill a question (nutrition, strength, training, injury, analytics)
  /send             send the prefilled question
  /export <path>    save this conversation as Markdown
  /help             show this help
  /quit             exit";

#[derive(Debug, PartialEq)]
pub enum AppMsg {
    SendMessage(String),
    SendDraft,
    NewChat,
    ListSessions,
    Refresh,
    SessionSelected(String),
    DeleteSession(String),
    Search(String),
    Topic(Topic),
    Export(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl AppMsg {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Some(AppMsg::SendMessage(line.to_string()));
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        let msg = match (name, arg) {
            ("new", _) => AppMsg::NewChat,
            ("sessions", _) => AppMsg::ListSessions,
            ("refresh", _) => AppMsg::Refresh,
            ("send", _) => AppMsg::SendDraft,
            ("help", _) => AppMsg::Help,
            ("quit" | "exit", _) => AppMsg::Quit,
            ("open", id) if !id.is_empty() => AppMsg::SessionSelected(id.to_string()),
            ("delete", id) if !id.is_empty() => AppMsg::DeleteSession(id.to_string()),
            ("search", q) if !q.is_empty() => AppMsg::Search(q.to_string()),
            ("export", path) if !path.is_empty() => AppMsg::Export(PathBuf::from(path)),
            ("topic", t) => match Topic::from_str(t) {
                Some(topic) => AppMsg::Topic(topic),
                None => AppMsg::Invalid(format!("Unknown topic: {}", t)),
            },
            _ => AppMsg::Invalid(format!("Unknown or incomplete command: /{}", command)),
        };
        Some(msg)
    }
}

/// Tracks what has already been printed so each change only prints the new
/// part of the conversation.
pub struct TranscriptPrinter {
    shown: Vec<Message>,
    render_markdown: bool,
}

impl TranscriptPrinter {
    pub fn new(render_markdown: bool) -> Self {
        Self {
            shown: Vec::new(),
            render_markdown,
        }
    }

    fn answer(&self, msg: &Message) -> String {
        if msg.is_error() {
            return format!("! {}\n", msg.response_text);
        }
        let text = if self.render_markdown {
            render_terminal(&msg.response_text)
        } else {
            msg.response_text.clone()
        };
        format!("coach ›\n{}\n", text)
    }

    fn full(&self, msg: &Message) -> String {
        let mut out = format!("you › {}\n", msg.query_text);
        if !msg.is_pending() {
            out.push_str(&self.answer(msg));
        }
        out
    }

    pub fn update(&mut self, current: &[Message]) -> String {
        let common = self
            .shown
            .iter()
            .zip(current)
            .take_while(|(a, b)| a == b)
            .count();

        let mut out = String::new();
        let mut from = common;

        if common < self.shown.len() {
            let settled = self.shown[common].is_pending()
                && current
                    .get(common)
                    .is_some_and(|m| !m.is_pending() && m.query_text == self.shown[common].query_text);
            if settled {
                out.push_str(&self.answer(&current[common]));
                from = common + 1;
            } else {
                out.push_str("──────────\n");
                from = 0;
            }
        }

        for msg in &current[from..] {
            out.push_str(&self.full(msg));
        }

        self.shown = current.to_vec();
        out
    }
}

pub struct App {
    controller: Arc<ChatController>,
    db: Database,
    settings: AppSettings,
}

impl App {
    pub fn new(controller: Arc<ChatController>, db: Database, settings: AppSettings) -> Self {
        Self {
            controller,
            db,
            settings,
        }
    }

    fn spawn_event_loop(&self, mut events: mpsc::UnboundedReceiver<UiEvent>) {
        let controller = self.controller.clone();
        let db = self.db.clone();
        let render_markdown = self.settings.render_markdown;

        tokio::spawn(async move {
            let mut printer = TranscriptPrinter::new(render_markdown);
            while let Some(event) = events.recv().await {
                match event {
                    UiEvent::MessagesChanged => {
                        print!("{}", printer.update(&controller.messages()));
                    }
                    UiEvent::SessionsUpdated => {}
                    UiEvent::LocationChanged(location) => {
                        tracing::debug!(location = %location, "Location changed");
                        if let Err(e) = SettingsService::save_location(&db, &location).await {
                            tracing::error!("Failed to save location: {}", e);
                        }
                    }
                    UiEvent::Notice { level, text } => {
                        let tag = match level {
                            NoticeLevel::Info => "info",
                            NoticeLevel::Success => "ok",
                            NoticeLevel::Warning => "warning",
                            NoticeLevel::Error => "error",
                        };
                        println!("[{}] {}", tag, text);
                    }
                    UiEvent::Redirect(route) => {
                        println!("{}", redirect_hint(&controller, route));
                    }
                }
            }
        });
    }

    pub async fn run(self, events: mpsc::UnboundedReceiver<UiEvent>) -> Result<()> {
        self.spawn_event_loop(events);

        match self.controller.identity() {
            Some(identity) => println!("{}: signed in as {}", config::APP_NAME, identity.email),
            None => println!("{}: not signed in", config::APP_NAME),
        }
        println!("Type /help for commands.");

        self.controller.refresh_sessions().await;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            let Some(msg) = AppMsg::parse(&line) else {
                continue;
            };
            if msg == AppMsg::Quit {
                break;
            }
            self.update(msg).await;
        }

        Ok(())
    }

    async fn update(&self, msg: AppMsg) {
        match msg {
            AppMsg::SendMessage(text) => {
                spawn_submit(self.controller.clone(), text);
            }
            AppMsg::SendDraft => {
                spawn_submit(self.controller.clone(), self.controller.draft());
            }
            AppMsg::NewChat => {
                if let Err(e) = self.controller.start_new_session().await {
                    tracing::debug!("New chat not started: {}", e);
                }
            }
            AppMsg::ListSessions => {
                self.controller.refresh_sessions().await;
                print!("{}", self.format_sessions());
            }
            AppMsg::Refresh => {
                self.controller.refresh_history().await;
                self.controller.refresh_sessions().await;
            }
            AppMsg::SessionSelected(id) => self.controller.select_session(&id).await,
            AppMsg::DeleteSession(id) => {
                if let Err(e) = self.controller.delete_session(&id).await {
                    tracing::debug!(session_id = %id, "Delete failed: {}", e);
                }
            }
            AppMsg::Search(query) => {
                let hits = self.controller.search(&query).await;
                if hits.is_empty() {
                    println!("No conversations match \"{}\"", query);
                }
                for hit in hits {
                    println!("  {}  {}", hit.session_id, hit.title);
                }
            }
            AppMsg::Topic(topic) => {
                self.controller.apply_topic(topic);
                println!("draft › {}  (/send to ask)", self.controller.draft());
            }
            AppMsg::Export(path) => {
                if let Err(e) = self.export(&path).await {
                    tracing::error!("Export failed: {:#}", e);
                    println!("[error] {:#}", e);
                }
            }
            AppMsg::Help => println!("{}", HELP),
            AppMsg::Invalid(reason) => println!("{}", reason),
            AppMsg::Quit => {}
        }
    }

    fn format_sessions(&self) -> String {
        let sessions = self.controller.sessions();
        if sessions.is_empty() {
            return "No conversations yet.\n".to_string();
        }

        let active = self.controller.active_session_id();
        let mut out = String::new();
        for (recency, group) in sessions.groups() {
            out.push_str(&format!("{}\n", recency.label()));
            for session in group {
                let marker = if active.as_deref() == Some(session.session_id.as_str()) {
                    "*"
                } else {
                    " "
                };
                out.push_str(&format!(" {} {}  {}\n", marker, session.session_id, session.title));
            }
        }
        out
    }

    async fn export(&self, path: &std::path::Path) -> Result<()> {
        let messages = self.controller.messages();
        if messages.is_empty() {
            anyhow::bail!("Nothing to export yet");
        }

        let title = self
            .controller
            .active_session_id()
            .and_then(|id| self.controller.sessions().find(&id).map(|s| s.title.clone()))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Coaching session".to_string());

        let markdown = export_to_markdown(&title, Local::now(), &messages);
        tokio::fs::write(path, markdown)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Exported to {}", path.display());
        Ok(())
    }
}

/// Submissions run in the background so the conversation can be switched
/// while the coach is answering. The text travels with the task, so lines
/// read back to back are each sent as typed.
fn spawn_submit(
    controller: Arc<ChatController>,
    text: String,
) -> JoinHandle<Result<(), ChatError>> {
    tokio::spawn(async move {
        let result = controller.submit_message(&text).await;
        match &result {
            Ok(()) => {}
            Err(ChatError::Busy) => println!("Still waiting for the previous answer."),
            Err(ChatError::EmptyQuery) => println!("Nothing to send."),
            Err(e) => tracing::debug!("Submission ended: {}", e),
        }
        result
    })
}

fn redirect_hint(controller: &ChatController, route: Route) -> String {
    match route {
        Route::SignIn => {
            "Sign in first: coachbot login --email <email> --token <token>".to_string()
        }
        Route::PlanSelection => match controller.location().url().join(route.path()) {
            Ok(url) => format!("Choose a plan at {}", url),
            Err(_) => "Choose a paid plan to keep chatting.".to_string(),
        },
    }
}
