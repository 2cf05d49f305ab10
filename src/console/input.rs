// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Line input on a dedicated thread.
//!
//! `rustyline` blocks and puts the terminal in raw mode while reading, so
//! the editor lives on its own thread and the async side asks it for one
//! line at a time. Ctrl-C while reading arrives as [`LineEvent::Interrupted`]
//! rather than a signal.

use std::path::PathBuf;
use std::sync::mpsc;

use async_trait::async_trait;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::agent::InputSource;

/// What one read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// Ctrl-D or closed stdin
    Eof,
    Error(String),
}

struct ReadRequest {
    prompt: String,
    reply: oneshot::Sender<LineEvent>,
}

/// Handle to the editor thread.
pub struct LineReader {
    requests: mpsc::Sender<ReadRequest>,
}

impl LineReader {
    /// Start the editor thread. History is loaded from and saved to
    /// `history` when given.
    pub fn spawn(history: Option<PathBuf>, max_history: usize) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<ReadRequest>();
        std::thread::Builder::new()
            .name("readline".to_string())
            .spawn(move || editor_thread(rx, history, max_history))?;
        Ok(Self { requests: tx })
    }

    /// Read one line.
    pub async fn read_line(&self, prompt: &str) -> LineEvent {
        let (reply, response) = oneshot::channel();
        let request = ReadRequest {
            prompt: prompt.to_string(),
            reply,
        };
        if self.requests.send(request).is_err() {
            return LineEvent::Eof;
        }
        response.await.unwrap_or(LineEvent::Eof)
    }

    /// Line source for chat mode. Ctrl-C or Ctrl-D ends the chat.
    pub fn chat_input(&self, prompt: impl Into<String>) -> ChatInput<'_> {
        ChatInput {
            reader: self,
            prompt: prompt.into(),
        }
    }
}

fn editor_thread(requests: mpsc::Receiver<ReadRequest>, history: Option<PathBuf>, max_history: usize) {
    let mut editor = match build_editor(max_history) {
        Ok(editor) => editor,
        Err(e) => {
            warn!(error = %e, "Line editor unavailable");
            for request in requests {
                let _ = request.reply.send(LineEvent::Error(e.to_string()));
            }
            return;
        }
    };

    if let Some(path) = &history {
        if let Err(e) = editor.load_history(path) {
            debug!(path = %path.display(), error = %e, "No history loaded");
        }
    }

    for request in requests {
        let event = match editor.readline(&request.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                    if let Some(path) = &history {
                        if let Err(e) = editor.save_history(path) {
                            debug!(path = %path.display(), error = %e, "History not saved");
                        }
                    }
                }
                LineEvent::Line(line)
            }
            Err(ReadlineError::Interrupted) => LineEvent::Interrupted,
            Err(ReadlineError::Eof) => LineEvent::Eof,
            Err(e) => LineEvent::Error(e.to_string()),
        };
        let _ = request.reply.send(event);
    }
}

fn build_editor(max_history: usize) -> rustyline::Result<DefaultEditor> {
    let config = Config::builder()
        .max_history_size(max_history.max(1))?
        .auto_add_history(false)
        .build();
    DefaultEditor::with_config(config)
}

/// [`InputSource`] over a [`LineReader`].
pub struct ChatInput<'a> {
    reader: &'a LineReader,
    prompt: String,
}

#[async_trait]
impl InputSource for ChatInput<'_> {
    async fn next_line(&mut self) -> Option<String> {
        match self.reader.read_line(&self.prompt).await {
            LineEvent::Line(line) => Some(line),
            LineEvent::Interrupted | LineEvent::Eof => None,
            LineEvent::Error(e) => {
                warn!(error = %e, "Input error");
                None
            }
        }
    }
}
