// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Raw-mode read loop: terminal events and prediction results feed the
//! input model, which is redrawn after every event.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use crossterm::{
    cursor,
    event::{
        DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange, Event,
        EventStream,
    },
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, Clear, ClearType},
};
use futures::StreamExt;
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;
use wisp_config::Config;
use wisp_input::{
    InputEvent, InputMode, InputModel, KeyMap, PredictionOptions, PredictionProvider,
    PredictionState, ResultKind,
};

use crate::providers::{HistoryPredictor, PathCompleter, SessionHistory};

// ── Terminal guard ────────────────────────────────────────────────────────────

/// Raw mode plus paste/focus reporting for as long as it lives.
struct RawTerminal;

impl RawTerminal {
    fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        // Focus reporting is optional; not every terminal supports it.
        let _ = execute!(io::stdout(), EnableBracketedPaste, EnableFocusChange);
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), DisableFocusChange, DisableBracketedPaste);
        let _ = terminal::disable_raw_mode();
    }
}

// ── Read loop ─────────────────────────────────────────────────────────────────

pub async fn run(config: &Config, prompt: &str) -> anyhow::Result<()> {
    let keymap = KeyMap::from_config(&config.keys).context("invalid [keys] configuration")?;
    let history = SessionHistory::new(config.history.max_entries);

    let provider: Option<Arc<dyn PredictionProvider>> = if config.prediction.enabled {
        Some(Arc::new(HistoryPredictor::new(history.clone())))
    } else {
        None
    };
    let prediction = PredictionState::new(provider, PredictionOptions::from(&config.prediction));

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut model = InputModel::new(keymap, prediction)
        .with_completion_provider(Arc::new(PathCompleter::new(cwd)))
        .with_history_search(history.search_fn());
    let mut predictions = model
        .take_prediction_events()
        .context("prediction channel already taken")?;

    if let Ok((width, height)) = terminal::size() {
        model.update(InputEvent::Resize { width, height }).await;
    }

    let _raw = RawTerminal::enter()?;
    let mut out = io::stdout();
    let mut events = EventStream::new();
    info!("wisp ready");
    draw(&mut out, &View::of(prompt, &model))?;

    loop {
        tokio::select! {
            next = events.next() => {
                let Some(event) = next else { break };
                match event.context("failed to read terminal event")? {
                    Event::Key(key) => model.update(InputEvent::Key(key)).await,
                    Event::Paste(text) => model.update(InputEvent::Paste(text)).await,
                    Event::Resize(width, height) => {
                        model.update(InputEvent::Resize { width, height }).await;
                    }
                    Event::FocusGained => model.focus(),
                    Event::FocusLost => model.blur(),
                    _ => continue,
                }
            }
            Some(result) = predictions.recv() => {
                model.update(InputEvent::Prediction(result)).await;
            }
        }

        if let Some(result) = model.result().cloned() {
            debug!(kind = ?result.kind, "line finished");
            match result.kind {
                ResultKind::Submit => {
                    finish_line(&mut out, prompt, &result.value, "")?;
                    if !result.value.is_empty() {
                        queue!(out, Print(&result.value), Print("\r\n"))?;
                    }
                    history.push(&result.value);
                    model.set_history_values(history.entries());
                }
                ResultKind::Interrupt => {
                    finish_line(&mut out, prompt, &result.value, "^C")?;
                    if result.value.is_empty() {
                        break;
                    }
                }
                ResultKind::Eof => {
                    finish_line(&mut out, prompt, "", "")?;
                    break;
                }
            }
            model.reset();
        }

        draw(&mut out, &View::of(prompt, &model))?;
    }

    out.flush()?;
    Ok(())
}

// ── Rendering ─────────────────────────────────────────────────────────────────

/// One frame of the prompt line.
#[derive(Debug, Default, PartialEq, Eq)]
struct View {
    prompt: String,
    before: String,
    after: String,
    ghost: String,
    /// Visible completion candidates; `true` marks the selected one.
    candidates: Vec<(String, bool)>,
    cursor_col: u16,
}

impl View {
    fn of(prompt: &str, model: &InputModel) -> Self {
        let prompt = match model.mode() {
            InputMode::HistorySearch => {
                format!("(reverse-i-search)`{}': ", model.history_search().query())
            }
            _ => prompt.to_string(),
        };
        let buffer = model.buffer();
        let before = buffer.text_before_cursor();
        let after: String = buffer.runes()[buffer.pos()..].iter().collect();

        let completion = model.completion();
        let candidates = if completion.is_visible() {
            fit_candidates(completion.suggestions(), completion.selected(), model.width())
        } else {
            Vec::new()
        };

        let col = prompt.width() + before.width();
        let max_col = usize::from(model.width().saturating_sub(1));
        Self {
            cursor_col: u16::try_from(col.min(max_col)).unwrap_or(u16::MAX),
            prompt,
            before,
            after,
            ghost: model.ghost_text(),
            candidates,
        }
    }
}

/// Candidates that fit on one line of `width` columns, two spaces apart.
fn fit_candidates(items: &[String], selected: Option<usize>, width: u16) -> Vec<(String, bool)> {
    let width = usize::from(width);
    let mut used = 0;
    let mut out = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let w = item.width() + if out.is_empty() { 0 } else { 2 };
        if used + w > width {
            break;
        }
        used += w;
        out.push((item.clone(), selected == Some(i)));
    }
    out
}

fn draw(out: &mut impl Write, view: &View) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveToColumn(0),
        Clear(ClearType::FromCursorDown),
        Print(&view.prompt),
        Print(&view.before),
        Print(&view.after),
        SetAttribute(Attribute::Dim),
        Print(&view.ghost),
        SetAttribute(Attribute::Reset),
    )?;
    if !view.candidates.is_empty() {
        queue!(out, Print("\r\n"))?;
        for (i, (item, selected)) in view.candidates.iter().enumerate() {
            if i > 0 {
                queue!(out, Print("  "))?;
            }
            if *selected {
                queue!(out, SetAttribute(Attribute::Reverse), Print(item), SetAttribute(Attribute::Reset))?;
            } else {
                queue!(out, Print(item))?;
            }
        }
        queue!(out, cursor::MoveUp(1))?;
    }
    queue!(out, cursor::MoveToColumn(view.cursor_col))?;
    out.flush()
}

/// Redraw the finished line without ghost text and move below it.
fn finish_line(out: &mut impl Write, prompt: &str, value: &str, suffix: &str) -> io::Result<()> {
    queue!(
        out,
        cursor::MoveToColumn(0),
        Clear(ClearType::FromCursorDown),
        Print(prompt),
        Print(value),
        Print(suffix),
        Print("\r\n"),
    )
}
