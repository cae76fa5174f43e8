//! Key → [`Action`] table.
//!
//! The map is stored twice: per action (what the user configures) and as a
//! reverse index from key to action (what the dispatcher queries on every
//! keystroke).  Every mutation rebuilds the reverse index.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use wisp_config::KeysConfig;

use crate::error::InputError;

/// Every abstract intent the line editor understands, independent of key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Unmapped key; printable characters are inserted literally.
    None,

    // Navigation
    CharacterForward,
    CharacterBackward,
    WordForward,
    WordBackward,
    LineStart,
    LineEnd,

    // Deletion
    DeleteCharacterBackward,
    DeleteCharacterForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteBeforeCursor,
    DeleteAfterCursor,

    // Prediction / completion
    AcceptPrediction,
    Complete,
    CompleteBackward,

    // History
    HistoryPrevious,
    HistoryNext,
    HistorySearchBackward,

    // Special
    Cancel,
    Submit,
    Interrupt,
    EndOfFile,
}

impl Action {
    pub const ALL: [Action; 23] = [
        Action::None,
        Action::CharacterForward,
        Action::CharacterBackward,
        Action::WordForward,
        Action::WordBackward,
        Action::LineStart,
        Action::LineEnd,
        Action::DeleteCharacterBackward,
        Action::DeleteCharacterForward,
        Action::DeleteWordBackward,
        Action::DeleteWordForward,
        Action::DeleteBeforeCursor,
        Action::DeleteAfterCursor,
        Action::AcceptPrediction,
        Action::Complete,
        Action::CompleteBackward,
        Action::HistoryPrevious,
        Action::HistoryNext,
        Action::HistorySearchBackward,
        Action::Cancel,
        Action::Submit,
        Action::Interrupt,
        Action::EndOfFile,
    ];

    /// Name used in config files.
    pub fn name(self) -> &'static str {
        match self {
            Action::None                    => "none",
            Action::CharacterForward        => "character_forward",
            Action::CharacterBackward       => "character_backward",
            Action::WordForward             => "word_forward",
            Action::WordBackward            => "word_backward",
            Action::LineStart               => "line_start",
            Action::LineEnd                 => "line_end",
            Action::DeleteCharacterBackward => "delete_character_backward",
            Action::DeleteCharacterForward  => "delete_character_forward",
            Action::DeleteWordBackward      => "delete_word_backward",
            Action::DeleteWordForward       => "delete_word_forward",
            Action::DeleteBeforeCursor      => "delete_before_cursor",
            Action::DeleteAfterCursor       => "delete_after_cursor",
            Action::AcceptPrediction        => "accept_prediction",
            Action::Complete                => "complete",
            Action::CompleteBackward        => "complete_backward",
            Action::HistoryPrevious         => "history_previous",
            Action::HistoryNext             => "history_next",
            Action::HistorySearchBackward   => "history_search_backward",
            Action::Cancel                  => "cancel",
            Action::Submit                  => "submit",
            Action::Interrupt               => "interrupt",
            Action::EndOfFile               => "end_of_file",
        }
    }

    /// Pure cursor movement; these end a history search and are then replayed.
    pub fn is_cursor_motion(self) -> bool {
        matches!(
            self,
            Action::CharacterForward
                | Action::CharacterBackward
                | Action::WordForward
                | Action::WordBackward
                | Action::LineStart
                | Action::LineEnd
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Action::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| InputError::UnknownAction(s.to_string()))
    }
}

// ── Key bindings ──────────────────────────────────────────────────────────────

/// A physical key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }.normalized()
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn alt(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }

    /// Shift is folded into the character (`'A'`) and into `BackTab`, so
    /// `shift+b`, `B` and a terminal's `B` with the SHIFT bit all hit the
    /// same entry.
    fn normalized(mut self) -> Self {
        if let KeyCode::Char(c) = self.code {
            if self.modifiers.contains(KeyModifiers::SHIFT) {
                self.code = KeyCode::Char(upper(c));
                self.modifiers.remove(KeyModifiers::SHIFT);
            }
        }
        if self.code == KeyCode::BackTab {
            self.modifiers.remove(KeyModifiers::SHIFT);
        }
        if self.code == KeyCode::Tab && self.modifiers.contains(KeyModifiers::SHIFT) {
            self.code = KeyCode::BackTab;
            self.modifiers.remove(KeyModifiers::SHIFT);
        }
        self
    }

    /// Parse a binding such as `"ctrl+a"`, `"alt+backspace"`, `"shift+tab"`,
    /// `"f5"` or `"x"`.
    pub fn parse(spec: &str) -> Result<Self, InputError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(InputError::invalid_key(spec, "empty"));
        }
        // A lone "+" is the plus key, not a separator.
        let (mods_part, key_part) = match trimmed.rsplit_once('+') {
            Some((m, "")) => (m.strip_suffix('+').unwrap_or(m), "+"),
            Some((m, k)) => (m, k),
            None => ("", trimmed),
        };

        let mut modifiers = KeyModifiers::NONE;
        for m in mods_part.split('+').filter(|m| !m.is_empty()) {
            match m.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "c" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "meta" | "m" => modifiers |= KeyModifiers::ALT,
                "shift" | "s" => modifiers |= KeyModifiers::SHIFT,
                other => {
                    return Err(InputError::invalid_key(spec, format!("unknown modifier '{other}'")))
                }
            }
        }

        let code = parse_key_code(key_part)
            .ok_or_else(|| InputError::invalid_key(spec, format!("unknown key '{key_part}'")))?;
        Ok(Self::new(code, modifiers))
    }
}

/// Single-character uppercase; characters whose uppercase form is longer
/// (`'ß'`) are kept as they are.
fn upper(c: char) -> char {
    let mut up = c.to_uppercase();
    match (up.next(), up.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn parse_key_code(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape"   => KeyCode::Esc,
        "tab"              => KeyCode::Tab,
        "backtab"          => KeyCode::BackTab,
        "backspace" | "bs" => KeyCode::Backspace,
        "delete" | "del"   => KeyCode::Delete,
        "insert" | "ins"   => KeyCode::Insert,
        "up"               => KeyCode::Up,
        "down"             => KeyCode::Down,
        "left"             => KeyCode::Left,
        "right"            => KeyCode::Right,
        "home"             => KeyCode::Home,
        "end"              => KeyCode::End,
        "pageup"           => KeyCode::PageUp,
        "pagedown"         => KeyCode::PageDown,
        "space"            => KeyCode::Char(' '),
        _ => {
            let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(c)   => write!(f, "{c}"),
            KeyCode::Enter     => f.write_str("enter"),
            KeyCode::Esc       => f.write_str("esc"),
            KeyCode::Tab       => f.write_str("tab"),
            KeyCode::BackTab   => f.write_str("shift+tab"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Delete    => f.write_str("delete"),
            KeyCode::Insert    => f.write_str("insert"),
            KeyCode::Up        => f.write_str("up"),
            KeyCode::Down      => f.write_str("down"),
            KeyCode::Left      => f.write_str("left"),
            KeyCode::Right     => f.write_str("right"),
            KeyCode::Home      => f.write_str("home"),
            KeyCode::End       => f.write_str("end"),
            KeyCode::PageUp    => f.write_str("pageup"),
            KeyCode::PageDown  => f.write_str("pagedown"),
            KeyCode::F(n)      => write!(f, "f{n}"),
            other              => write!(f, "{other:?}"),
        }
    }
}

// ── Key map ───────────────────────────────────────────────────────────────────

/// Bidirectional action/key table.  `Clone` yields a fully independent map.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<Action, Vec<KeyBinding>>,
    lookup: HashMap<KeyBinding, Action>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::emacs()
    }
}

impl KeyMap {
    /// Build a map from explicit bindings.  If a key appears under several
    /// actions the last one wins.
    pub fn new(bindings: impl IntoIterator<Item = (Action, Vec<KeyBinding>)>) -> Self {
        let mut map = Self { bindings: HashMap::new(), lookup: HashMap::new() };
        for (action, keys) in bindings {
            map.set_binding(action, keys);
        }
        map
    }

    /// Readline/Emacs-style defaults.
    pub fn emacs() -> Self {
        use KeyCode::*;
        let p = KeyBinding::plain;
        let ctrl = KeyBinding::ctrl;
        let alt = KeyBinding::alt;
        let ctrl_code = |code| KeyBinding::new(code, KeyModifiers::CONTROL);
        let alt_code = |code| KeyBinding::new(code, KeyModifiers::ALT);

        Self::new([
            (Action::CharacterForward,        vec![p(Right), ctrl('f')]),
            (Action::CharacterBackward,       vec![p(Left), ctrl('b')]),
            (Action::WordForward,             vec![alt('f'), ctrl_code(Right), alt_code(Right)]),
            (Action::WordBackward,            vec![alt('b'), ctrl_code(Left), alt_code(Left)]),
            (Action::LineStart,               vec![p(Home), ctrl('a')]),
            (Action::LineEnd,                 vec![p(End), ctrl('e')]),
            (Action::DeleteCharacterBackward, vec![p(Backspace), ctrl('h')]),
            (Action::DeleteCharacterForward,  vec![p(Delete)]),
            (Action::DeleteWordBackward,      vec![ctrl('w'), alt_code(Backspace)]),
            (Action::DeleteWordForward,       vec![alt('d'), alt_code(Delete)]),
            (Action::DeleteBeforeCursor,      vec![ctrl('u')]),
            (Action::DeleteAfterCursor,       vec![ctrl('k')]),
            (Action::AcceptPrediction,        vec![]),
            (Action::Complete,                vec![p(Tab)]),
            (Action::CompleteBackward,        vec![p(BackTab)]),
            (Action::HistoryPrevious,         vec![p(Up), ctrl('p')]),
            (Action::HistoryNext,             vec![p(Down), ctrl('n')]),
            (Action::HistorySearchBackward,   vec![ctrl('r')]),
            (Action::Cancel,                  vec![p(Esc), ctrl('g')]),
            (Action::Submit,                  vec![p(Enter), ctrl('m'), ctrl('j')]),
            (Action::Interrupt,               vec![ctrl('c')]),
            (Action::EndOfFile,               vec![ctrl('d')]),
        ])
    }

    /// Emacs defaults with the configured per-action overrides applied.
    pub fn from_config(config: &KeysConfig) -> Result<Self, InputError> {
        let mut map = Self::emacs();
        for (name, specs) in &config.bindings {
            let action: Action = name.parse()?;
            let keys = specs
                .iter()
                .map(|s| KeyBinding::parse(s))
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(action = %action, keys = keys.len(), "rebinding action");
            map.set_binding(action, keys);
        }
        Ok(map)
    }

    /// Action bound to this key event; [`Action::None`] when unmapped.
    pub fn lookup(&self, event: &KeyEvent) -> Action {
        self.lookup_binding(&KeyBinding::from_event(event))
    }

    pub fn lookup_binding(&self, key: &KeyBinding) -> Action {
        self.lookup.get(key).copied().unwrap_or(Action::None)
    }

    pub fn keys_for(&self, action: Action) -> &[KeyBinding] {
        self.bindings.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace every key of `action` with `keys`.  Keys taken from other
    /// actions are removed there so each key maps to exactly one action.
    pub fn set_binding(&mut self, action: Action, keys: Vec<KeyBinding>) {
        if action == Action::None {
            return;
        }
        self.detach(&keys);
        let mut deduped: Vec<KeyBinding> = Vec::with_capacity(keys.len());
        for k in keys {
            if !deduped.contains(&k) {
                deduped.push(k);
            }
        }
        self.bindings.insert(action, deduped);
        self.rebuild_lookup();
    }

    /// Bind additional keys to `action`, keeping the existing ones.
    pub fn add_keys(&mut self, action: Action, keys: &[KeyBinding]) {
        if action == Action::None {
            return;
        }
        let mut merged = self.keys_for(action).to_vec();
        merged.extend_from_slice(keys);
        self.set_binding(action, merged);
    }

    /// Unbind `keys` from whichever actions hold them.
    pub fn remove_keys(&mut self, keys: &[KeyBinding]) {
        self.detach(keys);
        self.rebuild_lookup();
    }

    /// Drop every key of `action`.
    pub fn remove_binding(&mut self, action: Action) {
        self.bindings.remove(&action);
        self.rebuild_lookup();
    }

    fn detach(&mut self, keys: &[KeyBinding]) {
        for bound in self.bindings.values_mut() {
            bound.retain(|k| !keys.contains(k));
        }
    }

    fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for (action, keys) in &self.bindings {
            for key in keys {
                self.lookup.insert(*key, *action);
            }
        }
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
