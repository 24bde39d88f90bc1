//! Line editing for the raw-mode console.
//!
//! This module owns the partially typed line (buffer, cursor, history) and
//! turns key presses into edits. It knows nothing about the terminal, so the
//! console driver can redraw from [`InputState::buffer`] and
//! [`InputState::cursor`] whenever a log line interrupts typing.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key presses the line editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Delete key.
    Delete,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow, previous history entry.
    Up,
    /// Down arrow, next history entry.
    Down,
    /// Home key.
    Home,
    /// End key.
    End,
    /// Ctrl-U.
    KillLine,
    /// Ctrl-C.
    Interrupt,
    /// Ctrl-D.
    EndOfInput,
}

impl KeyInput {
    /// Convert a crossterm key event.
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(Self::Interrupt),
                KeyCode::Char('d') => Some(Self::EndOfInput),
                KeyCode::Char('u') => Some(Self::KillLine),
                KeyCode::Char('a') => Some(Self::Home),
                KeyCode::Char('e') => Some(Self::End),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Delete => Some(Self::Delete),
            KeyCode::Left => Some(Self::Left),
            KeyCode::Right => Some(Self::Right),
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Home => Some(Self::Home),
            KeyCode::End => Some(Self::End),
            _ => None,
        }
    }
}

/// What a key press did to the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Nothing visible changed.
    Unchanged,
    /// The buffer or cursor changed and the prompt needs a redraw.
    Changed,
    /// The user submitted a line.
    Submit(String),
    /// The user pressed Ctrl-C.
    Interrupt,
    /// The user pressed Ctrl-D on an empty line.
    EndOfInput,
}

/// Input state for the console.
///
/// The cursor counts characters, not bytes, so multi-byte input never splits.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    /// Index into `history` while browsing it.
    recalled: Option<usize>,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyInput) -> Edit {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                Edit::Changed
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return Edit::Unchanged;
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                Edit::Changed
            },
            KeyInput::Delete => {
                if self.cursor >= self.len() {
                    return Edit::Unchanged;
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                Edit::Changed
            },
            KeyInput::Left => self.move_to(self.cursor.saturating_sub(1)),
            KeyInput::Right => self.move_to(self.cursor.saturating_add(1).min(self.len())),
            KeyInput::Home => self.move_to(0),
            KeyInput::End => self.move_to(self.len()),
            KeyInput::KillLine => {
                if self.buffer.is_empty() {
                    return Edit::Unchanged;
                }
                self.buffer.clear();
                self.cursor = 0;
                Edit::Changed
            },
            KeyInput::Up => self.recall_previous(),
            KeyInput::Down => self.recall_next(),
            KeyInput::Enter => self.submit(),
            KeyInput::Interrupt => Edit::Interrupt,
            KeyInput::EndOfInput if self.buffer.is_empty() => Edit::EndOfInput,
            KeyInput::EndOfInput => Edit::Unchanged,
        }
    }

    fn submit(&mut self) -> Edit {
        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.recalled = None;

        if !text.trim().is_empty() && self.history.last() != Some(&text) {
            self.history.push(text.clone());
        }
        Edit::Submit(text)
    }

    fn recall_previous(&mut self) -> Edit {
        let index = match self.recalled {
            Some(0) => return Edit::Unchanged,
            Some(index) => index - 1,
            None if self.history.is_empty() => return Edit::Unchanged,
            None => self.history.len() - 1,
        };
        self.recall(Some(index))
    }

    fn recall_next(&mut self) -> Edit {
        match self.recalled {
            None => Edit::Unchanged,
            Some(index) if index + 1 < self.history.len() => self.recall(Some(index + 1)),
            Some(_) => self.recall(None),
        }
    }

    fn recall(&mut self, index: Option<usize>) -> Edit {
        self.recalled = index;
        self.buffer = index.and_then(|i| self.history.get(i)).cloned().unwrap_or_default();
        self.cursor = self.len();
        Edit::Changed
    }

    fn move_to(&mut self, cursor: usize) -> Edit {
        if cursor == self.cursor {
            return Edit::Unchanged;
        }
        self.cursor = cursor;
        Edit::Changed
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(at, _)| at)
    }
}
