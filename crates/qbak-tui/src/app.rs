use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use qbak_core::config::validate_retention;
use qbak_core::BackupConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Key,
    Paths,
    Retention,
    Destination,
    Save,
    Cancel,
}

impl Focus {
    pub const ALL: &[Focus] = &[
        Focus::Key,
        Focus::Paths,
        Focus::Retention,
        Focus::Destination,
        Focus::Save,
        Focus::Cancel,
    ];

    pub const FIELDS: &[Focus] = &[Focus::Key, Focus::Paths, Focus::Retention, Focus::Destination];

    pub fn title(&self) -> &str {
        match self {
            Focus::Key => "Key",
            Focus::Paths => "Paths (comma separated)",
            Focus::Retention => "Backups kept (-1 keeps all)",
            Focus::Destination => "Destination",
            Focus::Save => "Save",
            Focus::Cancel => "Cancel",
        }
    }

    pub fn next(&self) -> Focus {
        match self {
            Focus::Key => Focus::Paths,
            Focus::Paths => Focus::Retention,
            Focus::Retention => Focus::Destination,
            Focus::Destination => Focus::Save,
            Focus::Save => Focus::Cancel,
            Focus::Cancel => Focus::Key,
        }
    }

    pub fn prev(&self) -> Focus {
        match self {
            Focus::Key => Focus::Cancel,
            Focus::Paths => Focus::Key,
            Focus::Retention => Focus::Paths,
            Focus::Destination => Focus::Retention,
            Focus::Save => Focus::Destination,
            Focus::Cancel => Focus::Save,
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self, Focus::Save | Focus::Cancel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Saved,
    Cancelled,
}

/// Single-line text input. `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    text: String,
    cursor: usize,
}

impl Input {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

// ── normalization ────────────────────────────────────────────────────────────

/// Strip surrounding whitespace and quotes from a pasted key.
pub fn clear_key(key: &str) -> String {
    key.trim().trim_matches('"').trim_matches('\'').to_string()
}

/// Remove every quote from a single path.
pub fn clear_path(path: &str) -> String {
    path.replace('\'', "\"").replace('"', "")
}

/// Split the paths field into unique, non-empty paths in input order.
///
/// Items may be separated by commas or written as `"a" "b"`.
pub fn split_paths(paths: &str) -> Vec<String> {
    let joined = paths.replace('\'', "\"").replace("\" \"", "\",\"");
    let mut out: Vec<String> = Vec::new();
    for item in clear_path(&joined).split(',') {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|p| p == item) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

/// Display form of a path list: `"a", "b"`.
pub fn quote_paths(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse the retention field. Accepts positive counts and -1.
pub fn parse_retention(text: &str) -> Result<i64, String> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| format!("retention {:?} is not a number", text.trim()))?;
    validate_retention(value).map_err(|e| e.to_string())?;
    Ok(value)
}

// ── form state ───────────────────────────────────────────────────────────────

pub struct App {
    pub focus: Focus,
    pub key: Input,
    pub paths: Input,
    pub retention: Input,
    pub destination: Input,
    pub error: Option<String>,
    pub outcome: Option<Outcome>,
}

impl App {
    pub fn new(config: &BackupConfig) -> Self {
        Self {
            focus: Focus::Key,
            key: Input::new(config.key.clone()),
            paths: Input::new(quote_paths(&config.paths)),
            retention: Input::new(config.retention.to_string()),
            destination: Input::new(format!("\"{}\"", config.destination.display())),
            error: None,
            outcome: None,
        }
    }

    pub fn input(&self, focus: Focus) -> Option<&Input> {
        match focus {
            Focus::Key => Some(&self.key),
            Focus::Paths => Some(&self.paths),
            Focus::Retention => Some(&self.retention),
            Focus::Destination => Some(&self.destination),
            Focus::Save | Focus::Cancel => None,
        }
    }

    fn input_mut(&mut self, focus: Focus) -> Option<&mut Input> {
        match focus {
            Focus::Key => Some(&mut self.key),
            Focus::Paths => Some(&mut self.paths),
            Focus::Retention => Some(&mut self.retention),
            Focus::Destination => Some(&mut self.destination),
            Focus::Save | Focus::Cancel => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('c') => self.outcome = Some(Outcome::Cancelled),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.outcome = Some(Outcome::Cancelled),
            KeyCode::Tab | KeyCode::Down => self.move_focus(self.focus.next()),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(self.focus.prev()),
            KeyCode::Enter => match self.focus {
                Focus::Save => self.save(),
                Focus::Cancel => self.outcome = Some(Outcome::Cancelled),
                other => self.move_focus(other.next()),
            },
            code => self.edit(code),
        }
    }

    /// Bracketed paste goes into the focused field, newlines dropped.
    pub fn handle_paste(&mut self, text: &str) {
        let focus = self.focus;
        for c in text.chars().filter(|c| !c.is_control()) {
            if focus == Focus::Retention && !retention_char(c) {
                continue;
            }
            if let Some(input) = self.input_mut(focus) {
                input.insert(c);
            }
        }
    }

    fn edit(&mut self, code: KeyCode) {
        let focus = self.focus;
        let Some(input) = self.input_mut(focus) else {
            return;
        };
        match code {
            KeyCode::Char(c) if focus != Focus::Retention || retention_char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.left(),
            KeyCode::Right => input.right(),
            KeyCode::Home => input.home(),
            KeyCode::End => input.end(),
            _ => {}
        }
    }

    fn move_focus(&mut self, to: Focus) {
        self.blur(self.focus);
        self.focus = to;
    }

    /// Normalize a field when it loses focus.
    fn blur(&mut self, focus: Focus) {
        match focus {
            Focus::Key => {
                let cleaned = clear_key(self.key.text());
                self.key.set(cleaned);
            }
            Focus::Paths => {
                let cleaned = quote_paths(&split_paths(self.paths.text()));
                self.paths.set(cleaned);
            }
            Focus::Retention => match parse_retention(self.retention.text()) {
                Ok(n) => {
                    self.retention.set(n.to_string());
                    self.error = None;
                }
                Err(e) => self.error = Some(e),
            },
            Focus::Destination => {
                let cleaned = format!("\"{}\"", clear_path(self.destination.text()).trim());
                self.destination.set(cleaned);
            }
            Focus::Save | Focus::Cancel => {}
        }
    }

    fn save(&mut self) {
        for field in Focus::FIELDS {
            self.blur(*field);
        }
        match parse_retention(self.retention.text()) {
            Ok(_) => {
                self.error = None;
                self.outcome = Some(Outcome::Saved);
            }
            Err(e) => {
                self.error = Some(e);
                self.focus = Focus::Retention;
            }
        }
    }

    /// Copy the form into `config`. Only meaningful after [`Outcome::Saved`].
    pub fn apply(&self, config: &mut BackupConfig) -> Result<(), String> {
        config.retention = parse_retention(self.retention.text())?;
        config.key = clear_key(self.key.text());
        config.paths = split_paths(self.paths.text());
        config.destination = clear_path(self.destination.text()).trim().into();
        Ok(())
    }
}

fn retention_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}
