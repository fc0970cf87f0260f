//! The line format understood by Argos.
//!
//! Each line is `<body> | <key>=<value> <key>=<value> ...`, a line consisting of `---`
//! separates the panel button from the dropdown. Only the keys in [`Key`] are emitted.

use std::fmt::{self, Display};

use strum::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum Key {
    IconName,
    Color,
    UseMarkup,
    Unescape,
    Font,
    Image,
    ImageWidth,
    Bash,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Int(u32),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Argos splits properties on whitespace unless the value is quoted
            Value::Text(text) if text.contains(' ') => write!(f, "'{text}'"),
            Value::Text(text) => f.write_str(text),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    body: String,
    properties: Vec<(Key, Value)>,
}

impl Line {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into(), properties: Vec::new() }
    }

    /// Properties are written in the order they were added. Setting a key twice
    /// replaces the earlier value in place.
    pub fn with(mut self, key: Key, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((key, value)),
        }
        self
    }

    pub fn icon(self, name: &str) -> Self {
        self.with(Key::IconName, name)
    }

    pub fn markup(self, enabled: bool) -> Self {
        self.with(Key::UseMarkup, enabled)
    }

    pub fn bash(self, command: impl Into<String>) -> Self {
        self.with(Key::Bash, command.into()).with(Key::Terminal, false)
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)?;
        if self.properties.is_empty() {
            return Ok(());
        }

        f.write_str(" |")?;
        for (key, value) in &self.properties {
            let key: &'static str = key.into();
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Line(Line),
    Separator,
}

/// A complete plugin output, one [`Item`] per printed line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Menu {
    items: Vec<Item>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: Line) -> &mut Self {
        self.items.push(Item::Line(line));
        self
    }

    pub fn separator(&mut self) -> &mut Self {
        self.items.push(Item::Separator);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.items.iter().map(ToString::to_string).collect()
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Line(line) => Display::fmt(line, f),
            Item::Separator => f.write_str("---"),
        }
    }
}

impl Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Argos reads one entry per line, so multi-line text has to travel as literal `\n`
/// and be unescaped on the other side (`unescape=true`).
pub fn escape_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\\n")
}
