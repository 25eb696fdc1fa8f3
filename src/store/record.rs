//! Flat `key=value` text records, one per entity directory.
//!
//! The format follows the classic `.properties` layout: `#` or `!` start a
//! comment line, the first unescaped `=` or `:` separates key from value,
//! and `\`, newlines, tabs and separators inside keys/values are escaped.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::app::{Result, ShelfError};

/// Separator used for list-valued fields (`a|b|c`).
pub const LIST_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    entries: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value of a required field, or the name of the missing key.
    pub fn require(&self, key: &str) -> std::result::Result<&str, String> {
        self.get(key)
            .ok_or_else(|| format!("missing required field `{}`", key))
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key).map(split_list).unwrap_or_default()
    }

    pub fn set_list<S: AsRef<str>>(&mut self, key: &str, values: &[S]) {
        self.set(key, join_list(values));
    }

    pub fn parse(text: &str) -> Self {
        let mut record = Self::new();
        let mut lines = text.lines();

        while let Some(line) = lines.next() {
            let mut logical = line.trim_start().to_string();
            if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
                continue;
            }
            // A trailing odd backslash continues the entry on the next line.
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            record.entries.insert(unescape(key), unescape(value));
        }

        record
    }

    pub fn render(&self, comment: &str) -> String {
        let mut out = String::new();
        if !comment.is_empty() {
            out.push_str("# ");
            out.push_str(comment);
            out.push('\n');
        }
        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    /// Read and parse a record. A file that exists but is not valid UTF-8
    /// is reported as cache corruption rather than an I/O failure.
    pub fn read(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ShelfError::corrupt(path, "record is not valid UTF-8"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::parse(&text))
    }

    /// Write the record next to `path` and rename it into place so a crash
    /// never leaves a half-written file behind.
    pub fn write(&self, path: &Path, comment: &str) -> Result<()> {
        let tmp = path.with_extension("props.part");
        fs::write(&tmp, self.render(comment))?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(LIST_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn join_list<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (line[..i].trim_end(), line[i + 1..].trim_start()),
            _ => {}
        }
    }
    (line.trim_end(), "")
}

fn escape(s: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
