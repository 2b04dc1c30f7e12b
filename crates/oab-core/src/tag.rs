//! Parsers for per-field declarative metadata strings.
//!
//! Two tag shapes exist: the wire tag (`"name,omitempty"`, `"-"`) naming a
//! field on the wire, and the schema annotation
//! (`"minimum=1,maximum=10,pattern=^[a-z]+$"`) carrying constraints and
//! metadata. Both are parsed into plain data here; interpretation happens in
//! [`crate::constraint`].

use indexmap::IndexMap;

/// Ordered key/value options parsed from a schema annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions(IndexMap<String, String>);

impl TagOptions {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Parse `key=value` pairs separated by commas. A bare key is a boolean flag
/// and parses as `"true"`. `\,` yields a literal comma inside a value.
pub fn parse_options(input: &str) -> TagOptions {
    let mut options = TagOptions::default();
    for segment in split_unescaped(input) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if !key.is_empty() {
                    options.insert(key, value.trim());
                }
            }
            None => options.insert(segment, "true"),
        }
    }
    options
}

/// Wire-level naming of a record field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireTag {
    pub name: Option<String>,
    pub omit_empty: bool,
    pub skip: bool,
}

/// Parse a wire tag: `"name"`, `"name,omitempty"`, `",omitempty"` or `"-"`.
pub fn parse_wire_tag(input: &str) -> WireTag {
    let input = input.trim();
    if input == "-" {
        return WireTag {
            skip: true,
            ..WireTag::default()
        };
    }

    let mut parts = input.split(',');
    let name = parts
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    let omit_empty = parts.any(|flag| flag.trim() == "omitempty");

    WireTag {
        name,
        omit_empty,
        skip: false,
    }
}

fn split_unescaped(input: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&',') => {
                current.push(',');
                chars.next();
            }
            ',' => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);
    segments
}
