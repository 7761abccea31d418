//! Prompt templates with named `{placeholder}` slots.
//!
//! `{{` and `}}` render as literal braces. Every placeholder must be bound
//! at render time; unused bindings are ignored.

use std::collections::HashMap;
use crate::error::PromptError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template string.
    pub fn parse(template: impl Into<String>) -> Result<Self, PromptError> {
        let source = template.into();
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(PromptError::Unterminated(i));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Var(name.trim().to_string()));
                }
                _ => text.push(c),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { source, segments })
    }

    /// The original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if let Segment::Var(name) = seg
                && !seen.contains(&name.as_str())
            {
                seen.push(name);
            }
        }
        seen
    }

    /// Substitute every placeholder from `values`.
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String, PromptError> {
        let mut out = String::with_capacity(self.source.len());
        for seg in &self.segments {
            match seg {
                Segment::Text(t) => out.push_str(t),
                Segment::Var(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| PromptError::Unresolved(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }

    /// Convenience form of [`render`](Self::render) over `(name, value)` pairs.
    pub fn render_pairs(&self, pairs: &[(&str, &str)]) -> Result<String, PromptError> {
        let values: HashMap<&str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect();
        self.render(&values)
    }
}
