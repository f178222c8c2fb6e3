//! Purpose: Render the probe report for one captured reply.
//! Exports: `render_report`, `RAW_PREVIEW_CHARS`.
//! Role: Pure formatter; the binary prints the returned string verbatim.
//! Invariants: Identical replies render to identical bytes.
//! Invariants: With color disabled, the decoded JSON section equals
//! Invariants: serde_json::to_string_pretty for the same value.

use serde_json::Value;

use crate::decode::{decode, DecodeOutcome};
use crate::request::ProbeReply;

/// Characters of the raw body shown before truncation.
pub const RAW_PREVIEW_CHARS: usize = 1000;

const INDENT: &str = "  ";

// 8/16-color palette only; bright variants lose contrast on some themes.
const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";
const COLOR_NUMBER: &str = "33";
const COLOR_BOOL: &str = "35";
const COLOR_NULL: &str = "39";
const COLOR_PUNCT: &str = "39";
const COLOR_SUCCESS: &str = "32";
const COLOR_FAILURE: &str = "31";

pub fn render_report(reply: &ProbeReply, use_color: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("Status Code: {}\n", reply.status));
    out.push_str(&format!(
        "Content-Type: {}\n",
        reply.content_type.as_deref().unwrap_or("N/A")
    ));
    out.push('\n');
    out.push_str(&format!("Raw Response (first {RAW_PREVIEW_CHARS} chars):\n"));
    for ch in reply.body.chars().take(RAW_PREVIEW_CHARS) {
        out.push(ch);
    }
    out.push('\n');
    out.push('\n');
    out.push_str(&format!(
        "... (Total length: {} chars)\n",
        reply.body.chars().count()
    ));
    out.push('\n');

    match decode(&reply.body) {
        DecodeOutcome::Decoded(value) => {
            push_label(&mut out, "✅ JSON parsing successful:", COLOR_SUCCESS, use_color);
            out.push('\n');
            JsonPainter {
                out: &mut out,
                color: use_color,
            }
            .value(&value, 0);
            out.push('\n');
        }
        DecodeOutcome::Failed(failure) => {
            push_label(&mut out, "❌ JSON parsing failed:", COLOR_FAILURE, use_color);
            out.push_str(&format!(" {}\n", failure.message));
            out.push_str(&format!("Error at position {}\n", failure.position));
            if let Some(context) = &failure.context {
                out.push_str(&format!("Context: {context}\n"));
            }
        }
    }

    out
}

fn push_label(out: &mut String, label: &str, color: &str, enabled: bool) {
    if !enabled {
        out.push_str(label);
        return;
    }
    out.push_str(&format!("\u{1b}[{color}m{label}\u{1b}[0m"));
}

struct JsonPainter<'a> {
    out: &'a mut String,
    color: bool,
}

impl JsonPainter<'_> {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.atom("null", COLOR_NULL),
            Value::Bool(true) => self.atom("true", COLOR_BOOL),
            Value::Bool(false) => self.atom("false", COLOR_BOOL),
            Value::Number(number) => {
                let text = number.to_string();
                self.atom(&text, COLOR_NUMBER);
            }
            Value::String(text) => self.quoted(text, COLOR_STRING),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.atom("[]", COLOR_PUNCT);
            return;
        }
        self.atom("[", COLOR_PUNCT);
        self.out.push('\n');
        for (index, item) in items.iter().enumerate() {
            self.indent(depth + 1);
            self.value(item, depth + 1);
            if index + 1 < items.len() {
                self.atom(",", COLOR_PUNCT);
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.atom("]", COLOR_PUNCT);
    }

    fn object(&mut self, map: &serde_json::Map<String, Value>, depth: usize) {
        if map.is_empty() {
            self.atom("{}", COLOR_PUNCT);
            return;
        }
        self.atom("{", COLOR_PUNCT);
        self.out.push('\n');
        let len = map.len();
        for (index, (key, value)) in map.iter().enumerate() {
            self.indent(depth + 1);
            self.quoted(key, COLOR_KEY);
            self.atom(":", COLOR_PUNCT);
            self.out.push(' ');
            self.value(value, depth + 1);
            if index + 1 < len {
                self.atom(",", COLOR_PUNCT);
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.atom("}", COLOR_PUNCT);
    }

    fn quoted(&mut self, text: &str, color: &str) {
        let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
        self.atom(&encoded, color);
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn atom(&mut self, text: &str, color: &str) {
        push_label(self.out, text, color, self.color);
    }
}
