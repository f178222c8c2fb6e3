//! Purpose: Interpret a captured reply body as JSON and localize failures.
//! Exports: `DecodeOutcome`, `DecodeFailure`, `decode`, `CONTEXT_RADIUS`.
//! Role: Maps serde_json's line/column reports onto character positions in the
//! Role: body, plus a surrounding context window for the report.
//! Invariants: Positions and window bounds count characters, not bytes.
//! Invariants: A misspelled or truncated literal (`truu`, `nul`) is reported at
//! Invariants: the start of the token, not wherever the match fell apart.

use serde_json::Value;

/// Characters shown on each side of a failure position.
pub const CONTEXT_RADIUS: usize = 50;

#[derive(Clone, Debug, PartialEq)]
pub enum DecodeOutcome {
    Decoded(Value),
    Failed(DecodeFailure),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeFailure {
    pub message: String,
    pub position: usize,
    pub context: Option<String>,
}

pub fn decode(body: &str) -> DecodeOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => DecodeOutcome::Decoded(value),
        Err(err) => DecodeOutcome::Failed(locate_failure(body, &err)),
    }
}

fn locate_failure(body: &str, err: &serde_json::Error) -> DecodeFailure {
    let mut at = byte_offset(body, err);
    if err.is_eof() || failed_inside_literal(err) {
        at = rewind_to_token_start(body, at);
    }
    DecodeFailure {
        message: err.to_string(),
        position: body[..at].chars().count(),
        context: context_window(body, at),
    }
}

/// Translate serde_json's line/column report into a byte offset.
///
/// Columns are 1-based for errors that point at a character. End-of-input
/// errors instead report how many bytes of the final line were consumed, so
/// their column is already the offset within that line.
fn byte_offset(body: &str, err: &serde_json::Error) -> usize {
    let in_line = if err.is_eof() {
        err.column()
    } else {
        err.column().saturating_sub(1)
    };
    let mut offset = 0usize;
    for (index, text) in body.split('\n').enumerate() {
        if index + 1 >= err.line() {
            offset += in_line.min(text.len());
            break;
        }
        offset += text.len() + 1;
    }
    floor_char_boundary(body, offset)
}

/// serde_json points at the character where a literal stopped matching, while
/// the useful position is the start of the token (`truu` should report the
/// `t`, not the second `u`).
fn failed_inside_literal(err: &serde_json::Error) -> bool {
    err.is_syntax() && err.to_string().contains("expected ident")
}

/// Walk back over the ASCII letters of a half-matched literal so `truu` and a
/// body cut off mid-literal (`nul`) both report the token start. Positions not
/// preceded by a letter come back unchanged.
fn rewind_to_token_start(body: &str, from: usize) -> usize {
    let mut at = floor_char_boundary(body, from);
    while at > 0 {
        match body[..at].chars().next_back() {
            Some(ch) if ch.is_ascii_alphabetic() => at -= ch.len_utf8(),
            _ => break,
        }
    }
    at
}

/// Up to `CONTEXT_RADIUS` characters on each side of the failure, or nothing
/// when the position is at or past the end of the body.
fn context_window(body: &str, at: usize) -> Option<String> {
    if at >= body.len() {
        return None;
    }
    let start = step_back(body, at, CONTEXT_RADIUS);
    let end = step_forward(body, at, CONTEXT_RADIUS);
    Some(body[start..end].to_string())
}

fn step_back(body: &str, from: usize, chars: usize) -> usize {
    let mut at = floor_char_boundary(body, from);
    for _ in 0..chars {
        match body[..at].chars().next_back() {
            Some(ch) => at -= ch.len_utf8(),
            None => break,
        }
    }
    at
}

fn step_forward(body: &str, from: usize, chars: usize) -> usize {
    let mut at = floor_char_boundary(body, from);
    for ch in body[at..].chars().take(chars) {
        at += ch.len_utf8();
    }
    at
}

fn floor_char_boundary(body: &str, index: usize) -> usize {
    let mut index = index.min(body.len());
    while index > 0 && !body.is_char_boundary(index) {
        index -= 1;
    }
    index
}
