//! Quote-aware scanning over JSON-ish text.
//!
//! Model output is not valid JSON by the time it reaches these helpers, so
//! they work on raw bytes and track only what matters: whether the cursor is
//! inside a string literal and whether the previous byte was an escaping
//! backslash. Every structural byte (`{`, `}`, `"`, `\`) is ASCII, so byte
//! offsets always land on UTF-8 character boundaries.

/// Lexical state of a single left-to-right pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Lexer {
    in_string: bool,
    escaped: bool,
}

impl Lexer {
    /// Advances over `byte`. Returns true if the byte is structural, i.e.
    /// outside a string literal.
    fn step(&mut self, byte: u8) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
            }
            false
        } else {
            if byte == b'"' {
                self.in_string = true;
                return false;
            }
            true
        }
    }
}

/// Byte index of the `}` that closes the `{` at `open`, ignoring braces
/// inside string literals.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut lexer = Lexer::default();
    let mut depth = 0usize;
    for (i, &byte) in bytes.iter().enumerate().skip(open) {
        if !lexer.step(byte) {
            continue;
        }
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True for `{ {...} }`: an object whose only content is another brace pair.
pub fn is_double_wrapped(text: &str) -> bool {
    let text = text.trim();
    if text.len() < 4 || !text.starts_with('{') || !text.ends_with('}') {
        return false;
    }
    let inner = text[1..text.len() - 1].trim();
    inner.starts_with('{') && inner.ends_with('}')
}

/// Removes one redundant outer brace pair.
///
/// The inner object is the second `{` together with its matching `}`. If the
/// braces do not balance, exactly one outer pair is stripped instead.
pub fn unwrap_double_wrap(text: &str) -> String {
    let text = text.trim();
    if !is_double_wrapped(text) {
        return text.to_string();
    }

    let second_open = text[1..].find('{').map(|i| i + 1);
    match second_open.and_then(|open| matching_brace(text, open).map(|close| (open, close))) {
        Some((open, close)) => text[open..=close].to_string(),
        None => text[1..text.len() - 1].trim().to_string(),
    }
}

/// Doubles every backslash inside a string literal that does not start a
/// valid escape (`\n \r \t \" \\ \/` or `\uXXXX`).
///
/// LaTeX and Windows paths in model answers (`\alpha`, `C:\data`) are the
/// usual offenders.
pub fn fix_invalid_escapes(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut i = 0;
    let mut copied = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                in_string = !in_string;
                i += 1;
            }
            b'\\' if in_string => {
                let escape_len = valid_escape_len(&bytes[i + 1..]);
                if escape_len > 0 {
                    i += 1 + escape_len;
                } else {
                    out.push_str(&text[copied..i]);
                    out.push('\\');
                    copied = i;
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Length of the escape body after a backslash, or 0 if it is not valid.
fn valid_escape_len(rest: &[u8]) -> usize {
    match rest.first() {
        Some(b'n' | b'r' | b't' | b'"' | b'\\' | b'/') => 1,
        Some(b'u') if rest.len() >= 5 && rest[1..5].iter().all(u8::is_ascii_hexdigit) => 5,
        _ => 0,
    }
}
