//! Class names as CSS identifiers.

/// Escapes a class name so it can follow a `.` in a selector.
///
/// ASCII letters, digits, `-` and `_` pass through. Other printable ASCII gets
/// a backslash. Non-ASCII characters, control characters and digits that would
/// start the identifier become hex escapes.
pub fn escape_class_name(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);
    let chars = class.chars().collect::<Vec<_>>();

    for (idx, &ch) in chars.iter().enumerate() {
        if needs_hex_escape(&chars, idx) {
            escaped.push_str(&format!("\\{:x}", ch as u32));
            let next_is_escaped = chars
                .get(idx + 1)
                .is_some_and(|_| needs_backslash(&chars, idx + 1));
            if !next_is_escaped {
                escaped.push(' ');
            }
            continue;
        }
        if needs_backslash(&chars, idx) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    escaped
}

/// Inverse of [`escape_class_name`] for any CSS-escaped identifier.
pub fn unescape_class_name(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(next) if next.is_ascii_hexdigit() => {
                    hex.push(*next);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\u{FFFD}'),
            }
            continue;
        }

        let decoded = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{FFFD}');
        out.push(decoded);
        if chars.peek().is_some_and(|next| is_css_whitespace(*next)) {
            chars.next();
        }
    }

    out
}

fn needs_hex_escape(chars: &[char], idx: usize) -> bool {
    let ch = chars[idx];
    if !ch.is_ascii() || ch.is_ascii_control() {
        return true;
    }
    if ch.is_ascii_digit() {
        return idx == 0 || (idx == 1 && chars[0] == '-');
    }
    false
}

// Hex escapes swallow one following whitespace character, so they only need a
// terminator when the next character is emitted bare.
fn needs_backslash(chars: &[char], idx: usize) -> bool {
    if needs_hex_escape(chars, idx) {
        return true;
    }
    let ch = chars[idx];
    !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn is_css_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}
