//! Bracketed author input: arbitrary variants (`[&:hover]`, `[@media print]`)
//! and arbitrary values (`supports-[display:grid]`, `content-['x']`).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitraryContent {
    /// A selector fragment where `&` stands for the utility's selector.
    SelectorRewrite(String),
    /// The query of an `@media` fragment.
    MediaQuery(String),
    /// An opaque value or condition.
    Value(String),
}

/// Returns the text between a segment's outer brackets, if it is bracketed.
pub fn bracket_contents(segment: &str) -> Option<&str> {
    segment.strip_prefix('[')?.strip_suffix(']')
}

pub fn classify_arbitrary(raw: &str) -> ArbitraryContent {
    let unescaped = unescape_arbitrary(raw);
    let trimmed = unescaped.trim();
    if let Some(query) = trimmed.strip_prefix("@media") {
        if query.is_empty() || query.starts_with([' ', '(']) {
            return ArbitraryContent::MediaQuery(query.trim().to_string());
        }
    }
    if !marker_offsets(trimmed).is_empty() {
        return ArbitraryContent::SelectorRewrite(normalize_combinators(trimmed));
    }
    ArbitraryContent::Value(unescaped)
}

/// Whether a rewrite fragment can be spliced into a selector.
///
/// Outside quotes and escapes it may not contain `{`, `}`, `;` or `@`, and
/// every `&` must start a compound selector rather than trail a name.
pub fn is_selector_fragment(fragment: &str) -> bool {
    let mut markers = 0usize;
    let mut prev: Option<char> = None;
    let mut legal = true;

    walk_unquoted(fragment, |_, ch| {
        match ch {
            '{' | '}' | ';' | '@' => legal = false,
            '&' => {
                if prev.is_some_and(|prev| prev.is_ascii_alphanumeric() || prev == '-' || prev == '_')
                {
                    legal = false;
                }
                markers += 1;
            }
            _ => {}
        }
        prev = Some(ch);
    });

    legal && markers > 0
}

/// Byte offsets of the `&` markers that sit outside quotes and escapes.
fn marker_offsets(fragment: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    walk_unquoted(fragment, |idx, ch| {
        if ch == '&' {
            offsets.push(idx);
        }
    });
    offsets
}

/// Calls `visit` for every character that is neither quoted nor escaped.
fn walk_unquoted(fragment: &str, mut visit: impl FnMut(usize, char)) {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in fragment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
            continue;
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
            continue;
        }
        visit(idx, ch);
    }
}

/// Resolves author escapes inside brackets.
///
/// `_` becomes a space and `\_` a literal underscore; `\[` and `\]` become
/// literal brackets. Any other backslash sequence is already valid CSS and is
/// kept as written.
pub fn unescape_arbitrary(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_backslashes = 0usize;

    for ch in raw.chars() {
        if ch == '\\' {
            pending_backslashes += 1;
            continue;
        }

        match ch {
            '_' | '[' | ']' => {
                for _ in 0..(pending_backslashes / 2) {
                    out.push('\\');
                }
                if pending_backslashes % 2 == 1 || ch != '_' {
                    out.push(ch);
                } else {
                    out.push(' ');
                }
            }
            _ => {
                for _ in 0..pending_backslashes {
                    out.push('\\');
                }
                out.push(ch);
            }
        }
        pending_backslashes = 0;
    }

    for _ in 0..pending_backslashes {
        out.push('\\');
    }

    out
}

/// Spaces out top-level `>`, `+` and `~` combinators (`&>div` to `& > div`).
pub fn normalize_combinators(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len() + 8);
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut skip_spaces = false;

    for ch in selector.chars() {
        if skip_spaces {
            if ch == ' ' {
                continue;
            }
            skip_spaces = false;
        }
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        if let Some(open) = quote {
            if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '\'' | '"' => quote = Some(ch),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '>' | '+' | '~' if bracket_depth == 0 && paren_depth == 0 => {
                let kept = out.trim_end_matches(' ').len();
                out.truncate(kept);
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push(ch);
                out.push(' ');
                skip_spaces = true;
                continue;
            }
            _ => {}
        }
        out.push(ch);
    }

    out
}

/// Substitutes every `&` marker in `fragment` with `selector`. Quoted and
/// escaped ampersands are left alone.
pub fn apply_selector_rewrite(fragment: &str, selector: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + selector.len());
    let mut start = 0usize;
    for offset in marker_offsets(fragment) {
        out.push_str(&fragment[start..offset]);
        out.push_str(selector);
        start = offset + 1;
    }
    out.push_str(&fragment[start..]);
    out
}

/// Renders `value` as a double-quoted attribute value.
pub fn quote_attribute_value(value: &str) -> String {
    let trimmed = value.trim();
    let inner = ['"', '\'']
        .iter()
        .find_map(|quote| {
            trimmed
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .unwrap_or(trimmed);
    format!("\"{}\"", inner.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::{
        ArbitraryContent, apply_selector_rewrite, bracket_contents, classify_arbitrary,
        is_selector_fragment, normalize_combinators, quote_attribute_value, unescape_arbitrary,
    };

    #[test]
    fn strips_outer_brackets() {
        assert_eq!(bracket_contents("[&:hover]"), Some("&:hover"));
        assert_eq!(bracket_contents("hover"), None);
        assert_eq!(bracket_contents("[]"), Some(""));
    }

    #[test]
    fn underscores_become_spaces_unless_escaped() {
        assert_eq!(unescape_arbitrary("&_p"), "& p");
        assert_eq!(unescape_arbitrary(r"a\_b"), "a_b");
        assert_eq!(unescape_arbitrary(r"a\\_b"), r"a\ b");
    }

    #[test]
    fn escaped_brackets_become_literal() {
        assert_eq!(unescape_arbitrary(r"\[x\]"), "[x]");
    }

    #[test]
    fn other_escapes_pass_through() {
        assert_eq!(unescape_arbitrary(r"&.a\:b"), r"&.a\:b");
    }

    #[test]
    fn classifies_selector_rewrites() {
        assert_eq!(
            classify_arbitrary("&:hover"),
            ArbitraryContent::SelectorRewrite("&:hover".to_string())
        );
        assert_eq!(
            classify_arbitrary("&_p"),
            ArbitraryContent::SelectorRewrite("& p".to_string())
        );
        assert_eq!(
            classify_arbitrary("&>div"),
            ArbitraryContent::SelectorRewrite("& > div".to_string())
        );
    }

    #[test]
    fn classifies_media_queries() {
        assert_eq!(
            classify_arbitrary("@media_print"),
            ArbitraryContent::MediaQuery("print".to_string())
        );
        assert_eq!(
            classify_arbitrary("@media(min-width:900px)"),
            ArbitraryContent::MediaQuery("(min-width:900px)".to_string())
        );
    }

    #[test]
    fn media_keyword_must_end_before_the_query() {
        assert_eq!(
            classify_arbitrary("@mediafoo"),
            ArbitraryContent::Value("@mediafoo".to_string())
        );
        assert_eq!(
            classify_arbitrary("@media"),
            ArbitraryContent::MediaQuery(String::new())
        );
    }

    #[test]
    fn quoted_ampersand_is_not_a_marker() {
        assert_eq!(
            classify_arbitrary("content:'a&b'"),
            ArbitraryContent::Value("content:'a&b'".to_string())
        );
    }

    #[test]
    fn selector_fragments_reject_rule_syntax() {
        assert!(is_selector_fragment("&:hover"));
        assert!(is_selector_fragment(".dark &"));
        assert!(is_selector_fragment(":is(&) > p"));
        assert!(is_selector_fragment("&[data-x='{;}']"));
        assert!(!is_selector_fragment("&}body{color:red"));
        assert!(!is_selector_fragment("&{}"));
        assert!(!is_selector_fragment("&;x"));
        assert!(!is_selector_fragment("@supports &"));
        assert!(!is_selector_fragment("color:red&"));
        assert!(!is_selector_fragment("[x='&']"));
    }

    #[test]
    fn everything_else_is_an_opaque_value() {
        assert_eq!(
            classify_arbitrary("display:grid"),
            ArbitraryContent::Value("display:grid".to_string())
        );
        assert_eq!(
            classify_arbitrary("(backdrop-filter:blur(0px))"),
            ArbitraryContent::Value("(backdrop-filter:blur(0px))".to_string())
        );
    }

    #[test]
    fn combinators_inside_groups_are_untouched() {
        assert_eq!(
            normalize_combinators("&:nth-child(2n+1)"),
            "&:nth-child(2n+1)"
        );
        assert_eq!(normalize_combinators("&[class~=x]"), "&[class~=x]");
        assert_eq!(normalize_combinators("& +  p"), "& + p");
        assert_eq!(normalize_combinators("&~*"), "& ~ *");
    }

    #[test]
    fn rewrite_targets_every_marker() {
        assert_eq!(apply_selector_rewrite("&:hover", ".x"), ".x:hover");
        assert_eq!(apply_selector_rewrite(".dark &", ".x"), ".dark .x");
        assert_eq!(apply_selector_rewrite("& + &", ".x"), ".x + .x");
    }

    #[test]
    fn rewrite_skips_quoted_and_escaped_ampersands() {
        assert_eq!(
            apply_selector_rewrite("&[data-x='a&b']", ".x"),
            ".x[data-x='a&b']"
        );
        assert_eq!(apply_selector_rewrite(r"&.a\&b", ".x"), r".x.a\&b");
    }

    #[test]
    fn attribute_values_are_double_quoted() {
        assert_eq!(quote_attribute_value("open"), "\"open\"");
        assert_eq!(quote_attribute_value("'open'"), "\"open\"");
        assert_eq!(quote_attribute_value("\"a b\""), "\"a b\"");
    }
}
