use crate::emitter::{CompileOutcome, CompiledRule};
use crate::stack::AtRule;
use crate::utility::Declaration;

/// Serializes one rule with its at-rule wrappers. Rules without declarations
/// print nothing.
pub fn print_rule(rule: &CompiledRule, minify: bool) -> Option<String> {
    let body = rule_block(&rule.selector, &rule.declarations, minify)?;
    Some(
        rule.at_rules
            .iter()
            .rev()
            .fold(body, |inner, at_rule| wrap_rule(at_rule, &inner, minify)),
    )
}

pub fn print_rules(rules: &[CompiledRule], minify: bool) -> String {
    let printed = rules
        .iter()
        .filter_map(|rule| print_rule(rule, minify))
        .collect::<Vec<_>>();
    if minify {
        printed.join("")
    } else {
        printed.join("\n")
    }
}

/// Prints the rules of a batch in order; skipped candidates contribute nothing.
pub fn print_outcomes(outcomes: &[CompileOutcome], minify: bool) -> String {
    let rules = outcomes
        .iter()
        .filter_map(CompileOutcome::rule)
        .cloned()
        .collect::<Vec<_>>();
    print_rules(&rules, minify)
}

/// Normalizes the space after feature-name colons: `(a:b)` pretty prints as
/// `(a: b)` and `(a: b)` minifies to `(a:b)`.
///
/// Only colons inside grouping parens count. Colons in strings or inside a
/// function such as `selector(a:hover)` are left as written.
pub fn format_condition(condition: &str, minify: bool) -> String {
    let mut out = String::with_capacity(condition.len() + 4);
    let mut chars = condition.trim().chars().peekable();
    let mut prev: Option<char> = None;
    // One entry per open paren; `true` when it opened a function call.
    let mut parens: Vec<bool> = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        out.push(ch);
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if let Some(open) = quote {
            if ch == open {
                quote = None;
            }
        } else {
            match ch {
                '\'' | '"' => quote = Some(ch),
                '(' => parens.push(prev.is_some_and(is_ident_char)),
                ')' => {
                    parens.pop();
                }
                ':' if is_feature_colon(&parens, prev) => {
                    if minify {
                        while chars.peek().is_some_and(|next| next.is_whitespace()) {
                            chars.next();
                        }
                    } else if chars.peek().is_some_and(|next| !next.is_whitespace()) {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
        prev = Some(ch);
    }

    out
}

fn is_feature_colon(parens: &[bool], prev: Option<char>) -> bool {
    !parens.is_empty()
        && !parens.iter().any(|is_function| *is_function)
        && prev.is_some_and(is_ident_char)
}

fn rule_block(selector: &str, declarations: &[Declaration], minify: bool) -> Option<String> {
    if declarations.is_empty() {
        return None;
    }
    if minify {
        let body = declarations
            .iter()
            .map(|decl| format!("{}:{}", decl.property, decl.value.trim()))
            .collect::<Vec<_>>()
            .join(";");
        return Some(format!("{}{{{}}}", selector, body));
    }
    let lines = declarations
        .iter()
        .map(|decl| format!("  {}: {};", decl.property, decl.value.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{} {{\n{}\n}}", selector, lines))
}

fn wrap_rule(at_rule: &AtRule, rule: &str, minify: bool) -> String {
    let condition = format_condition(&at_rule.condition, minify);
    if minify {
        format!("{} {}{{{}}}", at_rule.keyword(), condition, rule)
    } else {
        format!(
            "{} {} {{\n{}\n}}",
            at_rule.keyword(),
            condition,
            indent_css_block(rule, 2)
        )
    }
}

fn indent_css_block(css: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    css.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
