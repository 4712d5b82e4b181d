use crate::error::{CompileError, CompileResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Variant,
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub role: SegmentRole,
}

/// A candidate cut at its top-level `:` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCandidate<'a> {
    pub raw: &'a str,
    pub variants: Vec<&'a str>,
    pub base: &'a str,
}

impl<'a> SplitCandidate<'a> {
    pub fn segments(&self) -> Vec<Segment<'a>> {
        let mut segments = self
            .variants
            .iter()
            .map(|text| Segment {
                text,
                role: SegmentRole::Variant,
            })
            .collect::<Vec<_>>();
        segments.push(Segment {
            text: self.base,
            role: SegmentRole::Base,
        });
        segments
    }
}

/// Splits `candidate` on colons that sit outside every `[...]`, `(...)` and
/// quoted string. A backslash makes the following character inert.
pub fn split_candidate(candidate: &str) -> CompileResult<SplitCandidate<'_>> {
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut variants = Vec::new();
    let mut start = 0usize;

    for (idx, ch) in candidate.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(open) = quote {
            match ch {
                '\\' => escaped = true,
                _ if ch == open => quote = None,
                _ => {}
            }
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '\'' | '"' => quote = Some(ch),
            '[' => bracket_depth += 1,
            '(' => paren_depth += 1,
            ']' => {
                if bracket_depth == 0 {
                    return Err(malformed(candidate, start));
                }
                bracket_depth -= 1;
            }
            ')' => {
                if paren_depth == 0 {
                    return Err(malformed(candidate, start));
                }
                paren_depth -= 1;
            }
            ':' if bracket_depth == 0 && paren_depth == 0 => {
                variants.push(&candidate[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if bracket_depth > 0 || paren_depth > 0 || quote.is_some() {
        return Err(malformed(candidate, start));
    }

    Ok(SplitCandidate {
        raw: candidate,
        variants,
        base: &candidate[start..],
    })
}

fn malformed(candidate: &str, start: usize) -> CompileError {
    CompileError::MalformedBracketExpression {
        candidate: candidate.to_string(),
        remainder: candidate[start..].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{SegmentRole, split_candidate};
    use crate::error::CompileError;
    use proptest::prelude::*;

    #[test]
    fn splits_plain_utility_without_variants() {
        let split = split_candidate("border-spacing-4").expect("candidate should split");
        assert!(split.variants.is_empty());
        assert_eq!(split.base, "border-spacing-4");
    }

    #[test]
    fn keeps_colons_inside_brackets() {
        let split = split_candidate("supports-[display:grid]:grid").expect("candidate should split");
        assert_eq!(split.variants, vec!["supports-[display:grid]"]);
        assert_eq!(split.base, "grid");
    }

    #[test]
    fn keeps_colons_inside_nested_parens_and_brackets() {
        let split = split_candidate("supports-[(backdrop-filter:blur(0px))]:backdrop-blur-lg")
            .expect("candidate should split");
        assert_eq!(split.variants, vec!["supports-[(backdrop-filter:blur(0px))]"]);
        assert_eq!(split.base, "backdrop-blur-lg");
    }

    #[test]
    fn splits_stacked_arbitrary_variants() {
        let split = split_candidate("[&:hover]:[&:first-child]:text-green-500")
            .expect("candidate should split");
        assert_eq!(split.variants, vec!["[&:hover]", "[&:first-child]"]);
        assert_eq!(split.base, "text-green-500");
    }

    #[test]
    fn keeps_colons_inside_quotes() {
        let split = split_candidate("before:content-['a:b']").expect("candidate should split");
        assert_eq!(split.variants, vec!["before"]);
        assert_eq!(split.base, "content-['a:b']");
    }

    #[test]
    fn escaped_bracket_does_not_open_a_group() {
        let split = split_candidate(r"hover:content-['\[']").expect("candidate should split");
        assert_eq!(split.variants, vec!["hover"]);
        assert_eq!(split.base, r"content-['\[']");
    }

    #[test]
    fn preserves_leading_dash_on_base() {
        let split = split_candidate("hover:-outline-offset-2").expect("candidate should split");
        assert_eq!(split.variants, vec!["hover"]);
        assert_eq!(split.base, "-outline-offset-2");
    }

    #[test]
    fn unbalanced_bracket_fails_closed_with_remainder() {
        let err = split_candidate("hover:data-[state=open:block").expect_err("should fail");
        assert_eq!(
            err,
            CompileError::MalformedBracketExpression {
                candidate: "hover:data-[state=open:block".to_string(),
                remainder: "data-[state=open:block".to_string(),
            }
        );
    }

    #[test]
    fn stray_closing_bracket_is_malformed() {
        let err = split_candidate("min-640px]:flex").expect_err("should fail");
        assert!(matches!(
            err,
            CompileError::MalformedBracketExpression { .. }
        ));
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        assert!(split_candidate("content-['oops]").is_err());
    }

    #[test]
    fn segments_are_tagged_in_order() {
        let split = split_candidate("md:hover:flex").expect("candidate should split");
        let segments = split.segments();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "md");
        assert_eq!(segments[0].role, SegmentRole::Variant);
        assert_eq!(segments[1].text, "hover");
        assert_eq!(segments[2].text, "flex");
        assert_eq!(segments[2].role, SegmentRole::Base);
    }

    #[test]
    fn empty_segments_are_preserved() {
        let split = split_candidate("hover::flex").expect("candidate should split");
        assert_eq!(split.variants, vec!["hover", ""]);
        let split = split_candidate("hover:").expect("candidate should split");
        assert_eq!(split.base, "");
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(s in "\\PC*") {
            let _ = split_candidate(&s);
        }

        #[test]
        fn rejoined_segments_reproduce_candidate(s in "[a-z\\[\\]:&_=-]{0,24}") {
            if let Ok(split) = split_candidate(&s) {
                let rejoined = split
                    .segments()
                    .iter()
                    .map(|segment| segment.text)
                    .collect::<Vec<_>>()
                    .join(":");
                prop_assert_eq!(rejoined, s);
            }
        }
    }
}
