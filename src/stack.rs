use crate::arbitrary::apply_selector_rewrite;
use crate::error::{CompileError, CompileResult};
use crate::variant::{VariantChain, VariantKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtRuleKind {
    Media,
    Supports,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub kind: AtRuleKind,
    pub condition: String,
}

impl AtRule {
    pub fn media(condition: impl Into<String>) -> Self {
        Self {
            kind: AtRuleKind::Media,
            condition: condition.into(),
        }
    }

    pub fn supports(condition: impl Into<String>) -> Self {
        Self {
            kind: AtRuleKind::Supports,
            condition: condition.into(),
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self.kind {
            AtRuleKind::Media => "@media",
            AtRuleKind::Supports => "@supports",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorStep {
    /// Concatenated after the selector built so far.
    Append(String),
    /// `&` in the fragment is replaced by the selector built so far.
    Rewrite(String),
}

/// Which class selector the steps start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorTarget {
    /// The escaped full candidate, e.g. `.hover\:flex`.
    Candidate,
    /// The utility's own class, e.g. `.flex`. Used by arbitrary selectors.
    BaseUtility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStack {
    pub target: SelectorTarget,
    pub steps: Vec<SelectorStep>,
    /// Outermost first.
    pub at_rules: Vec<AtRule>,
}

impl VariantStack {
    pub fn apply_selector(&self, initial: &str) -> String {
        self.steps
            .iter()
            .fold(initial.to_string(), |selector, step| match step {
                SelectorStep::Append(suffix) => selector + suffix,
                SelectorStep::Rewrite(fragment) => apply_selector_rewrite(fragment, &selector),
            })
    }
}

/// Splits a chain into selector steps and at-rule wrappers, both in chain order.
///
/// Named selector variants cannot share a chain with arbitrary selector
/// variants; such chains produce no rule.
pub fn stack_variants(chain: &VariantChain) -> CompileResult<VariantStack> {
    let has_arbitrary_selector = chain
        .iter()
        .any(|variant| variant.kind == VariantKind::ArbitrarySelector);
    if has_arbitrary_selector {
        if let Some(named) = chain.iter().find(|variant| variant.kind.is_named_selector()) {
            return Err(CompileError::UnsupportedStackedArbitraryVariant {
                variant: named.raw.clone(),
            });
        }
    }

    let mut steps = Vec::new();
    let mut at_rules = Vec::new();

    for variant in chain {
        let parameter = variant.parameter.as_str();
        match variant.kind {
            VariantKind::Responsive | VariantKind::MinWidth => {
                at_rules.push(AtRule::media(format!("(min-width: {})", parameter)));
            }
            VariantKind::MaxWidth => {
                at_rules.push(AtRule::media(format!("(max-width: {})", parameter)));
            }
            VariantKind::MediaFeature | VariantKind::ArbitraryMedia => {
                at_rules.push(AtRule::media(parameter));
            }
            VariantKind::Supports => {
                at_rules.push(AtRule::supports(format!("({})", parameter)));
            }
            VariantKind::PseudoClass | VariantKind::PseudoElement => {
                steps.push(SelectorStep::Append(parameter.to_string()));
            }
            VariantKind::Aria | VariantKind::Data => {
                steps.push(SelectorStep::Append(format!("[{}]", parameter)));
            }
            VariantKind::ArbitrarySelector => {
                steps.push(SelectorStep::Rewrite(parameter.to_string()));
            }
        }
    }

    Ok(VariantStack {
        target: if has_arbitrary_selector {
            SelectorTarget::BaseUtility
        } else {
            SelectorTarget::Candidate
        },
        steps,
        at_rules,
    })
}

#[cfg(test)]
mod tests {
    use super::{AtRule, SelectorStep, SelectorTarget, stack_variants};
    use crate::error::CompileError;
    use crate::variant::{VariantChain, default_registry};
    use proptest::prelude::*;

    const AT_RULE_SEGMENTS: &[(&str, &str, &str)] = &[
        ("md", "@media", "(min-width: 768px)"),
        ("lg", "@media", "(min-width: 1024px)"),
        ("min-[640px]", "@media", "(min-width: 640px)"),
        ("max-[1024px]", "@media", "(max-width: 1024px)"),
        ("supports-[display:grid]", "@supports", "(display:grid)"),
        ("dark", "@media", "(prefers-color-scheme: dark)"),
        ("print", "@media", "print"),
    ];

    const ATTRIBUTE_SEGMENTS: &[(&str, &str)] = &[
        ("aria-[checked]", "[aria-checked]"),
        ("aria-disabled", "[aria-disabled=\"true\"]"),
        ("data-[state=open]", "[data-state=\"open\"]"),
        ("data-[loading]", "[data-loading]"),
    ];

    fn chain(segments: &[&str]) -> VariantChain {
        default_registry()
            .resolve_chain(segments)
            .expect("chain should resolve")
    }

    #[test]
    fn empty_chain_stacks_to_nothing() {
        let stack = stack_variants(&VariantChain::default()).expect("stack should build");
        assert!(stack.steps.is_empty());
        assert!(stack.at_rules.is_empty());
        assert_eq!(stack.target, SelectorTarget::Candidate);
    }

    #[test]
    fn at_rules_nest_in_chain_order() {
        let stack = stack_variants(&chain(&["min-[640px]", "max-[1024px]"]))
            .expect("stack should build");
        assert_eq!(
            stack.at_rules,
            vec![
                AtRule::media("(min-width: 640px)"),
                AtRule::media("(max-width: 1024px)"),
            ]
        );
    }

    #[test]
    fn supports_condition_is_parenthesized() {
        let stack = stack_variants(&chain(&["supports-[(backdrop-filter:blur(0px))]"]))
            .expect("stack should build");
        assert_eq!(
            stack.at_rules,
            vec![AtRule::supports("((backdrop-filter:blur(0px)))")]
        );
    }

    #[test]
    fn mixed_chain_splits_wrappers_from_selector() {
        let stack =
            stack_variants(&chain(&["hover", "supports-[display:grid]", "md", "data-[active]"]))
                .expect("stack should build");
        assert_eq!(
            stack.at_rules,
            vec![
                AtRule::supports("(display:grid)"),
                AtRule::media("(min-width: 768px)"),
            ]
        );
        assert_eq!(stack.apply_selector(".x"), ".x:hover[data-active]");
    }

    #[test]
    fn attribute_variants_combine_conjunctively() {
        let stack = stack_variants(&chain(&["aria-[checked]", "data-[state=active]"]))
            .expect("stack should build");
        assert_eq!(
            stack.apply_selector(".x"),
            ".x[aria-checked][data-state=\"active\"]"
        );
    }

    #[test]
    fn arbitrary_selectors_target_base_and_compose() {
        let stack = stack_variants(&chain(&["[&:hover]", "[&:first-child]"]))
            .expect("stack should build");
        assert_eq!(stack.target, SelectorTarget::BaseUtility);
        assert_eq!(
            stack.steps,
            vec![
                SelectorStep::Rewrite("&:hover".to_string()),
                SelectorStep::Rewrite("&:first-child".to_string()),
            ]
        );
        assert_eq!(stack.apply_selector(".x"), ".x:hover:first-child");
    }

    #[test]
    fn arbitrary_selector_may_sit_inside_at_rules() {
        let stack = stack_variants(&chain(&["md", "[&_p]"])).expect("stack should build");
        assert_eq!(stack.at_rules, vec![AtRule::media("(min-width: 768px)")]);
        assert_eq!(stack.apply_selector(".x"), ".x p");
    }

    #[test]
    fn named_variant_with_arbitrary_selector_is_unsupported() {
        let err = stack_variants(&chain(&["hover", "[&:first-child]"]))
            .expect_err("stack should be rejected");
        assert_eq!(
            err,
            CompileError::UnsupportedStackedArbitraryVariant {
                variant: "hover".to_string()
            }
        );
        assert!(stack_variants(&chain(&["[&:hover]", "data-[x]"])).is_err());
    }

    proptest! {
        #[test]
        fn at_rules_follow_chain_order(
            picks in proptest::collection::vec(
                (any::<bool>(), 0..AT_RULE_SEGMENTS.len(), 0..ATTRIBUTE_SEGMENTS.len()),
                0..8,
            ),
        ) {
            let mut segments = Vec::new();
            let mut expected_at_rules = Vec::new();
            let mut expected_selector = ".x".to_string();
            for (is_at_rule, at_idx, attr_idx) in picks {
                if is_at_rule {
                    let (segment, keyword, condition) = AT_RULE_SEGMENTS[at_idx];
                    segments.push(segment);
                    expected_at_rules.push((keyword, condition.to_string()));
                } else {
                    let (segment, clause) = ATTRIBUTE_SEGMENTS[attr_idx];
                    segments.push(segment);
                    expected_selector.push_str(clause);
                }
            }

            let stack = stack_variants(&chain(&segments)).expect("stack should build");
            let at_rules = stack
                .at_rules
                .iter()
                .map(|at_rule| (at_rule.keyword(), at_rule.condition.clone()))
                .collect::<Vec<_>>();
            prop_assert_eq!(at_rules, expected_at_rules);
            prop_assert_eq!(stack.apply_selector(".x"), expected_selector);
        }

        #[test]
        fn attribute_variants_never_nest(
            picks in proptest::collection::vec(0..ATTRIBUTE_SEGMENTS.len(), 1..6),
        ) {
            let segments = picks
                .iter()
                .map(|idx| ATTRIBUTE_SEGMENTS[*idx].0)
                .collect::<Vec<_>>();
            let stack = stack_variants(&chain(&segments)).expect("stack should build");
            let selector = stack.apply_selector(".x");
            let mut depth = 0usize;
            let mut clauses = 0usize;
            for ch in selector.chars() {
                match ch {
                    '[' => {
                        depth += 1;
                        clauses += 1;
                        prop_assert_eq!(depth, 1);
                    }
                    ']' => depth -= 1,
                    _ => {}
                }
            }
            prop_assert_eq!(clauses, picks.len());
            prop_assert!(stack.at_rules.is_empty());
        }
    }
}
