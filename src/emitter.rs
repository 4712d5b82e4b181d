//! Candidate to rule: ties the splitter, registry, stacker and a utility
//! resolver together, one candidate or a whole batch at a time.

use crate::candidate::split_candidate;
use crate::config::{Config, resolve_screens};
use crate::error::{CompileError, CompileResult};
use crate::escape::escape_class_name;
use crate::stack::{AtRule, SelectorTarget, stack_variants};
use crate::utility::{CoreUtilities, Declaration, Utility, UtilityResolver};
use crate::variant::{VariantChain, VariantRegistry};
use rayon::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub selector: String,
    /// Outermost first.
    pub at_rules: Vec<AtRule>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCandidate {
    pub raw: String,
    pub chain: VariantChain,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Rule(CompiledRule),
    Skipped {
        candidate: String,
        reason: CompileError,
    },
}

impl CompileOutcome {
    pub fn rule(&self) -> Option<&CompiledRule> {
        match self {
            CompileOutcome::Rule(rule) => Some(rule),
            CompileOutcome::Skipped { .. } => None,
        }
    }
}

pub fn parse_candidate(registry: &VariantRegistry, raw: &str) -> CompileResult<ParsedCandidate> {
    let split = split_candidate(raw)?;
    if split.base.is_empty() {
        return Err(CompileError::UnresolvedUtility {
            utility: raw.to_string(),
        });
    }
    let chain = registry.resolve_chain(&split.variants)?;
    Ok(ParsedCandidate {
        raw: raw.to_string(),
        chain,
        base: split.base.to_string(),
    })
}

/// Applies the candidate's variants to `utility`.
///
/// The utility's template must contain its own class selector; that occurrence
/// is replaced by the rewritten selector and the rest of the template is kept.
pub fn emit_rule(parsed: &ParsedCandidate, utility: &Utility) -> CompileResult<CompiledRule> {
    let stack = stack_variants(&parsed.chain)?;
    let base_selector = format!(".{}", escape_class_name(&parsed.base));
    if !utility.selector_template.contains(&base_selector) {
        return Err(CompileError::UnresolvedUtility {
            utility: parsed.base.clone(),
        });
    }

    let target = match stack.target {
        SelectorTarget::Candidate => format!(".{}", escape_class_name(&parsed.raw)),
        SelectorTarget::BaseUtility => base_selector.clone(),
    };
    let selector = utility
        .selector_template
        .replacen(&base_selector, &stack.apply_selector(&target), 1);

    Ok(CompiledRule {
        selector,
        at_rules: stack.at_rules,
        declarations: utility.declarations.clone(),
    })
}

pub fn compile_candidate<R>(
    registry: &VariantRegistry,
    resolver: &R,
    raw: &str,
) -> CompileResult<CompiledRule>
where
    R: UtilityResolver + ?Sized,
{
    let parsed = parse_candidate(registry, raw)?;
    let utility = resolver
        .resolve(&parsed.base)
        .ok_or_else(|| CompileError::UnresolvedUtility {
            utility: parsed.base.clone(),
        })?;
    emit_rule(&parsed, &utility)
}

/// A registry and a resolver, shared read-only across a batch.
#[derive(Debug)]
pub struct Compiler<R = CoreUtilities> {
    registry: VariantRegistry,
    resolver: R,
}

impl Compiler<CoreUtilities> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            VariantRegistry::new(resolve_screens(config)),
            CoreUtilities::new(config),
        )
    }
}

impl Default for Compiler<CoreUtilities> {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl<R: UtilityResolver> Compiler<R> {
    pub fn new(registry: VariantRegistry, resolver: R) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn parse(&self, raw: &str) -> CompileResult<ParsedCandidate> {
        parse_candidate(&self.registry, raw)
    }

    pub fn compile(&self, raw: &str) -> CompileResult<CompiledRule> {
        compile_candidate(&self.registry, &self.resolver, raw)
    }

    /// Compiles every distinct candidate. Duplicates keep their first position
    /// and outcomes come back in input order.
    pub fn compile_all<S>(&self, candidates: &[S]) -> Vec<CompileOutcome>
    where
        S: AsRef<str> + Sync,
    {
        let mut seen = HashSet::new();
        let unique = candidates
            .iter()
            .map(AsRef::as_ref)
            .filter(|candidate| seen.insert(*candidate))
            .collect::<Vec<&str>>();

        unique
            .par_iter()
            .map(|candidate| match self.compile(candidate) {
                Ok(rule) => CompileOutcome::Rule(rule),
                Err(reason) => {
                    tracing::debug!(candidate = *candidate, %reason, "skipping candidate");
                    CompileOutcome::Skipped {
                        candidate: candidate.to_string(),
                        reason,
                    }
                }
            })
            .collect()
    }

    /// Only the rules of [`Compiler::compile_all`], skips dropped.
    pub fn rules<S>(&self, candidates: &[S]) -> Vec<CompiledRule>
    where
        S: AsRef<str> + Sync,
    {
        self.compile_all(candidates)
            .into_iter()
            .filter_map(|outcome| match outcome {
                CompileOutcome::Rule(rule) => Some(rule),
                CompileOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}
