use crate::arbitrary::{
    ArbitraryContent, bracket_contents, classify_arbitrary, is_selector_fragment,
    quote_attribute_value, unescape_arbitrary,
};
use crate::config::default_screens;
use crate::error::{CompileError, CompileResult};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Responsive,
    PseudoClass,
    PseudoElement,
    Aria,
    Data,
    Supports,
    MinWidth,
    MaxWidth,
    MediaFeature,
    ArbitrarySelector,
    ArbitraryMedia,
}

impl VariantKind {
    /// Variants that wrap the rule in an at-rule instead of touching the selector.
    pub fn is_at_rule(self) -> bool {
        matches!(
            self,
            VariantKind::Responsive
                | VariantKind::Supports
                | VariantKind::MinWidth
                | VariantKind::MaxWidth
                | VariantKind::MediaFeature
                | VariantKind::ArbitraryMedia
        )
    }

    /// Selector variants that come from the registry's vocabulary rather than
    /// from an author-written `[&...]` fragment.
    pub fn is_named_selector(self) -> bool {
        matches!(
            self,
            VariantKind::PseudoClass
                | VariantKind::PseudoElement
                | VariantKind::Aria
                | VariantKind::Data
        )
    }
}

/// One classified variant segment.
///
/// `parameter` depends on the kind: the selector suffix for pseudo variants,
/// the attribute clause body for `aria`/`data`, a length for width variants,
/// the raw condition for `supports`, the full query for media variants and
/// the normalized fragment for arbitrary selectors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variant {
    pub kind: VariantKind,
    pub raw: String,
    pub parameter: String,
}

impl Variant {
    pub fn new(kind: VariantKind, raw: &str, parameter: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            parameter: parameter.into(),
        }
    }
}

/// Variants in the order they appear in the candidate, left to right.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariantChain(Vec<Variant>);

impl VariantChain {
    pub fn new(variants: Vec<Variant>) -> Self {
        Self(variants)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Variant] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a VariantChain {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub trait VariantMatcher: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn classify(&self, segment: &str) -> Option<Variant>;
}

const STATIC_VARIANTS: &[(&str, VariantKind, &str)] = &[
    ("hover", VariantKind::PseudoClass, ":hover"),
    ("focus", VariantKind::PseudoClass, ":focus"),
    ("focus-within", VariantKind::PseudoClass, ":focus-within"),
    ("focus-visible", VariantKind::PseudoClass, ":focus-visible"),
    ("active", VariantKind::PseudoClass, ":active"),
    ("visited", VariantKind::PseudoClass, ":visited"),
    ("target", VariantKind::PseudoClass, ":target"),
    ("first", VariantKind::PseudoClass, ":first-child"),
    ("last", VariantKind::PseudoClass, ":last-child"),
    ("only", VariantKind::PseudoClass, ":only-child"),
    ("odd", VariantKind::PseudoClass, ":nth-child(odd)"),
    ("even", VariantKind::PseudoClass, ":nth-child(even)"),
    ("first-of-type", VariantKind::PseudoClass, ":first-of-type"),
    ("last-of-type", VariantKind::PseudoClass, ":last-of-type"),
    ("only-of-type", VariantKind::PseudoClass, ":only-of-type"),
    ("empty", VariantKind::PseudoClass, ":empty"),
    ("disabled", VariantKind::PseudoClass, ":disabled"),
    ("enabled", VariantKind::PseudoClass, ":enabled"),
    ("checked", VariantKind::PseudoClass, ":checked"),
    ("indeterminate", VariantKind::PseudoClass, ":indeterminate"),
    ("default", VariantKind::PseudoClass, ":default"),
    ("required", VariantKind::PseudoClass, ":required"),
    ("valid", VariantKind::PseudoClass, ":valid"),
    ("invalid", VariantKind::PseudoClass, ":invalid"),
    ("in-range", VariantKind::PseudoClass, ":in-range"),
    ("out-of-range", VariantKind::PseudoClass, ":out-of-range"),
    ("placeholder-shown", VariantKind::PseudoClass, ":placeholder-shown"),
    ("autofill", VariantKind::PseudoClass, ":autofill"),
    ("read-only", VariantKind::PseudoClass, ":read-only"),
    ("optional", VariantKind::PseudoClass, ":optional"),
    ("open", VariantKind::PseudoClass, "[open]"),
    ("before", VariantKind::PseudoElement, "::before"),
    ("after", VariantKind::PseudoElement, "::after"),
    ("first-letter", VariantKind::PseudoElement, "::first-letter"),
    ("first-line", VariantKind::PseudoElement, "::first-line"),
    ("marker", VariantKind::PseudoElement, "::marker"),
    ("selection", VariantKind::PseudoElement, "::selection"),
    ("file", VariantKind::PseudoElement, "::file-selector-button"),
    ("backdrop", VariantKind::PseudoElement, "::backdrop"),
    ("placeholder", VariantKind::PseudoElement, "::placeholder"),
    ("dark", VariantKind::MediaFeature, "(prefers-color-scheme: dark)"),
    (
        "motion-safe",
        VariantKind::MediaFeature,
        "(prefers-reduced-motion: no-preference)",
    ),
    (
        "motion-reduce",
        VariantKind::MediaFeature,
        "(prefers-reduced-motion: reduce)",
    ),
    ("contrast-more", VariantKind::MediaFeature, "(prefers-contrast: more)"),
    ("contrast-less", VariantKind::MediaFeature, "(prefers-contrast: less)"),
    ("print", VariantKind::MediaFeature, "print"),
    ("portrait", VariantKind::MediaFeature, "(orientation: portrait)"),
    ("landscape", VariantKind::MediaFeature, "(orientation: landscape)"),
];

const ARIA_BOOLEANS: &[&str] = &[
    "busy", "checked", "disabled", "expanded", "hidden", "pressed", "readonly", "required",
    "selected",
];

/// Exact-name lookup over the built-in variant vocabulary.
#[derive(Debug)]
pub struct StaticVariants {
    table: HashMap<&'static str, (VariantKind, &'static str)>,
}

impl StaticVariants {
    pub fn new() -> Self {
        Self {
            table: STATIC_VARIANTS
                .iter()
                .map(|(name, kind, parameter)| (*name, (*kind, *parameter)))
                .collect(),
        }
    }
}

impl Default for StaticVariants {
    fn default() -> Self {
        Self::new()
    }
}

impl VariantMatcher for StaticVariants {
    fn name(&self) -> &'static str {
        "static"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        let (kind, parameter) = self.table.get(segment)?;
        Some(Variant::new(*kind, segment, *parameter))
    }
}

/// Breakpoint names such as `md`, from the configured screens table.
#[derive(Debug)]
pub struct ResponsiveMatcher {
    screens: BTreeMap<String, String>,
}

impl ResponsiveMatcher {
    pub fn new(screens: BTreeMap<String, String>) -> Self {
        Self { screens }
    }
}

impl VariantMatcher for ResponsiveMatcher {
    fn name(&self) -> &'static str {
        "responsive"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        let width = self.screens.get(segment)?;
        Some(Variant::new(VariantKind::Responsive, segment, width.as_str()))
    }
}

#[derive(Debug)]
pub struct AriaMatcher;

impl VariantMatcher for AriaMatcher {
    fn name(&self) -> &'static str {
        "aria"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        let rest = segment.strip_prefix("aria-")?;
        if let Some(inner) = bracket_contents(rest) {
            let clause = attribute_clause("aria", inner)?;
            return Some(Variant::new(VariantKind::Aria, segment, clause));
        }
        if ARIA_BOOLEANS.contains(&rest) {
            return Some(Variant::new(
                VariantKind::Aria,
                segment,
                format!("aria-{}=\"true\"", rest),
            ));
        }
        None
    }
}

#[derive(Debug)]
pub struct DataMatcher;

impl VariantMatcher for DataMatcher {
    fn name(&self) -> &'static str {
        "data"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        let inner = bracket_contents(segment.strip_prefix("data-")?)?;
        let clause = attribute_clause("data", inner)?;
        Some(Variant::new(VariantKind::Data, segment, clause))
    }
}

#[derive(Debug)]
pub struct SupportsMatcher;

impl VariantMatcher for SupportsMatcher {
    fn name(&self) -> &'static str {
        "supports"
    }

    /// `supports-grid` and `supports-[grid]` yield the same condition.
    fn classify(&self, segment: &str) -> Option<Variant> {
        let rest = segment.strip_prefix("supports-")?;
        if let Some(inner) = bracket_contents(rest) {
            let condition = unescape_arbitrary(inner);
            let condition = condition.trim();
            if condition.is_empty() {
                return None;
            }
            return Some(Variant::new(VariantKind::Supports, segment, condition));
        }
        if !is_attribute_name(rest) {
            return None;
        }
        Some(Variant::new(VariantKind::Supports, segment, rest))
    }
}

/// `min-[<length>]` and `max-[<length>]`.
#[derive(Debug)]
pub struct WidthMatcher {
    prefix: &'static str,
    kind: VariantKind,
}

impl WidthMatcher {
    pub fn min() -> Self {
        Self {
            prefix: "min-",
            kind: VariantKind::MinWidth,
        }
    }

    pub fn max() -> Self {
        Self {
            prefix: "max-",
            kind: VariantKind::MaxWidth,
        }
    }
}

impl VariantMatcher for WidthMatcher {
    fn name(&self) -> &'static str {
        self.prefix
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        let inner = bracket_contents(segment.strip_prefix(self.prefix)?)?;
        let length = unescape_arbitrary(inner);
        let length = length.trim();
        if length.is_empty() {
            return None;
        }
        Some(Variant::new(self.kind, segment, length))
    }
}

#[derive(Debug)]
pub struct ArbitraryMediaMatcher;

impl VariantMatcher for ArbitraryMediaMatcher {
    fn name(&self) -> &'static str {
        "arbitrary-media"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        match classify_arbitrary(bracket_contents(segment)?) {
            ArbitraryContent::MediaQuery(query) if !query.is_empty() => {
                Some(Variant::new(VariantKind::ArbitraryMedia, segment, query))
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ArbitrarySelectorMatcher;

impl VariantMatcher for ArbitrarySelectorMatcher {
    fn name(&self) -> &'static str {
        "arbitrary-selector"
    }

    fn classify(&self, segment: &str) -> Option<Variant> {
        match classify_arbitrary(bracket_contents(segment)?) {
            ArbitraryContent::SelectorRewrite(fragment) if is_selector_fragment(&fragment) => {
                Some(Variant::new(VariantKind::ArbitrarySelector, segment, fragment))
            }
            _ => None,
        }
    }
}

/// Ordered, read-only set of variant matchers.
///
/// Exact names are looked up first; otherwise the pattern matchers run in
/// priority order and the first hit wins.
#[derive(Debug)]
pub struct VariantRegistry {
    exact: StaticVariants,
    patterns: Vec<Box<dyn VariantMatcher>>,
}

impl VariantRegistry {
    pub fn new(screens: BTreeMap<String, String>) -> Self {
        Self {
            exact: StaticVariants::new(),
            patterns: vec![
                Box::new(ResponsiveMatcher::new(screens)),
                Box::new(AriaMatcher),
                Box::new(DataMatcher),
                Box::new(SupportsMatcher),
                Box::new(WidthMatcher::min()),
                Box::new(WidthMatcher::max()),
                Box::new(ArbitraryMediaMatcher),
                Box::new(ArbitrarySelectorMatcher),
            ],
        }
    }

    pub fn classify(&self, segment: &str) -> Option<Variant> {
        if let Some(variant) = self.exact.classify(segment) {
            return Some(variant);
        }
        self.patterns.iter().find_map(|matcher| {
            let variant = matcher.classify(segment)?;
            tracing::trace!(segment, matcher = matcher.name(), "variant matched");
            Some(variant)
        })
    }

    pub fn resolve_chain(&self, segments: &[&str]) -> CompileResult<VariantChain> {
        segments
            .iter()
            .map(|segment| {
                self.classify(segment)
                    .ok_or_else(|| CompileError::UnknownVariant {
                        variant: segment.to_string(),
                    })
            })
            .collect::<CompileResult<Vec<_>>>()
            .map(VariantChain::new)
    }

    pub fn matcher_names(&self) -> Vec<&'static str> {
        std::iter::once(self.exact.name())
            .chain(self.patterns.iter().map(|matcher| matcher.name()))
            .collect()
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::new(default_screens())
    }
}

/// Registry over the default screens, built on first use.
pub fn default_registry() -> &'static VariantRegistry {
    static REGISTRY: OnceLock<VariantRegistry> = OnceLock::new();
    REGISTRY.get_or_init(VariantRegistry::default)
}

fn attribute_clause(prefix: &str, inner: &str) -> Option<String> {
    let inner = unescape_arbitrary(inner);
    let inner = inner.trim();
    if inner.is_empty() {
        return None;
    }
    let Some((key, value)) = inner.split_once('=') else {
        return is_attribute_name(inner).then(|| format!("{}-{}", prefix, inner));
    };
    let key = key.trim();
    if !is_attribute_name(key) || value.trim().is_empty() {
        return None;
    }
    Some(format!("{}-{}={}", prefix, key, quote_attribute_value(value)))
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
