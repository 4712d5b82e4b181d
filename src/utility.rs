//! Base utilities: what a class name such as `bg-blue-500` declares.
//!
//! The engine treats a [`Utility`] as opaque. [`CoreUtilities`] is the built-in
//! catalog; anything implementing [`UtilityResolver`] can replace it.

use crate::arbitrary::{bracket_contents, quote_attribute_value, unescape_arbitrary};
use crate::config::{Config, Palette, resolve_palette};
use crate::escape::escape_class_name;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utility {
    /// Selector containing the escaped utility class (`.flex`) exactly once.
    pub selector_template: String,
    pub declarations: Vec<Declaration>,
}

impl Utility {
    pub fn for_class(class: &str, declarations: Vec<Declaration>) -> Self {
        Self {
            selector_template: format!(".{}", escape_class_name(class)),
            declarations,
        }
    }
}

pub trait UtilityResolver: Send + Sync {
    fn resolve(&self, class: &str) -> Option<Utility>;
}

type Generator = fn(&CoreUtilities, &str, bool) -> Option<Vec<Declaration>>;

// Earlier entries win where prefixes overlap (`content-none` before
// `content-center`, `text-left` before `text-red-500`).
const GENERATORS: &[(&str, Generator)] = &[
    ("display", CoreUtilities::display),
    ("visibility", CoreUtilities::visibility),
    ("wordBreak", CoreUtilities::word_break),
    ("textAlign", CoreUtilities::text_align),
    ("fontSize", CoreUtilities::font_size),
    ("fontWeight", CoreUtilities::font_weight),
    ("opacity", CoreUtilities::opacity),
    ("content", CoreUtilities::content),
    ("placeContent", CoreUtilities::place_content),
    ("placeItems", CoreUtilities::place_items),
    ("alignContent", CoreUtilities::align_content),
    ("gridAutoFlow", CoreUtilities::grid_auto_flow),
    ("mixBlendMode", CoreUtilities::mix_blend_mode),
    ("borderSpacing", CoreUtilities::border_spacing),
    ("outlineOffset", CoreUtilities::outline_offset),
    ("rotate", CoreUtilities::rotate),
    ("backdropBlur", CoreUtilities::backdrop_blur),
    ("padding", CoreUtilities::padding),
    ("margin", CoreUtilities::margin),
    ("fill", CoreUtilities::fill),
    ("stroke", CoreUtilities::stroke),
    ("textColor", CoreUtilities::text_color),
    ("backgroundColor", CoreUtilities::background_color),
    ("borderColor", CoreUtilities::border_color),
];

const TRANSFORM_VALUE: &str = "translate(var(--tw-translate-x), var(--tw-translate-y)) rotate(var(--tw-rotate)) skewX(var(--tw-skew-x)) skewY(var(--tw-skew-y)) scaleX(var(--tw-scale-x)) scaleY(var(--tw-scale-y))";

const BACKDROP_FILTER_VALUE: &str = "var(--tw-backdrop-blur) var(--tw-backdrop-brightness) var(--tw-backdrop-contrast) var(--tw-backdrop-grayscale) var(--tw-backdrop-hue-rotate) var(--tw-backdrop-invert) var(--tw-backdrop-opacity) var(--tw-backdrop-saturate) var(--tw-backdrop-sepia)";

const SPACING_STEPS: &[&str] = &[
    "0.5", "1", "1.5", "2", "2.5", "3", "3.5", "4", "5", "6", "7", "8", "9", "10", "11", "12",
    "14", "16", "20", "24", "28", "32", "36", "40", "44", "48", "52", "56", "60", "64", "72",
    "80", "96",
];

/// The built-in utility catalog, gated by core-plugin toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreUtilities {
    palette: Palette,
    disabled_plugins: BTreeSet<String>,
}

impl CoreUtilities {
    pub fn new(config: &Config) -> Self {
        Self {
            palette: resolve_palette(config),
            disabled_plugins: config
                .core_plugins
                .iter()
                .filter(|(_, enabled)| !**enabled)
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }

    pub fn is_enabled(&self, plugin: &str) -> bool {
        !self.disabled_plugins.contains(plugin)
    }

    fn display(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class {
            "block" => "block",
            "inline-block" => "inline-block",
            "inline" => "inline",
            "flex" => "flex",
            "inline-flex" => "inline-flex",
            "table" => "table",
            "table-row" => "table-row",
            "table-cell" => "table-cell",
            "flow-root" => "flow-root",
            "grid" => "grid",
            "inline-grid" => "inline-grid",
            "contents" => "contents",
            "list-item" => "list-item",
            "hidden" => "none",
            _ => return None,
        };
        single("display", value)
    }

    fn visibility(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class {
            "visible" => "visible",
            "invisible" => "hidden",
            "collapse" => "collapse",
            _ => return None,
        };
        single("visibility", value)
    }

    fn word_break(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        match class {
            "break-normal" => Some(vec![
                Declaration::new("overflow-wrap", "normal"),
                Declaration::new("word-break", "normal"),
            ]),
            "break-words" => single("overflow-wrap", "break-word"),
            "break-all" => single("word-break", "break-all"),
            "break-keep" => single("word-break", "keep-all"),
            _ => None,
        }
    }

    fn text_align(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = class.strip_prefix("text-")?;
        match value {
            "left" | "center" | "right" | "justify" | "start" | "end" => {
                single("text-align", value)
            }
            _ => None,
        }
    }

    fn font_size(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let (size, line_height) = match class.strip_prefix("text-")? {
            "xs" => ("0.75rem", "1rem"),
            "sm" => ("0.875rem", "1.25rem"),
            "base" => ("1rem", "1.5rem"),
            "lg" => ("1.125rem", "1.75rem"),
            "xl" => ("1.25rem", "1.75rem"),
            "2xl" => ("1.5rem", "2rem"),
            "3xl" => ("1.875rem", "2.25rem"),
            "4xl" => ("2.25rem", "2.5rem"),
            "5xl" => ("3rem", "1"),
            "6xl" => ("3.75rem", "1"),
            "7xl" => ("4.5rem", "1"),
            "8xl" => ("6rem", "1"),
            "9xl" => ("8rem", "1"),
            _ => return None,
        };
        Some(vec![
            Declaration::new("font-size", size),
            Declaration::new("line-height", line_height),
        ])
    }

    fn font_weight(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class.strip_prefix("font-")? {
            "thin" => "100",
            "extralight" => "200",
            "light" => "300",
            "normal" => "400",
            "medium" => "500",
            "semibold" => "600",
            "bold" => "700",
            "extrabold" => "800",
            "black" => "900",
            _ => return None,
        };
        single("font-weight", value)
    }

    fn opacity(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let raw = class.strip_prefix("opacity-")?;
        if let Some(value) = arbitrary_value(raw) {
            return single("opacity", value);
        }
        let percent = raw.parse::<u32>().ok()?;
        if percent > 100 || percent % 5 != 0 {
            return None;
        }
        single("opacity", format!("{}", f64::from(percent) / 100.0))
    }

    fn content(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let raw = class.strip_prefix("content-")?;
        let value = if raw == "none" {
            "none".to_string()
        } else {
            let value = arbitrary_value(raw)?;
            if value.starts_with('\'') || value.starts_with('"') {
                quote_attribute_value(&value)
            } else {
                value
            }
        };
        Some(vec![
            Declaration::new("--tw-content", value),
            Declaration::new("content", "var(--tw-content)"),
        ])
    }

    fn place_content(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class.strip_prefix("place-content-")? {
            "center" => "center",
            "start" => "start",
            "end" => "end",
            "between" => "space-between",
            "around" => "space-around",
            "evenly" => "space-evenly",
            "baseline" => "baseline",
            "stretch" => "stretch",
            _ => return None,
        };
        single("place-content", value)
    }

    fn place_items(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = class.strip_prefix("place-items-")?;
        match value {
            "start" | "end" | "center" | "baseline" | "stretch" => single("place-items", value),
            _ => None,
        }
    }

    fn align_content(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class.strip_prefix("content-")? {
            "center" => "center",
            "start" => "flex-start",
            "end" => "flex-end",
            "between" => "space-between",
            "around" => "space-around",
            "evenly" => "space-evenly",
            "baseline" => "baseline",
            _ => return None,
        };
        single("align-content", value)
    }

    fn grid_auto_flow(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = match class.strip_prefix("grid-flow-")? {
            "row" => "row",
            "col" => "column",
            "dense" => "dense",
            "row-dense" => "row dense",
            "col-dense" => "column dense",
            _ => return None,
        };
        single("grid-auto-flow", value)
    }

    fn mix_blend_mode(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = class.strip_prefix("mix-blend-")?;
        match value {
            "normal" | "multiply" | "screen" | "overlay" | "darken" | "lighten"
            | "color-dodge" | "color-burn" | "hard-light" | "soft-light" | "difference"
            | "exclusion" | "hue" | "saturation" | "color" | "luminosity" | "plus-lighter" => {
                single("mix-blend-mode", value)
            }
            _ => None,
        }
    }

    fn border_spacing(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let raw = class.strip_prefix("border-spacing-")?;
        let shorthand = Declaration::new(
            "border-spacing",
            "var(--tw-border-spacing-x) var(--tw-border-spacing-y)",
        );
        if let Some(token) = raw.strip_prefix("x-") {
            let value = spacing_value(token)?;
            return Some(vec![
                Declaration::new("--tw-border-spacing-x", value),
                shorthand,
            ]);
        }
        if let Some(token) = raw.strip_prefix("y-") {
            let value = spacing_value(token)?;
            return Some(vec![
                Declaration::new("--tw-border-spacing-y", value),
                shorthand,
            ]);
        }
        let value = spacing_value(raw)?;
        Some(vec![
            Declaration::new("--tw-border-spacing-x", value.clone()),
            Declaration::new("--tw-border-spacing-y", value),
            shorthand,
        ])
    }

    fn outline_offset(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        let raw = class.strip_prefix("outline-offset-")?;
        let value = match raw {
            "0" | "1" | "2" | "4" | "8" => format!("{}px", raw),
            _ => arbitrary_value(raw)?,
        };
        single("outline-offset", signed(value, negative))
    }

    fn rotate(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        let raw = class.strip_prefix("rotate-")?;
        let value = match raw {
            "0" | "1" | "2" | "3" | "6" | "12" | "45" | "90" | "180" => format!("{}deg", raw),
            _ => arbitrary_value(raw)?,
        };
        Some(vec![
            Declaration::new("--tw-rotate", signed(value, negative)),
            Declaration::new("transform", TRANSFORM_VALUE),
        ])
    }

    fn backdrop_blur(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let radius = match class {
            "backdrop-blur" => "8px".to_string(),
            _ => match class.strip_prefix("backdrop-blur-")? {
                "none" => "0".to_string(),
                "sm" => "4px".to_string(),
                "md" => "12px".to_string(),
                "lg" => "16px".to_string(),
                "xl" => "24px".to_string(),
                "2xl" => "40px".to_string(),
                "3xl" => "64px".to_string(),
                raw => arbitrary_value(raw)?,
            },
        };
        Some(vec![
            Declaration::new("--tw-backdrop-blur", format!("blur({})", radius)),
            Declaration::new("-webkit-backdrop-filter", BACKDROP_FILTER_VALUE),
            Declaration::new("backdrop-filter", BACKDROP_FILTER_VALUE),
        ])
    }

    fn padding(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let (prefix, token) = class.split_once('-')?;
        let properties = box_sides("padding", prefix.strip_prefix('p')?)?;
        let value = spacing_value(token)?;
        Some(
            properties
                .into_iter()
                .map(|property| Declaration::new(property, value.clone()))
                .collect(),
        )
    }

    fn margin(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        let (prefix, token) = class.split_once('-')?;
        let properties = box_sides("margin", prefix.strip_prefix('m')?)?;
        let value = if token == "auto" && !negative {
            "auto".to_string()
        } else {
            signed(spacing_value(token)?, negative)
        };
        Some(
            properties
                .into_iter()
                .map(|property| Declaration::new(property, value.clone()))
                .collect(),
        )
    }

    fn fill(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if class == "fill-none" && !negative {
            return single("fill", "none");
        }
        self.color_utility(class, negative, "fill-", "fill", None)
    }

    fn stroke(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        if class == "stroke-none" && !negative {
            return single("stroke", "none");
        }
        self.color_utility(class, negative, "stroke-", "stroke", None)
    }

    fn text_color(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        self.color_utility(class, negative, "text-", "color", Some("--tw-text-opacity"))
    }

    fn background_color(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        self.color_utility(
            class,
            negative,
            "bg-",
            "background-color",
            Some("--tw-bg-opacity"),
        )
    }

    fn border_color(&self, class: &str, negative: bool) -> Option<Vec<Declaration>> {
        self.color_utility(
            class,
            negative,
            "border-",
            "border-color",
            Some("--tw-border-opacity"),
        )
    }

    fn color_utility(
        &self,
        class: &str,
        negative: bool,
        prefix: &str,
        property: &str,
        opacity_variable: Option<&str>,
    ) -> Option<Vec<Declaration>> {
        if negative {
            return None;
        }
        let value = self.color_value(class.strip_prefix(prefix)?)?;
        match (opacity_variable, hex_channels(&value)) {
            (Some(variable), Some(channels)) => Some(vec![
                Declaration::new(variable, "1"),
                Declaration::new(
                    property,
                    format!("rgb({} / var({}))", channels, variable),
                ),
            ]),
            _ => single(property, value),
        }
    }

    fn color_value(&self, token: &str) -> Option<String> {
        if let Some(value) = arbitrary_value(token) {
            return is_color_like_value(&value).then_some(value);
        }
        let named = match token {
            "black" => Some("#000"),
            "white" => Some("#fff"),
            "transparent" => Some("transparent"),
            "current" => Some("currentColor"),
            "inherit" => Some("inherit"),
            _ => None,
        };
        if let Some(value) = named {
            return Some(value.to_string());
        }
        let (family, shade) = token.rsplit_once('-')?;
        self.palette.get(family)?.get(shade).cloned()
    }
}

impl Default for CoreUtilities {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl UtilityResolver for CoreUtilities {
    fn resolve(&self, class: &str) -> Option<Utility> {
        let (name, negative) = match class.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (class, false),
        };
        if name.is_empty() {
            return None;
        }
        GENERATORS
            .iter()
            .filter(|(plugin, _)| self.is_enabled(plugin))
            .find_map(|(_, generate)| generate(self, name, negative))
            .map(|declarations| Utility::for_class(class, declarations))
    }
}

fn single(property: &str, value: impl Into<String>) -> Option<Vec<Declaration>> {
    Some(vec![Declaration::new(property, value)])
}

fn arbitrary_value(raw: &str) -> Option<String> {
    let inner = bracket_contents(raw)?;
    let value = unescape_arbitrary(inner);
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

fn spacing_value(token: &str) -> Option<String> {
    match token {
        "0" => return Some("0px".to_string()),
        "px" => return Some("1px".to_string()),
        _ => {}
    }
    if let Some(value) = arbitrary_value(token) {
        return Some(value);
    }
    if !SPACING_STEPS.contains(&token) {
        return None;
    }
    let step = token.parse::<f64>().ok()?;
    Some(format!("{}rem", step * 0.25))
}

/// Negates a length for `-` prefixed classes. Zero stays as it is and values
/// that start with a function or keyword are negated through `calc`.
fn signed(value: String, negative: bool) -> String {
    let is_zero = value.starts_with(['0', '.'])
        && value
            .trim_start_matches(['0', '.'])
            .chars()
            .next()
            .is_none_or(|ch| !ch.is_ascii_digit());
    if !negative || is_zero {
        return value;
    }
    if value.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return format!("calc({} * -1)", value);
    }
    match value.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{}", value),
    }
}

fn box_sides(property: &str, side: &str) -> Option<Vec<String>> {
    let sides: &[&str] = match side {
        "" => &[""],
        "x" => &["-left", "-right"],
        "y" => &["-top", "-bottom"],
        "t" => &["-top"],
        "r" => &["-right"],
        "b" => &["-bottom"],
        "l" => &["-left"],
        _ => return None,
    };
    Some(
        sides
            .iter()
            .map(|suffix| format!("{}{}", property, suffix))
            .collect(),
    )
}

fn is_color_like_value(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    raw.starts_with('#')
        || lower.starts_with("rgb(")
        || lower.starts_with("rgba(")
        || lower.starts_with("hsl(")
        || lower.starts_with("hsla(")
        || lower.starts_with("oklch(")
        || lower.starts_with("color(")
        || lower.starts_with("var(")
        || lower == "currentcolor"
        || lower == "transparent"
        || lower == "inherit"
}

/// `#3b82f6` to `59 130 246`; `None` for anything that is not a hex color.
fn hex_channels(value: &str) -> Option<String> {
    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match hex.len() {
        3 => hex.chars().flat_map(|ch| [ch, ch]).collect::<String>(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |idx: usize| u8::from_str_radix(&expanded[idx..idx + 2], 16).ok();
    Some(format!("{} {} {}", channel(0)?, channel(2)?, channel(4)?))
}
