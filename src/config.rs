use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub type Palette = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    /// Plugin name to enabled flag. Plugins not listed are enabled.
    #[serde(default, alias = "corePlugins")]
    pub core_plugins: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Theme {
    #[serde(default = "default_theme_name")]
    pub name: String,
    /// Breakpoint name to minimum width. Replaces the defaults when present.
    #[serde(default)]
    pub screens: BTreeMap<String, String>,
    /// Extra color families, merged over the built-in palette.
    #[serde(default)]
    pub colors: Palette,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|err| ConfigError {
        message: format!("failed to read config {}: {}", path.display(), err),
    })?;
    toml::from_str(&text).map_err(|err| ConfigError {
        message: format!("failed to parse config {}: {}", path.display(), err),
    })
}

pub fn resolve_screens(config: &Config) -> BTreeMap<String, String> {
    if config.theme.screens.is_empty() {
        return default_screens();
    }
    config.theme.screens.clone()
}

pub fn resolve_palette(config: &Config) -> Palette {
    let mut palette = default_palette();
    for (family, shades) in &config.theme.colors {
        palette
            .entry(family.clone())
            .or_default()
            .extend(shades.iter().map(|(shade, value)| (shade.clone(), value.clone())));
    }
    palette
}

pub fn default_screens() -> BTreeMap<String, String> {
    [
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ]
    .into_iter()
    .map(|(name, width)| (name.to_string(), width.to_string()))
    .collect()
}

const DEFAULT_PALETTE: &[(&str, [&str; 10])] = &[
    (
        "gray",
        [
            "#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563",
            "#374151", "#1f2937", "#111827",
        ],
    ),
    (
        "red",
        [
            "#fef2f2", "#fee2e2", "#fecaca", "#fca5a5", "#f87171", "#ef4444", "#dc2626",
            "#b91c1c", "#991b1b", "#7f1d1d",
        ],
    ),
    (
        "yellow",
        [
            "#fefce8", "#fef9c3", "#fef08a", "#fde047", "#facc15", "#eab308", "#ca8a04",
            "#a16207", "#854d0e", "#713f12",
        ],
    ),
    (
        "green",
        [
            "#f0fdf4", "#dcfce7", "#bbf7d0", "#86efac", "#4ade80", "#22c55e", "#16a34a",
            "#15803d", "#166534", "#14532d",
        ],
    ),
    (
        "blue",
        [
            "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb",
            "#1d4ed8", "#1e40af", "#1e3a8a",
        ],
    ),
    (
        "indigo",
        [
            "#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#4f46e5",
            "#4338ca", "#3730a3", "#312e81",
        ],
    ),
];

const SHADES: [&str; 10] = [
    "50", "100", "200", "300", "400", "500", "600", "700", "800", "900",
];

pub fn default_palette() -> Palette {
    DEFAULT_PALETTE
        .iter()
        .map(|(family, values)| {
            let shades = SHADES
                .iter()
                .zip(values.iter())
                .map(|(shade, value)| (shade.to_string(), value.to_string()))
                .collect();
            (family.to_string(), shades)
        })
        .collect()
}

fn default_theme_name() -> String {
    "default".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: default_theme_name(),
            screens: BTreeMap::new(),
            colors: BTreeMap::new(),
        }
    }
}
