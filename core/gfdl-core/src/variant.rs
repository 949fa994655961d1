//! Variant tokens, weight names and on-disk file naming (made by FontLab https://www.fontlab.com/)
//!
//! The stylesheet generator and the downloader both name files through
//! [`font_file_name`], so a `src: url(...)` always points at the file the
//! downloader writes.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical display names for the nine standard weights.
pub const WEIGHT_NAMES: [(u16, &str); 9] = [
    (100, "Thin"),
    (200, "ExtraLight"),
    (300, "Light"),
    (400, "Regular"),
    (500, "Medium"),
    (600, "SemiBold"),
    (700, "Bold"),
    (800, "ExtraBold"),
    (900, "Black"),
];

const DEFAULT_WEIGHT: u16 = 400;

/// Look up the display name of a standard weight.
pub fn weight_name(weight: u16) -> Option<&'static str> {
    WEIGHT_NAMES
        .iter()
        .find(|(w, _)| *w == weight)
        .map(|(_, name)| *name)
}

/// File format of the downloaded faces.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFormat {
    #[default]
    Ttf,
    Woff2,
}

impl FontFormat {
    pub fn from_compressed(compressed: bool) -> Self {
        if compressed {
            FontFormat::Woff2
        } else {
            FontFormat::Ttf
        }
    }

    pub fn is_compressed(self) -> bool {
        self == FontFormat::Woff2
    }

    pub fn extension(self) -> &'static str {
        match self {
            FontFormat::Ttf => "ttf",
            FontFormat::Woff2 => "woff2",
        }
    }

    /// Value for the CSS `format()` hint; TTF sources carry none.
    pub fn css_hint(self) -> Option<&'static str> {
        match self {
            FontFormat::Ttf => None,
            FontFormat::Woff2 => Some("woff2"),
        }
    }
}

/// A parsed weight/style token such as `700italic` or `regular`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Variant {
    pub weight: u16,
    pub italic: bool,
}

impl Variant {
    pub fn new(weight: u16, italic: bool) -> Self {
        Self { weight, italic }
    }

    /// Parse a provider token. Never fails: tokens without a usable number
    /// fall back to weight 400, and `italic` anywhere in the token marks the
    /// italic style.
    pub fn parse(token: &str) -> Self {
        let normalized = normalize_token(token).to_ascii_lowercase();
        let italic = normalized.contains("italic");

        if normalized == "regular" {
            return Self::new(DEFAULT_WEIGHT, false);
        }

        let weight = token_pattern()
            .captures(&normalized)
            .and_then(|caps| caps.name("weight"))
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .unwrap_or(DEFAULT_WEIGHT);

        Self::new(weight, italic)
    }

    /// Key under which the provider lists this face in its `files` map.
    pub fn provider_key(&self) -> String {
        match (self.weight, self.italic) {
            (DEFAULT_WEIGHT, false) => "regular".to_string(),
            (DEFAULT_WEIGHT, true) => "italic".to_string(),
            (w, false) => w.to_string(),
            (w, true) => format!("{w}italic"),
        }
    }

    /// Purely numeric spelling (`400`, `400italic`), accepted as an alias.
    pub fn numeric_key(&self) -> String {
        if self.italic {
            format!("{}italic", self.weight)
        } else {
            self.weight.to_string()
        }
    }

    pub fn css_style(&self) -> &'static str {
        if self.italic {
            "italic"
        } else {
            "normal"
        }
    }

    /// Display name used in file names, `Regular` for non-standard weights.
    pub fn weight_name(&self) -> &'static str {
        weight_name(self.weight).unwrap_or("Regular")
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.provider_key())
    }
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?P<weight>\d{1,4})?(?:italic)?$").expect("valid regex"))
}

/// Strip internal whitespace (`"400 italic"` becomes `"400italic"`).
pub fn normalize_token(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Family name with spaces removed; used for folder and file names.
pub fn family_slug(family: &str) -> String {
    family.chars().filter(|c| *c != ' ').collect()
}

/// `<FamilyNoSpaces>-<WeightName>[Italic].<ext>`
pub fn font_file_name(family: &str, token: &str, format: FontFormat) -> String {
    file_name_for(family, &Variant::parse(token), format)
}

pub fn file_name_for(family: &str, variant: &Variant, format: FontFormat) -> String {
    let italic = if variant.italic { "Italic" } else { "" };
    format!(
        "{}-{}{}.{}",
        family_slug(family),
        variant.weight_name(),
        italic,
        format.extension()
    )
}
