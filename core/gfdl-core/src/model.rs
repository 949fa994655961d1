//! Catalog data model (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::variant::{normalize_token, Variant};

/// One family as listed by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRecord {
    pub family: String,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub subsets: Vec<String>,
    #[serde(default)]
    pub files: FontFiles,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl FontRecord {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            variants: Vec::new(),
            subsets: Vec::new(),
            files: FontFiles::default(),
            category: None,
            version: None,
            last_modified: None,
            kind: None,
        }
    }

    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subsets<I, S>(mut self, subsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsets = subsets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_files(mut self, files: FontFiles) -> Self {
        self.files = files;
        self
    }

    /// Derive a record narrowed to `selected`. Each selection must name a
    /// variant the family offers; `400` and `regular` are interchangeable.
    /// The record's own spelling of each token is kept.
    pub fn select_variants<S: AsRef<str>>(&self, selected: &[S]) -> Result<FontRecord> {
        let mut narrowed = Vec::with_capacity(selected.len());

        for wanted in selected {
            let wanted = wanted.as_ref();
            let parsed = Variant::parse(wanted);
            let offered = self
                .variants
                .iter()
                .find(|v| Variant::parse(v) == parsed)
                .ok_or_else(|| {
                    Error::validation(format!(
                        "{} does not offer variant {wanted:?} (available: {})",
                        self.family,
                        self.variants.join(", ")
                    ))
                })?;
            if !narrowed.contains(offered) {
                narrowed.push(offered.clone());
            }
        }

        if narrowed.is_empty() {
            return Err(Error::validation("choose at least one font variant"));
        }

        let mut derived = self.clone();
        derived.variants = narrowed;
        Ok(derived)
    }

    /// Check requested subset tags against the family's coverage.
    pub fn check_subsets<S: AsRef<str>>(&self, subsets: &[S]) -> Result<Vec<String>> {
        subsets
            .iter()
            .map(|s| {
                let s = s.as_ref().trim();
                if self.subsets.iter().any(|known| known == s) {
                    Ok(s.to_string())
                } else {
                    Err(Error::validation(format!(
                        "{} has no subset {s:?} (available: {})",
                        self.family,
                        self.subsets.join(", ")
                    )))
                }
            })
            .collect()
    }
}

/// Variant token to source URL, keyed by the provider's own tokens
/// (`regular`, `italic`, `700`, `700italic`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontFiles(BTreeMap<String, String>);

impl FontFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, url: impl Into<String>) {
        self.0.insert(token.into(), url.into());
    }

    /// Resolve the source URL of a token; `regular`/`400` and
    /// `italic`/`400italic` are aliases. Empty URLs count as missing.
    pub fn url_for(&self, token: &str) -> Option<&str> {
        let variant = Variant::parse(token);
        [
            normalize_token(token),
            variant.provider_key(),
            variant.numeric_key(),
        ]
        .iter()
        .find_map(|key| self.0.get(key))
        .map(String::as_str)
        .filter(|url| !url.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FontFiles {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Structured error payload reported by the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Raw body of the catalog endpoint: `{ items }` or `{ error }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<FontRecord>>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

impl CatalogResponse {
    /// An embedded error wins over any items that came with it.
    pub fn into_result(self) -> Result<Vec<FontRecord>> {
        match self.error {
            Some(err) => Err(Error::Api {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.items.unwrap_or_default()),
        }
    }
}
