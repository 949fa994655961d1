//! `@font-face` stylesheet generation (made by FontLab https://www.fontlab.com/)
//!
//! Every downloaded face deserves an introduction. This module writes the
//! little letters of introduction browsers read before they meet a font:
//! one `@font-face` rule per variant, pointing at exactly the file the
//! downloader puts on disk. Minified stylesheets go through a real CSS
//! parser, and we count the rules on the way out so nothing gets lost in
//! the squeeze.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::FontRecord;
use crate::variant::{family_slug, file_name_for, FontFormat, Variant};

/// How the stylesheet should be rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOptions {
    pub format: FontFormat,
    pub minify: bool,
    /// Subset tags to annotate; one block per variant and subset. Empty
    /// means one block per variant without annotations.
    pub subsets: Vec<String>,
}

impl CssOptions {
    pub fn new(format: FontFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn minify(mut self, yes: bool) -> Self {
        self.minify = yes;
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
}

/// A single `@font-face` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub variant: Variant,
    pub file_name: String,
    pub format: FontFormat,
    /// Rendered as a comment right before the rule.
    pub subset: Option<String>,
}

impl FontFace {
    pub fn new(family: &str, token: &str, format: FontFormat, subset: Option<&str>) -> Self {
        let variant = Variant::parse(token);
        Self {
            family: family.to_string(),
            file_name: file_name_for(family, &variant, format),
            variant,
            format,
            subset: subset.map(str::to_string),
        }
    }
}

impl fmt::Display for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subset) = &self.subset {
            writeln!(f, "/*{}*/", comment_text(subset))?;
        }
        writeln!(f, "@font-face {{")?;
        writeln!(f, "  font-family: '{}';", escape_css_string(&self.family))?;
        writeln!(f, "  font-style: {};", self.variant.css_style())?;
        writeln!(f, "  font-weight: {};", self.variant.weight)?;
        writeln!(f, "  font-display: swap;")?;
        writeln!(f, "  font-stretch: normal;")?;
        let url = escape_css_string(&self.file_name);
        match self.format.css_hint() {
            Some(hint) => writeln!(f, "  src: url('{url}') format('{hint}');")?,
            None => writeln!(f, "  src: url('{url}');")?,
        }
        writeln!(f, "}}")
    }
}

/// Quote-safe body of a single-quoted CSS string. Control characters
/// become hex escapes, since a raw newline ends the string token.
fn escape_css_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' | '\'' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}

fn comment_text(raw: &str) -> String {
    raw.replace("*/", "")
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Expand the record's variants (times the requested subsets) into rules.
pub fn font_faces(font: &FontRecord, options: &CssOptions) -> Vec<FontFace> {
    font.variants
        .iter()
        .flat_map(|token| {
            if options.subsets.is_empty() {
                vec![FontFace::new(&font.family, token, options.format, None)]
            } else {
                options
                    .subsets
                    .iter()
                    .map(|subset| {
                        FontFace::new(&font.family, token, options.format, Some(subset))
                    })
                    .collect()
            }
        })
        .collect()
}

/// Render the stylesheet text. Returns an empty string when the record has
/// no variants.
pub fn generate_css(font: &FontRecord, options: &CssOptions) -> Result<String> {
    let faces = font_faces(font, options);
    if faces.is_empty() {
        return Ok(String::new());
    }

    let pretty = faces
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    if !options.minify {
        return Ok(pretty);
    }

    let minified = minify_css(&pretty)?;
    verify_minified(&faces, &minified)?;
    Ok(minified)
}

/// The minifier drops descriptors it cannot parse without reporting them,
/// so count what came out against what went in.
fn verify_minified(faces: &[FontFace], minified: &str) -> Result<()> {
    for descriptor in ["font-family:", "src:"] {
        let found = minified.matches(descriptor).count();
        if found != faces.len() {
            return Err(Error::Minification(format!(
                "expected {} `{descriptor}` declarations after minifying, found {found}",
                faces.len()
            )));
        }
    }
    if let Some(face) = faces.iter().find(|f| !minified.contains(&f.file_name)) {
        return Err(Error::Minification(format!(
            "minified stylesheet lost the reference to {}",
            face.file_name
        )));
    }
    Ok(())
}

/// Parse and reprint `css` minified. Comments do not survive.
pub fn minify_css(css: &str) -> Result<String> {
    let sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|err| Error::Minification(err.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|err| Error::Minification(err.to_string()))?;
    Ok(printed.code)
}

/// `<destination>/<FamilyNoSpaces>/<FamilyNoSpaces>[.min].css`
pub fn stylesheet_path(destination: &Path, family: &str, minify: bool) -> PathBuf {
    let slug = family_slug(family);
    let suffix = if minify { ".min" } else { "" };
    destination.join(&slug).join(format!("{slug}{suffix}.css"))
}

/// Generate and write the stylesheet. Nothing is written, and `None`
/// returned, when no rule would be generated.
pub fn write_stylesheet(
    font: &FontRecord,
    destination: &Path,
    options: &CssOptions,
) -> Result<Option<PathBuf>> {
    if destination.as_os_str().is_empty() {
        return Err(Error::validation("choose a destination folder"));
    }

    let css = generate_css(font, options).map_err(|err| {
        warn!("failed to create CSS for {}: {err}", font.family);
        err
    })?;
    if css.is_empty() {
        debug!("no variants selected for {}, skipping stylesheet", font.family);
        return Ok(None);
    }

    let path = stylesheet_path(destination, &font.family, options.minify);
    if let Some(folder) = path.parent() {
        fs::create_dir_all(folder)
            .map_err(|e| Error::io(format!("creating {}", folder.display()), e))?;
    }
    fs::write(&path, css).map_err(|e| Error::io(format!("writing {}", path.display()), e))?;

    debug!("wrote stylesheet {}", path.display());
    Ok(Some(path))
}
