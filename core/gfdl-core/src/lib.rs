//! gfdl-core: Google Fonts catalog, stylesheets and downloads
//!
//! Somewhere out there, a thousand-odd font families are waiting in a
//! catalog. This crate goes and asks for the list, picks the faces you care
//! about, writes the `@font-face` rules a browser needs to meet them, and
//! brings the files home to a folder of their own.
//!
//! Three small pieces that share one record type and one naming rule:
//!
//! - [`catalog`]: one GET against the font-listing API, parsed into
//!   [`FontRecord`]s or a typed [`Error`].
//! - [`css`]: one `@font-face` rule per variant (and per subset when subsets
//!   are requested), optionally minified, written next to the fonts.
//! - [`download`]: fetches each variant's file in turn, skipping files that
//!   already exist and collecting per-variant failures instead of stopping.
//!
//! File names come from [`variant::font_file_name`] in both the stylesheet
//! and the downloader, so every `src: url(...)` points at a file that was
//! actually written.
//!
//! ## A Sample Session
//!
//! ```rust,no_run
//! use std::path::Path;
//! use gfdl_core::catalog::CatalogClient;
//! use gfdl_core::css::{write_stylesheet, CssOptions};
//! use gfdl_core::download::FontDownloader;
//! use gfdl_core::errlog::LogSink;
//! use gfdl_core::variant::FontFormat;
//!
//! # async fn demo() -> gfdl_core::Result<()> {
//! let fonts = CatalogClient::new()?.fetch_catalog("my-api-key", true).await?;
//! let roboto = fonts.iter().find(|f| f.family == "Roboto").expect("listed");
//! let picked = roboto.select_variants(&["regular", "700italic"])?;
//!
//! let dest = Path::new("GoogleFonts");
//! let options = CssOptions::new(FontFormat::Woff2).with_subsets(["latin"]);
//! write_stylesheet(&picked, dest, &options)?;
//! FontDownloader::new()?
//!     .download_fonts(&picked, dest, FontFormat::Woff2, &LogSink)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ---
//!
//! Crafted with care at FontLab https://www.fontlab.com/

pub mod catalog;
pub mod css;
pub mod download;
pub mod errlog;
pub mod error;
pub mod model;
pub mod output;
pub mod settings;
pub mod variant;

pub use error::{
    AggregateDownloadError, Error, Result, VariantDownloadError, VariantFailure,
};
pub use model::{ApiError, CatalogResponse, FontFiles, FontRecord};
