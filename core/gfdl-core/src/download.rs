//! Sequential font file downloader (made by FontLab https://www.fontlab.com/)
//!
//! Variants are fetched one after another with a short pause in between so
//! a single run never holds more than one connection to the font host. A
//! failing variant is recorded and skipped; the run only fails when every
//! variant failed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::errlog::{Failure, FailureSink};
use crate::error::{
    AggregateDownloadError, Error, Result, VariantDownloadError, VariantFailure,
};
use crate::model::FontRecord;
use crate::variant::{family_slug, font_file_name, normalize_token, FontFormat};

pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const POLITE_DELAY: Duration = Duration::from_millis(100);

/// What happened to each selected variant.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub downloaded: Vec<PathBuf>,
    /// Files that were already present and left untouched.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<VariantDownloadError>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Downloaded(PathBuf),
    AlreadyPresent(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FontDownloader {
    http: reqwest::Client,
    delay: Duration,
}

impl FontDownloader {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gfdl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::from_request)?;
        Ok(Self {
            http,
            delay: POLITE_DELAY,
        })
    }

    /// Pause inserted after each file actually fetched.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Download every variant of `font` into `<destination>/<FamilyNoSpaces>/`.
    pub async fn download_fonts(
        &self,
        font: &FontRecord,
        destination: &Path,
        format: FontFormat,
        sink: &dyn FailureSink,
    ) -> Result<DownloadReport> {
        if destination.as_os_str().is_empty() {
            return Err(Error::validation("choose a destination folder"));
        }
        if font.variants.is_empty() {
            return Err(Error::validation("choose at least one font variant to download"));
        }

        let folder = destination.join(family_slug(&font.family));
        let mut report = DownloadReport::default();

        for raw in &font.variants {
            let token = normalize_token(raw);
            match self.download_variant(font, &token, &folder, format).await {
                Ok(Outcome::Downloaded(path)) => {
                    debug!("downloaded {}", path.display());
                    report.downloaded.push(path);
                    tokio::time::sleep(self.delay).await;
                }
                Ok(Outcome::AlreadyPresent(path)) => {
                    debug!("{} already exists, skipping", path.display());
                    report.skipped.push(path);
                }
                Err(cause) => {
                    let failure = VariantDownloadError {
                        variant: token.clone(),
                        cause,
                    };
                    let message = format!("Error downloading variant {token}");
                    sink.record_failure(Failure::new(&message, &failure));
                    report.failures.push(failure);
                }
            }
        }

        let failed = report.failures.len();
        let total = font.variants.len();
        if failed == total {
            return Err(AggregateDownloadError {
                failures: report.failures,
            }
            .into());
        }
        if failed > 0 {
            warn!("some variants of {} failed to download ({failed} of {total})", font.family);
        } else {
            info!(
                "{}: {} downloaded, {} already present",
                font.family,
                report.downloaded.len(),
                report.skipped.len()
            );
        }

        Ok(report)
    }

    async fn download_variant(
        &self,
        font: &FontRecord,
        token: &str,
        folder: &Path,
        format: FontFormat,
    ) -> std::result::Result<Outcome, VariantFailure> {
        let url = font
            .files
            .url_for(token)
            .ok_or(VariantFailure::MissingSource)?;
        let target = folder.join(font_file_name(&font.family, token, format));

        let exists = fs::try_exists(&target)
            .await
            .map_err(|source| VariantFailure::Io {
                path: target.clone(),
                source,
            })?;
        if exists {
            return Ok(Outcome::AlreadyPresent(target));
        }

        fs::create_dir_all(folder)
            .await
            .map_err(|source| VariantFailure::Io {
                path: folder.to_path_buf(),
                source,
            })?;

        self.fetch_to_file(url, &target).await?;
        Ok(Outcome::Downloaded(target))
    }

    /// Stream `url` into `<target>.part`, then move it into place.
    async fn fetch_to_file(&self, url: &str, target: &Path) -> std::result::Result<(), VariantFailure> {
        let partial = partial_path(target);

        let result = self.stream_into(url, &partial).await;
        if let Err(err) = result {
            let _ = fs::remove_file(&partial).await;
            return Err(err);
        }

        fs::rename(&partial, target)
            .await
            .map_err(|source| VariantFailure::Io {
                path: target.to_path_buf(),
                source,
            })
    }

    async fn stream_into(&self, url: &str, partial: &Path) -> std::result::Result<(), VariantFailure> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(VariantFailure::Http)?;

        let io_err = |source| VariantFailure::Io {
            path: partial.to_path_buf(),
            source,
        };

        let mut file = fs::File::create(partial).await.map_err(io_err)?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(VariantFailure::Http)?;
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_sits_next_to_target() {
        let target = Path::new("/out/Roboto/Roboto-Bold.ttf");
        assert_eq!(
            partial_path(target),
            PathBuf::from("/out/Roboto/Roboto-Bold.ttf.part")
        );
    }

    #[test]
    fn report_completeness() {
        let mut report = DownloadReport::default();
        assert!(report.is_complete());
        report.failures.push(VariantDownloadError {
            variant: "700".into(),
            cause: VariantFailure::MissingSource,
        });
        assert!(!report.is_complete());
    }
}
