//! Error taxonomy for gfdl-core (made by FontLab https://www.fontlab.com/)

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything a catalog fetch, stylesheet write or download can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing font, folder or variant selection.
    #[error("{0}")]
    Validation(String),

    /// The catalog service rejected the API key (HTTP 401/403).
    #[error("API key is invalid or unauthorized (HTTP {status})")]
    Auth { status: u16 },

    #[error("request timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("network error")]
    Transport(#[source] reqwest::Error),

    /// The catalog service answered with a structured `error` payload.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Non-success HTTP status without a structured payload.
    #[error("HTTP error {status}")]
    Status { status: u16 },

    #[error("malformed JSON")]
    Decode(#[from] serde_json::Error),

    #[error("CSS minification failed: {0}")]
    Minification(String),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    AllDownloadsFailed(#[from] AggregateDownloadError),
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Map a reqwest failure onto the timeout/transport split, dropping the URL
    /// so the API key in the query string never reaches logs or messages.
    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            Error::Timeout(err)
        } else {
            Error::Transport(err)
        }
    }
}

/// Why a single variant could not be saved.
#[derive(Debug, Error)]
pub enum VariantFailure {
    #[error("no download link in the catalog record")]
    MissingSource,

    #[error("download failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One isolated, non-fatal download failure.
#[derive(Debug, Error)]
#[error("variant {variant}: {cause}")]
pub struct VariantDownloadError {
    pub variant: String,
    pub cause: VariantFailure,
}

/// Raised only when every selected variant failed.
#[derive(Debug, Error)]
#[error("all {} downloads failed: {}", .failures.len(), join_failures(.failures))]
pub struct AggregateDownloadError {
    pub failures: Vec<VariantDownloadError>,
}

fn join_failures(failures: &[VariantDownloadError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_lists_every_cause() {
        let agg = AggregateDownloadError {
            failures: vec![
                VariantDownloadError {
                    variant: "regular".into(),
                    cause: VariantFailure::MissingSource,
                },
                VariantDownloadError {
                    variant: "700".into(),
                    cause: VariantFailure::MissingSource,
                },
            ],
        };

        let text = Error::from(agg).to_string();
        assert!(text.starts_with("all 2 downloads failed"), "{text}");
        assert!(text.contains("variant regular"));
        assert!(text.contains("variant 700"));
    }

    #[test]
    fn io_error_keeps_source() {
        let err = Error::io(
            "creating font folder",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "creating font folder");
        let source = std::error::Error::source(&err).expect("source");
        assert_eq!(source.to_string(), "denied");
    }
}
