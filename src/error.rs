// src/error.rs
//
// Error taxonomy for the whole pipeline:
// - Config: rejected before any fetch is attempted.
// - Fetch/Http: one failing endpoint; previously loaded data stays usable.
// - Export wrappers: a whole-export failure (per-project gaps are skip
//   notes on the outcome, not errors).
//
// Form-definition parse failures are deliberately NOT here: they degrade the
// affected form to an empty question list and are recorded on its schema.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(String),

    #[error("fetch {endpoint}: {source}")]
    Fetch {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch {endpoint}: HTTP {status}")]
    Http { endpoint: String, status: u16 },

    #[error("export: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl Error {
    /// True when retrying the same action later could succeed.
    /// Everything except configuration mistakes qualifies.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}
