use reqwest::StatusCode;

/// Failures of a single fetch/parse/extract operation.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("parse error: {0}")]
    Parse(String),

    /// A structural assumption about the page did not hold.
    #[error("could not extract {field} for {item}")]
    Extraction { field: &'static str, item: String },
}

impl ScrapeError {
    pub fn extraction(field: &'static str, item: &str) -> Self {
        ScrapeError::Extraction {
            field,
            item: item.to_string(),
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
