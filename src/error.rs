use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbtLensError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error {status} from {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Error decoding JSON response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to fetch runs for {date}: {source}")]
    DayFailed {
        date: NaiveDate,
        #[source]
        source: Box<DbtLensError>,
    },
}

pub type Result<T> = std::result::Result<T, DbtLensError>;
