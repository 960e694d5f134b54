use thiserror::Error;

/// Why the location read could not produce coordinates.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeoError {
    #[error("Geolocation is not supported on this system.")]
    Unsupported,
    #[error("Permission to read the current location was denied.")]
    Denied,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Geolocation(#[from] GeoError),
    #[error("{0}")]
    Config(String),
    #[error("reverse geocode gave no address: {0}")]
    Geocode(String),
    #[error("chart renderer failed: {0}")]
    Render(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
