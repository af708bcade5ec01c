use thiserror::Error;

/// A remote call that did not produce a usable payload.
///
/// Every transport, status and decoding problem is folded into one of these
/// three variants at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceFailure {
    #[error("service unreachable: {0}")]
    Network(String),
    #[error("service responded with {status}: {message}")]
    Response { status: u16, message: String },
    #[error("malformed service response: {0}")]
    MalformedPayload(String),
}

impl ServiceFailure {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Response {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            };
        }
        if err.is_decode() {
            return Self::MalformedPayload(err.to_string());
        }
        Self::Network(err.to_string())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for ServiceFailure {
    fn from(value: reqwest::Error) -> Self {
        Self::from_reqwest(value)
    }
}

/// A precondition rejected before any remote call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("class label must not be empty")]
    EmptyClassLabel,
    #[error("select at least one image")]
    NoImages,
    #[error("image {filename} is empty")]
    EmptyImage { filename: String },
    #[error("{filename} is not a supported image (expected jpg, png, gif, bmp or webp)")]
    UnsupportedImage { filename: String },
    #[error("a prediction is already in progress")]
    PredictionInFlight,
    #[error("an upload is already in progress")]
    UploadInFlight,
    #[error("no dataset selection is staged for upload")]
    NothingStaged,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api url '{value}': {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("api url '{0}' must use http or https")]
    UnsupportedScheme(String),
    #[error("failed to read settings file {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    ParseFile {
        path: String,
        source: toml::de::Error,
    },
}
