//! Error types for the cloud provider seam.

/// Failure of a speech, translation or synthesis provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure (connect, timeout, TLS); the request URL is stripped
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Audio decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    /// No provider configured for this capability
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.without_url())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let api = ProviderError::Api {
            status: 403,
            message: "API key not valid".to_string(),
        };
        assert_eq!(api.to_string(), "API error (403): API key not valid");

        let offline = ProviderError::Unavailable("no API key".to_string());
        assert_eq!(offline.to_string(), "Provider unavailable: no API key");
    }
}
