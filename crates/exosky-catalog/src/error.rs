use thiserror::Error;

/// Errors from talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("response from {url} is not a recognised image")]
    NotAnImage { url: String },
}

impl CatalogError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => Self::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => Self::Transport {
                url: url.to_string(),
                source: Box::new(transport),
            },
        }
    }

    pub(crate) fn decode(url: &str, source: std::io::Error) -> Self {
        Self::Decode {
            url: url.to_string(),
            source,
        }
    }
}
