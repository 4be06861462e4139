/// A convenience [`Result`] for capability document operations.
pub type CapabilitiesResult<T> = Result<T, CapabilitiesError>;

/// Errors produced while fetching, parsing or matching capability documents.
///
/// Every variant carries the offending endpoint URL so callers can log it.
/// The enum is `Clone` because failed fetches are cached negatively for the
/// lifetime of the process and handed out to every later caller of the same
/// endpoint.
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilitiesError {
    /// The endpoint URL in the configuration could not be parsed.
    #[error("invalid capabilities endpoint URL {url}: {reason}")]
    InvalidEndpoint {
        /// Endpoint URL as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to initialize capabilities HTTP client: {0}")]
    ClientInit(String),

    /// Transport failure or non-success HTTP status.
    #[error("capabilities request to {url} failed: {reason}")]
    SourceUnavailable {
        /// Endpoint URL the request was sent to.
        url: String,
        /// Transport error or HTTP status description.
        reason: String,
    },

    /// The response body was not a well-formed capability document.
    #[error("invalid capabilities document from {url}: {reason}")]
    Parse {
        /// Endpoint URL the document came from.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The document was fetched and parsed, but no advertised layer matched.
    #[error("no layer matching {} advertised by {url}", name.as_deref().unwrap_or("<any>"))]
    LayerNotFound {
        /// Endpoint URL the document came from.
        url: String,
        /// Target layer name, if one was given.
        name: Option<String>,
    },

    /// No target layer name was given and the document advertises more than
    /// one layer, so no deterministic choice exists.
    #[error("no target layer given and {candidates} layers advertised by {url}")]
    LayerAmbiguous {
        /// Endpoint URL the document came from.
        url: String,
        /// Number of advertised layers.
        candidates: usize,
    },
}
