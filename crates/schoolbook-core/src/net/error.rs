use thiserror::Error;

/// Classified transport failure, recorded on a failure envelope.
///
/// These are the two non-load terminal events of a request; both resolve
/// to a value-carrying envelope rather than propagating.
#[derive(Error, Debug)]
pub enum NetError {
    #[error("failed to make request: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request took longer than expected")]
    Timeout,
}

impl NetError {
    pub(crate) fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}
