use shared::FacetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no transport configured to reach servlet `{servlet}`")]
    TransportNotConfigured { servlet: String },
    #[error("search request failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("search state persistence failed: {0:#}")]
    Persistence(anyhow::Error),
    #[error("search server returned error {code}: {msg}")]
    Server { code: i64, msg: String },
    #[error(transparent)]
    Facet(#[from] FacetError),
}

impl ManagerError {
    /// Classifies a transport failure, keeping a `ManagerError` raised by the
    /// transport itself (such as a missing transport) as it is.
    pub(crate) fn from_transport(err: anyhow::Error) -> Self {
        match err.downcast::<ManagerError>() {
            Ok(err) => err,
            Err(err) => Self::Transport(err),
        }
    }
}
