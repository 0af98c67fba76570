/// Errors that abort a derivation.
///
/// Invalid annotations and missing services are not represented here: those are logged and the
/// affected field or Ingress is skipped, so one bad resource never fails the whole run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cluster or ADC list call failed. Partial results are discarded.
    #[error("failed to {operation}: {source}")]
    Collaborator {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The caller cancelled the derivation.
    #[error("derivation cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// === impl Error ===

impl Error {
    pub fn collaborator(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator {
            operation,
            source: source.into(),
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
