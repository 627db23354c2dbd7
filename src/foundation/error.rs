/// Convenience result type used across Folio.
pub type FolioResult<T> = Result<T, FolioError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Missing folders/layouts/images are not errors: mutation operations report them as
/// [`crate::Miss`] values on an unchanged [`crate::Edit`]. Invalid crops and ratios are healed and
/// reported as [`crate::Correction`] values. What remains here is bad input at load time and
/// defects that must abort the current edit.
#[derive(thiserror::Error, Debug)]
pub enum FolioError {
    /// Invalid user-provided document or catalog data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An edit reached a state that correct usage can never produce.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FolioError {
    /// Build a [`FolioError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FolioError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`FolioError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for defects that must never be persisted.
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
