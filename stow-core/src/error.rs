use crate::Error;

/// Distinguished failures of the persistence layer.
///
/// They travel inside [`anyhow::Error`] like every other failure, use
/// [`PersistError::kind_of`] (or the `is_*` helpers) to classify an error after
/// any number of `context` layers were added.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    /// A single-entity fetch produced no row.
    #[error("Not found")]
    NotFound,
    /// Deleting an entity whose identifier was never assigned.
    #[error("Transient entity")]
    Transient,
    /// Mapping derivation or identifier handling failed.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Result columns that match no destination of the target type.
    #[error("Unknown columns for type {type_name}: {}", columns.join(", "))]
    UnknownColumns {
        type_name: &'static str,
        columns: Vec<String>,
    },
    /// Malformed query template.
    #[error("Template error: {0}")]
    Template(String),
}

impl PersistError {
    pub fn configuration(message: impl Into<String>) -> Error {
        PersistError::Configuration(message.into()).into()
    }

    pub fn kind_of(error: &Error) -> Option<&PersistError> {
        error.chain().find_map(|v| v.downcast_ref::<PersistError>())
    }
}

pub fn is_not_found(error: &Error) -> bool {
    matches!(PersistError::kind_of(error), Some(PersistError::NotFound))
}

pub fn is_transient(error: &Error) -> bool {
    matches!(PersistError::kind_of(error), Some(PersistError::Transient))
}

pub fn is_configuration(error: &Error) -> bool {
    matches!(
        PersistError::kind_of(error),
        Some(PersistError::Configuration(..))
    )
}

pub fn is_unknown_columns(error: &Error) -> bool {
    matches!(
        PersistError::kind_of(error),
        Some(PersistError::UnknownColumns { .. })
    )
}

pub fn is_template(error: &Error) -> bool {
    matches!(PersistError::kind_of(error), Some(PersistError::Template(..)))
}
