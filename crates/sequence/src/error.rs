use std::sync::Arc;

/// Fatal build failures. Ordering problems are reported in [`crate::BuildReport`] instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
	#[error("unknown definition: id={id:?}")]
	UnknownDefinition { id: Arc<str> },
}
