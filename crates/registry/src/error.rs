use std::sync::Arc;

use crate::store::ContributionHandle;

/// Registration failures.
///
/// All variants signal a module-setup programming error and are returned to the caller.
/// Ordering problems found while building are never surfaced here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// A definition with this id already exists.
	#[error("duplicate definition: id={id:?} existing_owner={existing_owner} new_owner={new_owner}")]
	DuplicateDefinition {
		id: Arc<str>,
		existing_owner: Arc<str>,
		new_owner: Arc<str>,
	},

	/// The referenced definition was never registered or has been removed.
	#[error("unknown definition: id={id:?}")]
	UnknownDefinition { id: Arc<str> },

	/// The handle does not refer to a live contribution.
	#[error("orphan contribution: handle={handle}")]
	OrphanContribution { handle: ContributionHandle },

	/// The contribution id already exists in the target sub-scope of the definition.
	#[error(
		"duplicate contribution: definition={definition:?} scope={scope:?} id={id:?} existing_owner={existing_owner} new_owner={new_owner}"
	)]
	DuplicateContribution {
		definition: Arc<str>,
		scope: Arc<str>,
		id: Arc<str>,
		existing_owner: Arc<str>,
		new_owner: Arc<str>,
	},
}
