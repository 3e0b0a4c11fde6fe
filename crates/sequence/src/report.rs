//! Build diagnostics.
//!
//! Every problem here is non-fatal: the affected contributions are left out of the sink and
//! the build returns normally with a partial sequence.

use std::fmt;
use std::sync::Arc;

/// Why contributions were left out of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemKind {
	/// Every remaining contribution of a group waits on a dependency that can never be met
	/// (a cycle, or a target that is not registered in the sub-scope).
	UnsatisfiableOrdering {
		/// Dropped contributions, in registration order.
		dropped: Vec<Arc<str>>,
		/// Dependencies that were still unplaced when the group was truncated.
		missing: Vec<Arc<str>>,
		/// Contents of dropped groups and sub-sequences, depth-first.
		descendants: Vec<Arc<str>>,
	},
	/// Contributions filed under a group or sub-scope that nothing opens.
	MissingParent { dropped: Vec<Arc<str>> },
	/// A sub-sequence opening a scope that is already open further up.
	RecursiveScope { contribution: Arc<str> },
	/// A sub-sequence naming a nested scope that an earlier sub-sequence already opens.
	///
	/// The scope's children render under `opener` only.
	SharedScope {
		contribution: Arc<str>,
		nested: Arc<str>,
		opener: Arc<str>,
	},
	/// A group or sub-sequence nested deeper than [`crate::BuildOptions::max_depth`].
	DepthExceeded {
		contribution: Arc<str>,
		depth: usize,
		/// Its contents, depth-first.
		descendants: Vec<Arc<str>>,
	},
}

/// One diagnostic, located by sub-scope and group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
	pub scope: Arc<str>,
	pub group: Arc<str>,
	pub kind: ProblemKind,
}

impl Problem {
	/// Ids of contributions this problem removed from the output, including everything
	/// nested under a dropped group or sub-sequence.
	pub fn dropped(&self) -> Vec<Arc<str>> {
		match &self.kind {
			ProblemKind::UnsatisfiableOrdering {
				dropped,
				descendants,
				..
			} => dropped.iter().chain(descendants).cloned().collect(),
			ProblemKind::MissingParent { dropped } => dropped.clone(),
			ProblemKind::RecursiveScope { contribution }
			| ProblemKind::SharedScope { contribution, .. } => vec![Arc::clone(contribution)],
			ProblemKind::DepthExceeded {
				contribution,
				descendants,
				..
			} => std::iter::once(contribution)
				.chain(descendants)
				.cloned()
				.collect(),
		}
	}
}

impl fmt::Display for Problem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			ProblemKind::UnsatisfiableOrdering { dropped, missing, .. } => write!(
				f,
				"unsatisfiable ordering in scope={:?} group={:?}: dropped={dropped:?} missing={missing:?}",
				self.scope, self.group
			),
			ProblemKind::MissingParent { dropped } => write!(
				f,
				"missing parent scope={:?} group={:?}: dropped={dropped:?}",
				self.scope, self.group
			),
			ProblemKind::RecursiveScope { contribution } => write!(
				f,
				"sub-sequence {contribution:?} reopens scope={:?}",
				self.scope
			),
			ProblemKind::SharedScope {
				contribution,
				nested,
				opener,
			} => write!(
				f,
				"sub-sequence {contribution:?} shares scope {nested:?} with {opener:?} in scope={:?}",
				self.scope
			),
			ProblemKind::DepthExceeded {
				contribution,
				depth,
				..
			} => write!(
				f,
				"{contribution:?} exceeds max depth {depth} in scope={:?} group={:?}",
				self.scope, self.group
			),
		}
	}
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
	pub(crate) placed: usize,
	pub(crate) vetoed: usize,
	pub(crate) separators: usize,
	pub(crate) empty_sub_sequences: usize,
	pub(crate) problems: Vec<Problem>,
}

impl BuildReport {
	/// Items and sub-sequences written to a sink, nested ones included.
	#[inline]
	pub fn placed(&self) -> usize {
		self.placed
	}

	/// Contributions the sink refused through `init_item`.
	#[inline]
	pub fn vetoed(&self) -> usize {
		self.vetoed
	}

	#[inline]
	pub fn separators(&self) -> usize {
		self.separators
	}

	/// Accepted sub-sequences dropped because nothing ended up inside them.
	#[inline]
	pub fn empty_sub_sequences(&self) -> usize {
		self.empty_sub_sequences
	}

	#[inline]
	pub fn problems(&self) -> &[Problem] {
		&self.problems
	}

	/// Returns true when nothing was dropped: every contribution was placed, vetoed, or sat in
	/// a sub-sequence that ended up empty.
	#[inline]
	pub fn is_complete(&self) -> bool {
		self.problems.is_empty()
	}
}
