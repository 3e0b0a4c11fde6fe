use serde::Deserialize;

/// Default bound on nested group and sub-sequence frames.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options accepted by [`crate::SequenceBuilder::with_options`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
	/// Maximum number of simultaneously open frames, root included.
	///
	/// Groups and sub-sequences that would open a frame beyond it are dropped and reported.
	pub max_depth: usize,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
		}
	}
}

impl BuildOptions {
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth.max(1);
		self
	}
}
