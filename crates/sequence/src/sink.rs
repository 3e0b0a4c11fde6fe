//! Output sink contract implemented by renderers.

use tessera_registry::Contribution;

/// Consumer of a resolved sequence (menu, tool strip, side panel).
///
/// The builder guarantees that [`add_separator`](Self::add_separator) is never the first
/// write into an empty sink and never follows another separator without an intervening add.
pub trait SequenceSink<P>: Sized {
	/// Lets the renderer hide a contribution. Returning false drops it without error.
	///
	/// Called for items and sub-sequences, never for groups.
	fn init_item(&mut self, contribution: &Contribution<P>) -> bool;

	/// Appends an item.
	fn add(&mut self, contribution: &Contribution<P>);

	/// Appends a divider.
	fn add_separator(&mut self);

	/// Returns true while nothing has been written.
	fn is_empty(&self) -> bool;

	/// Creates a fresh, private sink for the children of a sub-sequence.
	fn nested(&self, contribution: &Contribution<P>) -> Self;

	/// Appends a finished, non-empty sub-sequence.
	fn add_sub_sequence(&mut self, contribution: &Contribution<P>, nested: Self);
}
