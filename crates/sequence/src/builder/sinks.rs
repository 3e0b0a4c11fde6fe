//! Sink stack and lazy separator state shared by the placement loop.

use crate::sink::SequenceSink;

/// A separator waiting for the next successful write.
///
/// At most one is ever pending, so consecutive requests collapse into one divider.
#[derive(Debug, Default)]
pub(super) struct PendingSeparator {
	queued: bool,
}

impl PendingSeparator {
	#[inline]
	pub(super) fn queue(&mut self) {
		self.queued = true;
	}

	/// Writes the queued separator unless `sink` is still empty, then clears it.
	///
	/// Returns true when a separator was written.
	pub(super) fn flush<P, S: SequenceSink<P>>(&mut self, sink: &mut S) -> bool {
		let write = std::mem::take(&mut self.queued) && !sink.is_empty();
		if write {
			sink.add_separator();
		}
		write
	}
}

pub(super) struct NestedSink<S> {
	pub(super) sink: S,
	separator: PendingSeparator,
}

/// Caller's sink at the bottom, one private sink per open sub-sequence above it.
pub(super) struct SinkStack<'s, S> {
	root: &'s mut S,
	root_separator: PendingSeparator,
	nested: Vec<NestedSink<S>>,
}

impl<'s, S> SinkStack<'s, S> {
	pub(super) fn new(root: &'s mut S) -> Self {
		Self {
			root,
			root_separator: PendingSeparator::default(),
			nested: Vec::new(),
		}
	}

	/// Sink receiving writes for the innermost open sub-sequence.
	pub(super) fn current(&mut self) -> (&mut S, &mut PendingSeparator) {
		match self.nested.last_mut() {
			Some(top) => (&mut top.sink, &mut top.separator),
			None => (&mut *self.root, &mut self.root_separator),
		}
	}

	pub(super) fn push(&mut self, sink: S) {
		self.nested.push(NestedSink {
			sink,
			separator: PendingSeparator::default(),
		});
	}

	/// Closes the innermost sub-sequence; its pending separator is discarded.
	pub(super) fn pop(&mut self) -> Option<S> {
		self.nested.pop().map(|top| top.sink)
	}
}
