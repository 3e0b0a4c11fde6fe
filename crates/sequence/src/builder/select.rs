//! Four-slot candidate selection.
//!
//! This is a tie-break heuristic, not a topological sort. The slot priority
//! `Next > NextHint > Position > Fallback` is what keeps existing contribution sets rendering in
//! the same order, so it must not change.

use tessera_registry::Position;

use super::normalize::Layout;

/// Why a candidate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Slot {
	/// Declares an AFTER edge on the contribution placed last in this sub-scope.
	Next,
	/// Was registered immediately after the contribution placed last.
	NextHint,
	/// Position hint matches the bucket being swept.
	Position,
	/// First dependency-satisfied candidate in any bucket.
	Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Pick {
	/// Index into the group's unplaced list.
	pub(super) index: usize,
	pub(super) slot: Slot,
}

#[derive(Default)]
struct Slots {
	next: Option<usize>,
	next_hint: Option<usize>,
	position: Option<usize>,
	fallback: Option<usize>,
}

impl Slots {
	fn pick(self) -> Option<Pick> {
		let pick = |index, slot| Pick { index, slot };
		self.next
			.map(|i| pick(i, Slot::Next))
			.or_else(|| self.next_hint.map(|i| pick(i, Slot::NextHint)))
			.or_else(|| self.position.map(|i| pick(i, Slot::Position)))
			.or_else(|| self.fallback.map(|i| pick(i, Slot::Fallback)))
	}
}

/// Chooses the next contribution of a group, or `None` when every remaining one is
/// dependency-unsatisfied (or none remain).
///
/// Buckets are swept in [`Position::SWEEP`] order; sweeping stops at the first bucket holding a
/// position match, or after the last bucket.
pub(super) fn select<P>(layout: &Layout<'_, P>, scope: usize, group: usize) -> Option<Pick> {
	let record = &layout.scopes[scope];
	let unplaced = &record.groups[group].unplaced;
	let last = record.last_placed;
	let last_id = last.map(|ordinal| layout.entries[ordinal].id());

	let mut slots = Slots::default();
	for bucket in Position::SWEEP {
		for (index, &ordinal) in unplaced.iter().enumerate() {
			let entry = &layout.entries[ordinal];
			if !record.satisfied(entry) {
				continue;
			}
			slots.fallback.get_or_insert(index);
			if entry.position != bucket {
				continue;
			}
			slots.position.get_or_insert(index);
			if slots.next.is_none() && last_id.is_some_and(|id| entry.after.contains(&id)) {
				slots.next = Some(index);
			}
			if slots.next_hint.is_none() && last.is_some() && entry.previous_hint == last {
				slots.next_hint = Some(index);
			}
		}
		if slots.position.is_some() {
			break;
		}
	}
	slots.pick()
}
