#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Sequence builder.
//!
//! # Purpose
//!
//! Turns one definition's contributions and rules into a single ordered, nested sequence
//! written into a [`SequenceSink`].
//!
//! # Mental Model
//!
//! 1. **Normalization** ([`normalize`]): resolve each contribution's rules into hints, rewrite
//!    BEFORE edges as AFTER edges on the target, file everything into (sub-scope, group) buckets.
//! 2. **Placement**: an explicit stack of frames walks the buckets depth-first. The top frame
//!    repeatedly selects the best dependency-satisfied candidate ([`select::select`]),
//!    dispatches it, and pushes a new frame for groups and sub-sequences.
//!
//! # Invariants
//!
//! - A separator is never the first write into a sink, never follows another separator, and
//!   never trails a sink.
//!   - Enforced in: [`sinks::PendingSeparator::flush`] (lazy, flushed only before an add).
//!   - Tested by: `tests::test_group_separation_around`, `tests::test_no_leading_separator`.
//!   - Failure symptom: empty dividers at menu edges or doubled dividers.
//!
//! - An empty sub-sequence is never surfaced.
//!   - Enforced in: [`Placement::close_sub_sequence`].
//!   - Tested by: `tests::test_empty_sub_sequence_dropped`.
//!   - Failure symptom: submenus that open onto nothing.
//!
//! - A nested scope is opened by exactly one sub-sequence, the first registered naming it.
//!   - Enforced in: [`Placement::open_sub_sequence`] (later ones are reported as shared).
//!   - Tested by: `tests::test_shared_nested_scope_reported`.
//!   - Failure symptom: a submenu vanishes because another one drained its children.
//!
//! - The build terminates on cycles and missing targets.
//!   - Enforced in: [`Placement::truncate`] (each step places or discards at least one entry).
//!   - Tested by: `tests::test_two_cycle_truncates_group`, `properties.rs`.
//!   - Failure symptom: the UI thread hangs at window creation.

mod normalize;
mod select;
mod sinks;

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tessera_registry::{Contribution, Registry, Separation};
use tracing::{debug, trace, warn};

use self::normalize::{Layout, Opens, ROOT};
use self::select::select;
use self::sinks::SinkStack;
use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::report::{BuildReport, Problem, ProblemKind};
use crate::sink::SequenceSink;

/// Builds definitions of one registry into sinks.
pub struct SequenceBuilder<'r, P> {
	registry: &'r Registry<P>,
	options: BuildOptions,
}

impl<'r, P> SequenceBuilder<'r, P> {
	pub fn new(registry: &'r Registry<P>) -> Self {
		Self {
			registry,
			options: BuildOptions::default(),
		}
	}

	pub fn with_options(mut self, options: BuildOptions) -> Self {
		self.options = options;
		self
	}

	#[inline]
	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	/// Populates `sink` with the resolved sequence of `definition`.
	///
	/// Ordering problems never fail the build; they are logged and listed in the report.
	pub fn build<S: SequenceSink<P>>(
		&self,
		definition: &str,
		sink: &mut S,
	) -> Result<BuildReport, BuildError> {
		let def = self
			.registry
			.definition(definition)
			.ok_or_else(|| BuildError::UnknownDefinition {
				id: Arc::from(definition),
			})?;

		let mut layout = Layout::normalize(def);
		let mut report = BuildReport::default();
		report_unreachable(definition, &layout, &mut report);

		Placement {
			definition,
			layout: &mut layout,
			sinks: SinkStack::new(sink),
			frames: Vec::new(),
			max_depth: self.options.max_depth.max(1),
			report: &mut report,
		}
		.run();

		debug!(
			definition,
			contributions = def.len(),
			placed = report.placed,
			vetoed = report.vetoed,
			separators = report.separators,
			problems = report.problems.len(),
			"sequence built"
		);
		Ok(report)
	}
}

/// Builds `definition` with default options.
pub fn build<P, S: SequenceSink<P>>(
	registry: &Registry<P>,
	definition: &str,
	sink: &mut S,
) -> Result<BuildReport, BuildError> {
	SequenceBuilder::new(registry).build(definition, sink)
}

fn report_unreachable<P>(definition: &str, layout: &Layout<'_, P>, report: &mut BuildReport) {
	for (scope, group) in layout.unreachable() {
		let scope = &layout.scopes[scope];
		let group = &scope.groups[group];
		let dropped: Vec<Arc<str>> = group
			.unplaced
			.iter()
			.map(|&ordinal| Arc::clone(layout.entries[ordinal].contribution.id_arc()))
			.collect();
		warn!(
			definition,
			scope = scope.id,
			group = group.id,
			scope_opened = scope.opened,
			?dropped,
			"contributions filed under a missing parent"
		);
		report.problems.push(Problem {
			scope: Arc::from(scope.id),
			group: Arc::from(group.id),
			kind: ProblemKind::MissingParent { dropped },
		});
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
	Start,
	Contribution,
	End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
	Group,
	/// Frame for the root group of a nested scope; `ordinal` is the opening sub-sequence.
	Sub { ordinal: usize },
}

#[derive(Debug, Clone, Copy)]
struct Frame {
	scope: usize,
	group: usize,
	state: FrameState,
	kind: FrameKind,
}

struct Placement<'l, 'a, P, S> {
	definition: &'l str,
	layout: &'l mut Layout<'a, P>,
	sinks: SinkStack<'l, S>,
	frames: Vec<Frame>,
	max_depth: usize,
	report: &'l mut BuildReport,
}

impl<'l, 'a, P, S: SequenceSink<P>> Placement<'l, 'a, P, S> {
	fn run(mut self) {
		self.frames.push(Frame {
			scope: ROOT,
			group: ROOT,
			state: FrameState::Start,
			kind: FrameKind::Group,
		});

		while let Some(&frame) = self.frames.last() {
			match frame.state {
				FrameState::Start => {
					if self.separation(frame).above() {
						self.sinks.current().1.queue();
					}
					self.advance(FrameState::Contribution);
				}
				FrameState::Contribution => self.step(frame),
				FrameState::End => {
					if self.separation(frame).below() {
						self.sinks.current().1.queue();
					}
					self.frames.pop();
					if let FrameKind::Sub { ordinal } = frame.kind {
						self.close_sub_sequence(ordinal);
					}
				}
			}
		}
	}

	fn separation(&self, frame: Frame) -> Separation {
		self.layout.scopes[frame.scope].groups[frame.group].separation
	}

	fn advance(&mut self, state: FrameState) {
		if let Some(top) = self.frames.last_mut() {
			top.state = state;
		}
	}

	/// Places or discards at least one unplaced entry of the top frame's group, or ends it.
	fn step(&mut self, frame: Frame) {
		let Some(pick) = select(self.layout, frame.scope, frame.group) else {
			if !self.layout.scopes[frame.scope].groups[frame.group]
				.unplaced
				.is_empty()
			{
				self.truncate(frame);
			}
			self.advance(FrameState::End);
			return;
		};

		let record = &mut self.layout.scopes[frame.scope];
		let ordinal = record.groups[frame.group].unplaced.remove(pick.index);
		let entry = &self.layout.entries[ordinal];
		let (contribution, opens) = (entry.contribution, entry.opens);
		record.processed.insert(entry.id());
		trace!(
			definition = self.definition,
			scope = record.id,
			id = entry.id(),
			slot = ?pick.slot,
			position = ?entry.position,
			"selected contribution"
		);

		match opens {
			Opens::Nothing => self.place_item(frame.scope, ordinal),
			Opens::Group(group) => {
				if self.frames.iter().any(|f| f.scope == frame.scope && f.group == group) {
					self.recursive(frame, contribution);
				} else if self.frames.len() >= self.max_depth {
					self.depth_exceeded(frame, ordinal);
				} else {
					self.frames.push(Frame {
						scope: frame.scope,
						group,
						state: FrameState::Start,
						kind: FrameKind::Group,
					});
				}
			}
			Opens::Scope(nested) => self.open_sub_sequence(frame, ordinal, nested),
		}
	}

	fn place_item(&mut self, scope: usize, ordinal: usize) {
		let entry = &self.layout.entries[ordinal];
		let (contribution, separation) = (entry.contribution, entry.separation);
		let (sink, separator) = self.sinks.current();

		if !sink.init_item(contribution) {
			self.report.vetoed += 1;
			debug!(definition = self.definition, id = contribution.id(), "contribution vetoed by sink");
			return;
		}
		if separation.above() {
			separator.queue();
		}
		if separator.flush(sink) {
			self.report.separators += 1;
		}
		sink.add(contribution);
		if separation.below() {
			separator.queue();
		}
		self.report.placed += 1;
		self.layout.scopes[scope].last_placed = Some(ordinal);
	}

	fn open_sub_sequence(&mut self, frame: Frame, ordinal: usize, nested: usize) {
		let contribution = self.layout.entries[ordinal].contribution;
		if self.frames.iter().any(|f| f.scope == nested) {
			self.recursive(frame, contribution);
			return;
		}
		if let Some(opener) = self.layout.scopes[nested].opener
			&& opener != ordinal
		{
			self.shared(frame, ordinal, opener);
			return;
		}
		if self.frames.len() >= self.max_depth {
			self.depth_exceeded(frame, ordinal);
			return;
		}

		let (sink, _) = self.sinks.current();
		if !sink.init_item(contribution) {
			self.report.vetoed += 1;
			debug!(definition = self.definition, id = contribution.id(), "sub-sequence vetoed by sink");
			return;
		}
		let child = sink.nested(contribution);
		self.sinks.push(child);
		self.frames.push(Frame {
			scope: nested,
			group: ROOT,
			state: FrameState::Start,
			kind: FrameKind::Sub { ordinal },
		});
	}

	/// Appends a drained sub-sequence to its parent sink, or drops it when nothing landed in it.
	fn close_sub_sequence(&mut self, ordinal: usize) {
		let Some(child) = self.sinks.pop() else {
			return;
		};
		let entry = &self.layout.entries[ordinal];
		let (contribution, separation, scope) = (entry.contribution, entry.separation, entry.scope);

		if child.is_empty() {
			self.report.empty_sub_sequences += 1;
			debug!(definition = self.definition, id = contribution.id(), "dropping empty sub-sequence");
			return;
		}

		let (sink, separator) = self.sinks.current();
		if separation.above() {
			separator.queue();
		}
		if separator.flush(sink) {
			self.report.separators += 1;
		}
		sink.add_sub_sequence(contribution, child);
		if separation.below() {
			separator.queue();
		}
		self.report.placed += 1;
		self.layout.scopes[scope].last_placed = Some(ordinal);
	}

	/// Discards every remaining entry of the frame's group.
	fn truncate(&mut self, frame: Frame) {
		let remaining = std::mem::take(
			&mut self.layout.scopes[frame.scope].groups[frame.group].unplaced,
		);
		let record = &self.layout.scopes[frame.scope];

		let mut dropped = Vec::with_capacity(remaining.len());
		let mut missing: Vec<Arc<str>> = Vec::new();
		let mut descendants = Vec::new();
		for &ordinal in &remaining {
			let entry = &self.layout.entries[ordinal];
			dropped.push(Arc::clone(entry.contribution.id_arc()));
			for &dep in &entry.after {
				if !record.processed.contains(dep) && !missing.iter().any(|m| m.as_ref() == dep) {
					missing.push(Arc::from(dep));
				}
			}
			descendants.extend(self.descendants(ordinal));
		}

		warn!(
			definition = self.definition,
			scope = record.id,
			group = record.groups[frame.group].id,
			count = dropped.len(),
			?dropped,
			?missing,
			nested = descendants.len(),
			"unsatisfiable contribution ordering; truncating group"
		);
		let (scope, group) = self.location(frame);
		self.report.problems.push(Problem {
			scope,
			group,
			kind: ProblemKind::UnsatisfiableOrdering {
				dropped,
				missing,
				descendants,
			},
		});
	}

	/// Ids of the unplaced contents a group or sub-sequence would have opened, depth-first.
	///
	/// Buckets already open on the frame stack, and scopes owned by another opener, are
	/// skipped: their contents are placed or reported elsewhere.
	fn descendants(&self, ordinal: usize) -> Vec<Arc<str>> {
		let mut seen: FxHashSet<(usize, usize)> =
			self.frames.iter().map(|f| (f.scope, f.group)).collect();
		let mut out = Vec::new();
		let mut stack = vec![(ordinal, false)];
		while let Some((ordinal, emit)) = stack.pop() {
			let entry = &self.layout.entries[ordinal];
			if emit {
				out.push(Arc::clone(entry.contribution.id_arc()));
			}
			let bucket = match entry.opens {
				Opens::Nothing => continue,
				Opens::Group(group) => (entry.scope, group),
				Opens::Scope(nested) if self.layout.scopes[nested].opener == Some(ordinal) => {
					(nested, ROOT)
				}
				Opens::Scope(_) => continue,
			};
			if !seen.insert(bucket) {
				continue;
			}
			let unplaced = &self.layout.scopes[bucket.0].groups[bucket.1].unplaced;
			stack.extend(unplaced.iter().rev().map(|&child| (child, true)));
		}
		out
	}

	fn recursive(&mut self, frame: Frame, contribution: &Contribution<P>) {
		let (scope, group) = self.location(frame);
		warn!(
			definition = self.definition,
			scope = %scope,
			id = contribution.id(),
			"contribution reopens a frame that is already open; dropping it"
		);
		self.report.problems.push(Problem {
			scope,
			group,
			kind: ProblemKind::RecursiveScope {
				contribution: Arc::clone(contribution.id_arc()),
			},
		});
	}

	fn shared(&mut self, frame: Frame, ordinal: usize, opener: usize) {
		let (scope, group) = self.location(frame);
		let contribution = self.layout.entries[ordinal].contribution;
		let opener = self.layout.entries[opener].contribution;
		let nested = match contribution {
			Contribution::SubSequence { scope: nested, .. } => Arc::clone(nested),
			_ => Arc::clone(contribution.id_arc()),
		};
		warn!(
			definition = self.definition,
			scope = %scope,
			id = contribution.id(),
			nested = %nested,
			opener = opener.id(),
			"sub-sequence shares its nested scope with an earlier one; dropping it"
		);
		self.report.problems.push(Problem {
			scope,
			group,
			kind: ProblemKind::SharedScope {
				contribution: Arc::clone(contribution.id_arc()),
				nested,
				opener: Arc::clone(opener.id_arc()),
			},
		});
	}

	fn depth_exceeded(&mut self, frame: Frame, ordinal: usize) {
		let (scope, group) = self.location(frame);
		let contribution = self.layout.entries[ordinal].contribution;
		let descendants = self.descendants(ordinal);
		warn!(
			definition = self.definition,
			scope = %scope,
			id = contribution.id(),
			max_depth = self.max_depth,
			nested = descendants.len(),
			"nesting too deep; dropping contribution"
		);
		self.report.problems.push(Problem {
			scope,
			group,
			kind: ProblemKind::DepthExceeded {
				contribution: Arc::clone(contribution.id_arc()),
				depth: self.max_depth,
				descendants,
			},
		});
	}

	fn location(&self, frame: Frame) -> (Arc<str>, Arc<str>) {
		let record = &self.layout.scopes[frame.scope];
		(Arc::from(record.id), Arc::from(record.groups[frame.group].id))
	}
}

#[cfg(test)]
mod tests;
