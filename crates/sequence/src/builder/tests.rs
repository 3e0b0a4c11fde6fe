use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use tessera_registry::{
	Contribution, DuplicatePolicy, Position, Registry, RegistryOptions, Rule, Separation,
};

use super::normalize::Layout;
use super::select::{Slot, select};
use super::{SequenceBuilder, build};
use crate::{BuildError, BuildOptions, DEFAULT_MAX_DEPTH, ProblemKind, SequenceTree};

const DEF: &str = "menu";

fn registry() -> Registry<&'static str> {
	let mut registry = Registry::new();
	registry.register_definition(DEF, "core").unwrap();
	registry
}

fn item(registry: &mut Registry<&'static str>, id: &'static str, rules: &[Rule]) {
	let handle = registry.register_item(DEF, "core", id, id).unwrap();
	for rule in rules {
		registry.register_rule(handle, rule.clone()).unwrap();
	}
}

fn group(registry: &mut Registry<&'static str>, id: &'static str, rules: &[Rule]) {
	let handle = registry.register_group(DEF, "core", id).unwrap();
	for rule in rules {
		registry.register_rule(handle, rule.clone()).unwrap();
	}
}

fn sub(registry: &mut Registry<&'static str>, id: &'static str, rules: &[Rule]) {
	let handle = registry.register_sub_sequence(DEF, "core", id, id).unwrap();
	for rule in rules {
		registry.register_rule(handle, rule.clone()).unwrap();
	}
}

fn ids(list: &[&str]) -> Vec<Arc<str>> {
	list.iter().map(|&id| Arc::from(id)).collect()
}

fn outline(registry: &Registry<&'static str>) -> String {
	let mut tree = SequenceTree::new();
	build(registry, DEF, &mut tree).unwrap();
	tree.outline()
}

/// Without rules the output is exactly the registration order, with no separators.
#[test]
fn test_no_rules_keeps_registration_order() {
	let mut r = registry();
	for id in ["new", "open", "save", "close", "exit"] {
		item(&mut r, id, &[]);
	}
	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "new open save close exit");
	assert_eq!(report.separators(), 0);
	assert_eq!(report.placed(), 5);
	assert!(report.is_complete());
}

#[test]
fn test_unknown_definition() {
	let r = registry();
	let mut tree: SequenceTree<&'static str> = SequenceTree::new();
	let err = build(&r, "toolbar", &mut tree).unwrap_err();
	assert_eq!(
		err,
		BuildError::UnknownDefinition {
			id: "toolbar".into()
		}
	);
}

#[rstest]
#[case::top_first(&[("b", Position::Middle), ("a", Position::Top)], "a b")]
#[case::bottom_last(&[("z", Position::Bottom), ("m", Position::Middle)], "m z")]
#[case::full_sweep(
	&[
		("custom", Position::Custom),
		("bottom_last", Position::BottomLast),
		("bottom", Position::Bottom),
		("middle_last", Position::MiddleLast),
		("middle", Position::Middle),
		("top_last", Position::TopLast),
		("top", Position::Top),
	],
	"top top_last middle middle_last bottom bottom_last custom"
)]
fn test_position_buckets(#[case] items: &[(&'static str, Position)], #[case] expected: &str) {
	let mut r = registry();
	for &(id, position) in items {
		item(&mut r, id, &[Rule::position(position)]);
	}
	assert_eq!(outline(&r), expected);
}

/// `C(MIDDLE), B(MIDDLE, after A), A(TOP)`: A wins the TOP sweep, then B beats C as an
/// explicit successor of A.
#[test]
fn test_next_match_beats_registration_order() {
	let mut r = registry();
	item(&mut r, "c", &[]);
	item(&mut r, "b", &[Rule::after("a")]);
	item(&mut r, "a", &[Rule::position(Position::Top)]);
	assert_eq!(outline(&r), "a b c");
}

#[test]
fn test_after_target_precedes_dependent() {
	let mut r = registry();
	item(&mut r, "paste", &[Rule::after("copy")]);
	item(&mut r, "cut", &[]);
	item(&mut r, "copy", &[]);
	assert_eq!(outline(&r), "cut copy paste");
}

/// `A before B` and `B after A` produce the same order, including forward references.
#[rstest]
#[case::forward_before(true)]
#[case::backward_after(false)]
fn test_before_after_equivalence(#[case] declare_before: bool) {
	let mut r = registry();
	if declare_before {
		item(&mut r, "x", &[]);
		item(&mut r, "b", &[]);
		item(&mut r, "y", &[]);
		item(&mut r, "a", &[Rule::before("b")]);
	} else {
		item(&mut r, "x", &[]);
		item(&mut r, "b", &[Rule::after("a")]);
		item(&mut r, "y", &[]);
		item(&mut r, "a", &[]);
	}
	assert_eq!(outline(&r), "x y a b");
}

/// A BEFORE edge naming a contribution registered later is parked, then spliced in.
#[test]
fn test_before_forward_reference() {
	let mut r = registry();
	item(&mut r, "first", &[Rule::before("second")]);
	item(&mut r, "other", &[]);
	item(&mut r, "second", &[Rule::position(Position::Top)]);

	let def = r.definition(DEF).unwrap();
	let layout = Layout::normalize(def);
	assert_eq!(layout.entries[2].after, vec!["first"]);
	assert!(layout.entries[0].after.is_empty());

	assert_eq!(outline(&r), "first second other");
}

/// The implicit successor (registered right after the last placed) wins over earlier
/// position matches.
#[test]
fn test_next_hint_match() {
	let mut r = registry();
	item(&mut r, "late", &[Rule::after("anchor")]);
	item(&mut r, "anchor", &[Rule::position(Position::Top)]);
	item(&mut r, "follower", &[Rule::position(Position::Top)]);
	// anchor, then follower (Top, registered right after anchor) before late (Middle).
	assert_eq!(outline(&r), "anchor follower late");
}

#[test]
fn test_slot_priority() {
	let mut r = registry();
	item(&mut r, "p", &[]);
	item(&mut r, "anchor", &[Rule::position(Position::Top)]);
	item(&mut r, "hinted", &[]);
	item(&mut r, "explicit", &[Rule::after("anchor")]);

	let def = r.definition(DEF).unwrap();
	let mut layout = Layout::normalize(def);
	let first = select(&layout, 0, 0).unwrap();
	assert_eq!((first.index, first.slot), (1, Slot::Position));

	// Simulate placing the anchor.
	let ordinal = layout.scopes[0].groups[0].unplaced.remove(first.index);
	layout.scopes[0].processed.insert("anchor");
	layout.scopes[0].last_placed = Some(ordinal);

	let second = select(&layout, 0, 0).unwrap();
	assert_eq!(second.slot, Slot::Next);
	assert_eq!(layout.entries[layout.scopes[0].groups[0].unplaced[second.index]].id(), "explicit");
}

#[test]
fn test_blocked_top_yields_to_later_bucket() {
	let mut r = registry();
	item(&mut r, "waits", &[Rule::position(Position::Top), Rule::after("free")]);
	item(&mut r, "free", &[Rule::position(Position::Custom)]);

	let def = r.definition(DEF).unwrap();
	let layout = Layout::normalize(def);
	let pick = select(&layout, 0, 0).unwrap();
	assert_eq!((pick.index, pick.slot), (1, Slot::Position));
	assert_eq!(outline(&r), "free waits");
}

/// The "file" menu scenario: a separated group between plain items and a bottom item.
#[test]
fn test_group_separation_around() {
	let mut r = registry();
	item(&mut r, "new", &[]);
	item(&mut r, "open", &[]);
	group(&mut r, "recent", &[Rule::separation(Separation::Around)]);
	item(&mut r, "exit", &[Rule::position(Position::Bottom)]);
	item(&mut r, "recent_1", &[Rule::group("recent")]);
	item(&mut r, "recent_2", &[Rule::group("recent")]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "new open | recent_1 recent_2 | exit");
	assert_eq!(report.separators(), 2);
	assert!(report.is_complete());
}

#[test]
fn test_no_leading_separator() {
	let mut r = registry();
	group(&mut r, "head", &[Rule::separation(Separation::Around)]);
	item(&mut r, "tail", &[]);
	item(&mut r, "inside", &[Rule::group("head")]);
	assert_eq!(outline(&r), "inside | tail");
}

#[test]
fn test_no_trailing_separator() {
	let mut r = registry();
	item(&mut r, "a", &[Rule::separation(Separation::Below)]);
	group(&mut r, "g", &[Rule::separation(Separation::Around)]);
	item(&mut r, "b", &[Rule::group("g")]);
	assert_eq!(outline(&r), "a | b");
}

/// Adjacent separation requests collapse into one divider.
#[test]
fn test_separators_never_double() {
	let mut r = registry();
	item(&mut r, "a", &[Rule::separation(Separation::Below)]);
	item(&mut r, "b", &[Rule::separation(Separation::Around)]);
	group(&mut r, "g", &[Rule::separation(Separation::Around)]);
	item(&mut r, "c", &[Rule::group("g")]);
	assert_eq!(outline(&r), "a | b | c");
}

#[test]
fn test_vetoed_items_dropped_without_separator() {
	let mut r = registry();
	item(&mut r, "a", &[]);
	item(&mut r, "hidden", &[Rule::separation(Separation::Around)]);
	item(&mut r, "b", &[]);

	let mut tree = SequenceTree::with_filter(|c: &Contribution<&'static str>| c.id() != "hidden");
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "a b");
	assert_eq!(report.vetoed(), 1);
}

/// A vetoed contribution still counts as processed, so its dependents are placed.
#[test]
fn test_vetoed_target_releases_dependents() {
	let mut r = registry();
	item(&mut r, "dependent", &[Rule::after("hidden")]);
	item(&mut r, "hidden", &[]);

	let mut tree = SequenceTree::with_filter(|c: &Contribution<&'static str>| c.id() != "hidden");
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "dependent");
	assert!(report.is_complete());
}

#[test]
fn test_sub_sequence_nesting() {
	let mut r = registry();
	item(&mut r, "open", &[]);
	sub(&mut r, "recent", &[Rule::separation(Separation::Above)]);
	item(&mut r, "exit", &[]);
	item(&mut r, "one", &[Rule::sub_scope("recent")]);
	item(&mut r, "two", &[Rule::sub_scope("recent"), Rule::position(Position::Top)]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "open | recent[two one] exit");
	assert_eq!(report.placed(), 5);
	assert_eq!(tree.nodes()[2].children().len(), 2);
}

#[test]
fn test_empty_sub_sequence_dropped() {
	let mut r = registry();
	item(&mut r, "a", &[]);
	sub(&mut r, "more", &[Rule::separation(Separation::Around)]);
	item(&mut r, "b", &[]);
	item(&mut r, "hidden_1", &[Rule::sub_scope("more")]);
	item(&mut r, "hidden_2", &[Rule::sub_scope("more")]);

	let mut tree = SequenceTree::with_filter(|c: &Contribution<&'static str>| {
		!c.id().starts_with("hidden")
	});
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "a b");
	assert_eq!(report.separators(), 0);
	assert_eq!(report.empty_sub_sequences(), 1);
	assert_eq!(report.vetoed(), 2);
}

#[test]
fn test_nested_sub_sequences_and_groups() {
	let mut r = registry();
	sub(&mut r, "edit", &[]);
	sub(&mut r, "transform", &[Rule::sub_scope("edit")]);
	group(&mut r, "clipboard", &[Rule::sub_scope("edit"), Rule::separation(Separation::Below)]);
	item(&mut r, "copy", &[Rule::sub_scope("edit"), Rule::group("clipboard")]);
	item(&mut r, "paste", &[Rule::sub_scope("edit"), Rule::group("clipboard")]);
	item(&mut r, "upper", &[Rule::sub_scope("transform")]);
	item(&mut r, "lower", &[Rule::sub_scope("transform")]);
	assert_eq!(outline(&r), "edit[transform[upper lower] copy paste]");
}

/// A 2-cycle drops both members with one problem and leaves siblings in order.
#[test]
fn test_two_cycle_truncates_group() {
	let mut r = registry();
	item(&mut r, "before", &[]);
	item(&mut r, "a", &[Rule::after("b")]);
	item(&mut r, "b", &[Rule::after("a")]);
	item(&mut r, "after", &[]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "before after");
	assert_eq!(report.problems().len(), 1);
	match &report.problems()[0].kind {
		ProblemKind::UnsatisfiableOrdering {
			dropped,
			missing,
			descendants,
		} => {
			assert!(descendants.is_empty());
			assert_eq!(dropped, &ids(&["a", "b"]));
			assert_eq!(missing, &ids(&["b", "a"]));
		}
		other => panic!("unexpected problem: {other:?}"),
	}
}

/// A dependency on an id that never shows up keeps the dependent unplaced until only it is
/// left; it is then dropped and the missing id is reported.
#[test]
fn test_missing_after_target_truncated() {
	let mut r = registry();
	item(&mut r, "orphan", &[Rule::after("typo")]);
	item(&mut r, "x", &[]);
	item(&mut r, "y", &[]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "x y");
	assert_eq!(report.problems()[0].dropped(), ids(&["orphan"]));
	assert!(matches!(
		&report.problems()[0].kind,
		ProblemKind::UnsatisfiableOrdering { missing, .. } if &*missing[0] == "typo"
	));
}

#[test]
fn test_self_before_is_unsatisfiable() {
	let mut r = registry();
	item(&mut r, "loop", &[Rule::before("loop")]);
	item(&mut r, "ok", &[]);
	assert_eq!(outline(&r), "ok");
}

#[test]
fn test_missing_parent_reported() {
	let mut r = registry();
	item(&mut r, "visible", &[]);
	item(&mut r, "lost", &[Rule::group("nowhere")]);
	item(&mut r, "adrift", &[Rule::sub_scope("no_such_menu")]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "visible");
	let kinds: Vec<_> = report
		.problems()
		.iter()
		.map(|p| (p.scope.to_string(), p.group.to_string()))
		.collect();
	assert_eq!(
		kinds,
		vec![
			(String::new(), "nowhere".to_string()),
			("no_such_menu".to_string(), String::new())
		]
	);
}

#[test]
fn test_recursive_scope_dropped() {
	let mut r = registry();
	item(&mut r, "top", &[]);
	sub(&mut r, "outer", &[]);
	let handle = r
		.register_sub_sequence_opening(DEF, "core", "back", "", "back")
		.unwrap();
	r.register_rule(handle, Rule::sub_scope("outer")).unwrap();
	item(&mut r, "inner", &[Rule::sub_scope("outer")]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "top outer[inner]");
	assert!(matches!(
		&report.problems()[0].kind,
		ProblemKind::RecursiveScope { contribution } if &**contribution == "back"
	));
}

#[test]
fn test_depth_limit() {
	let mut r = registry();
	sub(&mut r, "l1", &[]);
	sub(&mut r, "l2", &[Rule::sub_scope("l1")]);
	item(&mut r, "leaf", &[Rule::sub_scope("l2")]);
	item(&mut r, "shallow", &[Rule::sub_scope("l1")]);

	let mut tree = SequenceTree::new();
	let report = SequenceBuilder::new(&r)
		.with_options(BuildOptions::default().with_max_depth(2))
		.build(DEF, &mut tree)
		.unwrap();
	assert_eq!(tree.outline(), "l1[shallow]");
	assert!(matches!(
		&report.problems()[0].kind,
		ProblemKind::DepthExceeded { contribution, depth: 2, .. } if &**contribution == "l2"
	));
	assert_eq!(report.problems()[0].dropped(), ids(&["l2", "leaf"]));
}

/// Builds read the registry only; repeating one yields the same sequence.
#[test]
fn test_repeated_builds_identical() {
	let mut r = registry();
	item(&mut r, "c", &[]);
	item(&mut r, "b", &[Rule::after("a")]);
	item(&mut r, "a", &[Rule::position(Position::Top)]);
	group(&mut r, "g", &[Rule::separation(Separation::Around)]);
	item(&mut r, "g1", &[Rule::group("g")]);
	let first = outline(&r);
	assert_eq!(outline(&r), first);
}

#[rstest]
#[case::empty("", DEFAULT_MAX_DEPTH)]
#[case::explicit("max_depth = 8", 8)]
fn test_build_options_from_toml(#[case] source: &str, #[case] max_depth: usize) {
	let options: BuildOptions = toml::from_str(source).unwrap();
	assert_eq!(options.max_depth, max_depth);
}

#[test]
fn test_build_options_reject_unknown_fields() {
	assert!(toml::from_str::<BuildOptions>("depth = 3").is_err());
}

/// Two sub-sequences with the same id in different scopes both default to one nested scope;
/// the later one is dropped and reported instead of vanishing silently.
#[test]
fn test_shared_nested_scope_reported() {
	let mut r = registry();
	sub(&mut r, "edit", &[]);
	sub(&mut r, "more", &[Rule::sub_scope("edit")]);
	sub(&mut r, "more", &[]);
	item(&mut r, "a", &[Rule::sub_scope("more")]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "edit[more[a]]");
	assert_eq!(report.problems().len(), 1);
	let problem = &report.problems()[0];
	assert_eq!((&*problem.scope, &*problem.group), ("", ""));
	assert!(matches!(
		&problem.kind,
		ProblemKind::SharedScope { contribution, nested, opener }
			if &**contribution == "more" && &**nested == "more" && &**opener == "more"
	));
	assert_eq!(problem.dropped(), ids(&["more"]));
}

/// Registering straight into a nested scope keeps the root contribution with the same id.
#[rstest]
#[case::reject(DuplicatePolicy::Reject)]
#[case::last_wins(DuplicatePolicy::LastWins)]
fn test_same_id_in_root_and_nested_scope(#[case] policy: DuplicatePolicy) {
	let mut r = Registry::with_options(RegistryOptions::default().with_duplicate_policy(policy));
	r.register_definition(DEF, "core").unwrap();
	r.register_item(DEF, "core", "copy", "copy").unwrap();
	r.register_sub_sequence(DEF, "core", "edit", "edit").unwrap();
	r.register_item_in(DEF, "edit", "plugin", "copy", "copy").unwrap();

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "copy edit[copy]");
	assert!(report.is_complete());
}

/// A truncated group takes its contents with it, and the report lists them.
#[test]
fn test_truncated_group_reports_contents() {
	let mut r = registry();
	item(&mut r, "kept", &[]);
	group(&mut r, "stuck", &[Rule::after("never")]);
	item(&mut r, "inner", &[Rule::group("stuck")]);
	sub(&mut r, "deep", &[Rule::group("stuck")]);
	item(&mut r, "leaf", &[Rule::sub_scope("deep")]);

	let mut tree = SequenceTree::new();
	let report = build(&r, DEF, &mut tree).unwrap();
	assert_eq!(tree.outline(), "kept");
	assert_eq!(report.problems().len(), 1);
	assert_eq!(report.problems()[0].dropped(), ids(&["stuck", "inner", "deep", "leaf"]));
}
