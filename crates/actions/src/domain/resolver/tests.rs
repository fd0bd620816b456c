use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::domain::{ActionDomain, Diagnostic, DomainItem, DomainState, InsertMode, InsertionRule, ItemKind};

fn domain_with(items: &[(&str, ItemKind)]) -> ActionDomain {
	let mut domain = ActionDomain::new("test");
	domain.add_top_level("menubar").unwrap();
	for (id, kind) in items {
		domain.add_item(DomainItem::new(*id, *kind)).unwrap();
	}
	domain
}

fn children(domain: &ActionDomain, target: &str) -> Vec<String> {
	domain.state().get(target).cloned().unwrap_or_default()
}

fn assert_acyclic(state: &DomainState) {
	fn walk(node: &str, state: &DomainState, path: &mut Vec<String>) {
		assert!(!path.iter().any(|p| p == node), "cycle through {node}: {path:?}");
		path.push(node.to_string());
		for child in state.get(node).into_iter().flatten() {
			walk(child, state, path);
		}
		path.pop();
	}
	for key in state.keys() {
		walk(key, state, &mut Vec::new());
	}
}

#[test]
fn append_and_unshift_follow_declaration_order() {
	let mut domain = domain_with(&[("A", ItemKind::Action), ("B", ItemKind::Action), ("C", ItemKind::Action)]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("B", InsertionRule::append("menubar"));
	domain.add_rule("C", InsertionRule::unshift("menubar"));

	assert_eq!(children(&domain, "menubar"), ["C", "A", "B"]);
	assert!(domain.diagnostics().is_empty());
}

#[test]
fn before_anchor_inserts_immediately_preceding() {
	let mut domain = domain_with(&[
		("A", ItemKind::Action),
		("B", ItemKind::Action),
		("C", ItemKind::Action),
		("D", ItemKind::Action),
	]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("B", InsertionRule::append("menubar"));
	domain.add_rule("C", InsertionRule::append("menubar"));
	domain.add_rule("D", InsertionRule::before("menubar", "B"));

	assert_eq!(children(&domain, "menubar"), ["A", "D", "B", "C"]);
}

#[test]
fn after_anchor_inserts_immediately_following() {
	let mut domain = domain_with(&[("A", ItemKind::Action), ("B", ItemKind::Action), ("E", ItemKind::Action)]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("B", InsertionRule::append("menubar"));
	domain.add_rule("E", InsertionRule::after("menubar", "A"));

	assert_eq!(children(&domain, "menubar"), ["A", "E", "B"]);
}

#[test]
fn anchor_declared_later_is_retried() {
	let mut domain = domain_with(&[("A", ItemKind::Action), ("B", ItemKind::Action), ("C", ItemKind::Action)]);
	domain.add_rule("C", InsertionRule::after("menubar", "B"));
	domain.add_rule("B", InsertionRule::after("menubar", "A"));
	domain.add_rule("A", InsertionRule::append("menubar"));

	assert_eq!(children(&domain, "menubar"), ["A", "B", "C"]);
	assert!(domain.diagnostics().is_empty());
}

#[test]
fn missing_anchor_drops_rule_with_diagnostic() {
	let mut domain = domain_with(&[("A", ItemKind::Action), ("D", ItemKind::Action)]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("D", InsertionRule::before("menubar", "ghost"));

	assert_eq!(children(&domain, "menubar"), ["A"]);
	assert_eq!(
		*domain.diagnostics(),
		[Diagnostic::UnresolvedAnchor {
			target: "menubar".into(),
			item: "D".into(),
			anchor: "ghost".into(),
		}]
	);
}

#[test]
fn expand_splices_group_children_in_place() {
	let mut domain = domain_with(&[
		("file", ItemKind::Menu),
		("a", ItemKind::Action),
		("G", ItemKind::Group),
		("x", ItemKind::Action),
		("y", ItemKind::Action),
		("b", ItemKind::Action),
	]);
	domain.add_rule("file", InsertionRule::append("menubar"));
	domain.add_rule("a", InsertionRule::append("file"));
	domain.add_rule("G", InsertionRule::append("file").expanded());
	domain.add_rule("b", InsertionRule::append("file"));
	domain.add_rule("x", InsertionRule::append("G"));
	domain.add_rule("y", InsertionRule::append("G"));

	assert_eq!(children(&domain, "file"), ["a", "x", "y", "b"]);
	assert_eq!(children(&domain, "G"), ["x", "y"]);
}

#[test]
fn nested_expand_groups_flatten_fully() {
	let mut domain = domain_with(&[("G1", ItemKind::Group), ("G2", ItemKind::Group), ("x", ItemKind::Action)]);
	domain.add_rule("G1", InsertionRule::append("menubar").expanded());
	domain.add_rule("G2", InsertionRule::append("G1").expanded());
	domain.add_rule("x", InsertionRule::append("G2"));

	assert_eq!(children(&domain, "menubar"), ["x"]);
}

#[test]
fn expand_on_plain_action_is_ignored() {
	let mut domain = domain_with(&[("a", ItemKind::Action)]);
	domain.add_rule("a", InsertionRule::append("menubar").expanded());
	assert_eq!(children(&domain, "menubar"), ["a"]);
}

#[test]
fn same_item_under_two_targets() {
	let mut domain = domain_with(&[("edit", ItemKind::Menu), ("ctx", ItemKind::Menu), ("copy", ItemKind::Action)]);
	domain.add_rule("edit", InsertionRule::append("menubar"));
	domain.add_rule("copy", InsertionRule::append("edit"));
	domain.add_rule("copy", InsertionRule::append("ctx"));

	assert_eq!(children(&domain, "edit"), ["copy"]);
	assert_eq!(children(&domain, "ctx"), ["copy"]);
}

#[test]
fn mutual_expand_cycle_is_broken_with_diagnostic() {
	let mut domain = domain_with(&[("A", ItemKind::Group), ("B", ItemKind::Group), ("x", ItemKind::Action)]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("A", InsertionRule::append("B"));
	domain.add_rule("B", InsertionRule::append("A").expanded());
	domain.add_rule("x", InsertionRule::append("B"));

	let state = domain.state();
	assert_acyclic(&state);
	assert_eq!(
		*domain.diagnostics(),
		[Diagnostic::Cycle {
			parent: "A".into(),
			child: "B".into(),
		}]
	);
	assert_eq!(children(&domain, "menubar"), ["A"]);
	assert_eq!(children(&domain, "A"), ["x"]);
	assert_eq!(children(&domain, "B"), ["A", "x"]);
}

#[test]
fn expand_cycle_is_broken_at_one_edge() {
	let mut domain = domain_with(&[("A", ItemKind::Group), ("B", ItemKind::Group), ("x", ItemKind::Action)]);
	domain.add_rule("A", InsertionRule::append("menubar").expanded());
	domain.add_rule("B", InsertionRule::append("A").expanded());
	domain.add_rule("A", InsertionRule::append("B").expanded());
	domain.add_rule("x", InsertionRule::append("B"));

	assert_eq!(
		*domain.diagnostics(),
		[Diagnostic::Cycle {
			parent: "B".into(),
			child: "A".into(),
		}]
	);
	assert_eq!(children(&domain, "menubar"), ["x"]);
	assert_eq!(children(&domain, "A"), ["x"]);
	assert_eq!(children(&domain, "B"), ["x"]);
}

#[test]
fn nested_cycle_edge_is_dropped() {
	let mut domain = domain_with(&[("A", ItemKind::Menu), ("B", ItemKind::Menu)]);
	domain.add_rule("A", InsertionRule::append("menubar"));
	domain.add_rule("B", InsertionRule::append("A"));
	domain.add_rule("A", InsertionRule::append("B"));

	assert_eq!(children(&domain, "menubar"), ["A"]);
	assert_eq!(children(&domain, "A"), ["B"]);
	assert!(children(&domain, "B").is_empty());
	assert_eq!(
		*domain.diagnostics(),
		[Diagnostic::Cycle {
			parent: "B".into(),
			child: "A".into(),
		}]
	);
}

#[test]
fn invalid_targets_and_items_are_reported() {
	let mut domain = domain_with(&[("a", ItemKind::Action), ("b", ItemKind::Action)]);
	domain.add_rule("a", InsertionRule::append("nowhere"));
	domain.add_rule("b", InsertionRule::append("a"));
	domain.add_rule("ghost", InsertionRule::append("menubar"));

	assert!(children(&domain, "menubar").is_empty());
	assert_eq!(
		*domain.diagnostics(),
		[
			Diagnostic::UnknownTarget {
				target: "nowhere".into(),
				item: "a".into(),
			},
			Diagnostic::UnknownTarget {
				target: "a".into(),
				item: "b".into(),
			},
			Diagnostic::UnknownItem {
				target: "menubar".into(),
				item: "ghost".into(),
			},
		]
	);
}

#[test]
fn override_seeds_cached_layer_only() {
	let mut domain = domain_with(&[("a", ItemKind::Action), ("b", ItemKind::Action), ("c", ItemKind::Action)]);
	domain.add_rule("a", InsertionRule::append("menubar"));
	domain.add_rule("b", InsertionRule::append("menubar"));
	domain.add_rule("c", InsertionRule::append("menubar"));

	let mut layout = DomainState::new();
	layout.insert("menubar".into(), vec!["b".into(), "gone".into(), "a".into(), "b".into()]);
	layout.insert("removed".into(), vec!["a".into()]);
	domain.set_state_override(Some(layout));

	assert_eq!(domain.cached_state()["menubar"], ["b", "a", "c"]);
	assert_eq!(domain.state()["menubar"], ["a", "b", "c"]);
	assert_eq!(
		*domain.cached_diagnostics(),
		[Diagnostic::StaleOverride {
			target: "removed".into()
		}]
	);
}

#[test]
fn rule_replacement_keeps_declaration_slot() {
	let mut domain = domain_with(&[("a", ItemKind::Action), ("b", ItemKind::Action)]);
	domain.add_rule("a", InsertionRule::append("menubar"));
	domain.add_rule("b", InsertionRule::append("menubar"));
	domain.add_rule("a", InsertionRule::append("menubar").expanded());

	let rules: Vec<_> = domain.target_rules("menubar").map(|(item, _)| item).collect();
	assert_eq!(rules, ["a", "b"]);
	assert!(domain.item_rules("a").all(|rule| rule.expand));
	assert_eq!(children(&domain, "menubar"), ["a", "b"]);
}

#[derive(Debug, Clone)]
struct RuleSpec {
	item: usize,
	target: usize,
	mode: InsertMode,
	anchor: Option<usize>,
	expand: bool,
}

const KINDS: [ItemKind; 4] = [ItemKind::Action, ItemKind::Group, ItemKind::Menu, ItemKind::Separator];

fn arb_rule(items: usize) -> impl Strategy<Value = RuleSpec> {
	(
		0..items,
		0..=items,
		prop_oneof![Just(InsertMode::Append), Just(InsertMode::Unshift)],
		prop::option::of(0..items),
		any::<bool>(),
	)
		.prop_map(|(item, target, mode, anchor, expand)| RuleSpec {
			item,
			target,
			mode,
			anchor,
			expand,
		})
}

fn arb_domain() -> impl Strategy<Value = (Vec<ItemKind>, Vec<RuleSpec>)> {
	(2usize..8).prop_flat_map(|n| {
		(
			prop::collection::vec(prop::sample::select(KINDS.to_vec()), n),
			prop::collection::vec(arb_rule(n), 0..20),
		)
	})
}

fn build((kinds, rules): &(Vec<ItemKind>, Vec<RuleSpec>)) -> ActionDomain {
	let mut domain = ActionDomain::new("prop");
	domain.add_top_level("top").unwrap();
	for (i, kind) in kinds.iter().enumerate() {
		domain.add_item(DomainItem::new(format!("i{i}"), *kind)).unwrap();
	}
	for spec in rules {
		let target = match spec.target {
			0 => "top".to_string(),
			t => format!("i{}", t - 1),
		};
		let mut rule = InsertionRule::new(target, spec.mode);
		if let Some(anchor) = spec.anchor {
			rule = rule.relative_to(format!("i{anchor}"));
		}
		if spec.expand {
			rule = rule.expanded();
		}
		domain.add_rule(format!("i{}", spec.item), rule);
	}
	domain
}

proptest! {
	#[test]
	fn resolution_is_deterministic_and_acyclic(input in arb_domain()) {
		let first = build(&input);
		let second = build(&input);

		let state = first.state();
		prop_assert_eq!(&*state, &*second.state());
		prop_assert_eq!(&*first.diagnostics(), &*second.diagnostics());
		assert_acyclic(&state);

		for list in state.values() {
			let mut sorted = list.clone();
			sorted.sort();
			sorted.dedup();
			prop_assert_eq!(sorted.len(), list.len(), "duplicate child in {:?}", list);
		}
	}

	#[test]
	fn saved_layout_resolves_acyclic(input in arb_domain()) {
		let mut domain = build(&input);
		let base = domain.state();
		domain.set_state_override(Some((*base).clone()));

		let cached = domain.cached_state();
		assert_acyclic(&cached);
		prop_assert!(!domain.is_state_dirty());
		prop_assert_eq!(&*domain.state(), &*base);
	}
}
