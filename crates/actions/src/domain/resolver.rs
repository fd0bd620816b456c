//! Turns items and insertion rules into a [`DomainState`].
//!
//! Resolution runs in three passes:
//!
//! 1. Per target, apply rules in declaration order to build the raw child
//!    list. Rules whose anchor is not placed yet are retried after the rest,
//!    as long as some rule made progress.
//! 2. Splice the children of `expand` groups into their parents,
//!    transitively, skipping any group already on the expansion path.
//! 3. Walk the result depth-first from the top-level slots and drop every
//!    edge that points back to an ancestor.
//!
//! Nothing here fails. Every rule or edge that cannot be honoured becomes a
//! [`Diagnostic`].

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use super::{Diagnostic, DomainModel, DomainState, InsertMode, InsertionRule};

#[cfg(test)]
mod tests;

pub(crate) struct Resolution {
	pub state: DomainState,
	pub diagnostics: Vec<Diagnostic>,
}

/// Resolves `model`, seeding each target with its `overrides` list when one
/// is given.
pub(crate) fn resolve(model: &DomainModel, overrides: Option<&DomainState>) -> Resolution {
	let mut resolver = Resolver {
		model,
		diagnostics: IndexSet::new(),
	};

	let rules = resolver.rules_by_target();
	let seeds = overrides.map(|o| resolver.valid_seeds(o)).unwrap_or_default();

	let mut raw: IndexMap<&str, Vec<&str>> = IndexMap::new();
	for slot in &model.top_levels {
		raw.insert(slot.as_str(), Vec::new());
	}
	for (target, seed) in &seeds {
		raw.insert(*target, seed.clone());
	}
	for (target, target_rules) in &rules {
		let seed = seeds.get(target).map(Vec::as_slice);
		let list = resolver.place(*target, target_rules, seed);
		raw.insert(*target, list);
	}

	let expand: HashSet<(&str, &str)> = rules
		.iter()
		.flat_map(|(target, rules)| {
			rules
				.iter()
				.filter(|(item, rule)| rule.expand && model.items.get(*item).is_some_and(|i| i.kind.is_container()))
				.map(move |(item, _)| (*target, *item))
		})
		.collect();

	let mut flattened = HashMap::default();
	let mut state = DomainState::new();
	for target in raw.keys().copied() {
		let flat = resolver.flatten(target, &raw, &expand, &mut Vec::new(), &mut flattened);
		state.insert(target.to_string(), dedup(flat));
	}

	resolver.break_cycles(&mut state);

	Resolution {
		state,
		diagnostics: resolver.diagnostics.into_iter().collect(),
	}
}

struct Resolver<'a> {
	model: &'a DomainModel,
	/// Each problem is reported once per resolution.
	diagnostics: IndexSet<Diagnostic>,
}

type TargetRules<'a> = Vec<(&'a str, &'a InsertionRule)>;

impl<'a> Resolver<'a> {
	/// Groups valid rules by target, keeping declaration order within each.
	fn rules_by_target(&mut self) -> IndexMap<&'a str, TargetRules<'a>> {
		let model = self.model;
		let mut grouped: IndexMap<&'a str, TargetRules<'a>> = IndexMap::new();
		for entry in &model.rules {
			let target = entry.rule.target.as_str();
			let item = entry.item.as_str();

			if !model.items.contains_key(item) {
				self.diagnostics.insert(Diagnostic::UnknownItem {
					target: target.to_string(),
					item: item.to_string(),
				});
				continue;
			}
			if !model.is_target(target) {
				self.diagnostics.insert(Diagnostic::UnknownTarget {
					target: target.to_string(),
					item: item.to_string(),
				});
				continue;
			}
			if target == item {
				self.cycle(target, item);
				continue;
			}
			grouped.entry(target).or_default().push((item, &entry.rule));
		}
		grouped
	}

	/// Filters a persisted layout down to known targets and items.
	fn valid_seeds(&mut self, overrides: &DomainState) -> IndexMap<&'a str, Vec<&'a str>> {
		let model = self.model;
		let mut seeds = IndexMap::new();
		for (target, children) in overrides {
			let Some(target) = self.canonical_target(target) else {
				self.diagnostics.insert(Diagnostic::StaleOverride { target: target.clone() });
				continue;
			};
			let mut seen = HashSet::default();
			let list: Vec<&'a str> = children
				.iter()
				.filter_map(|child| model.items.get_key_value(child.as_str()))
				.map(|(id, _)| id.as_str())
				.filter(|child| *child != target && seen.insert(*child))
				.collect();
			seeds.insert(target, list);
		}
		seeds
	}

	/// The model's own copy of a target id, if `id` is a valid target.
	fn canonical_target(&self, id: &str) -> Option<&'a str> {
		let model = self.model;
		if let Some(slot) = model.top_levels.get(id) {
			return Some(slot.as_str());
		}
		model
			.items
			.get_key_value(id)
			.filter(|(_, item)| item.kind.is_container())
			.map(|(key, _)| key.as_str())
	}

	/// Applies the rules of one target on top of its seed.
	fn place(&mut self, target: &'a str, rules: &TargetRules<'a>, seed: Option<&[&'a str]>) -> Vec<&'a str> {
		let mut list: Vec<&'a str> = seed.map(<[_]>::to_vec).unwrap_or_default();
		let mut pending: Vec<(&'a str, &'a InsertionRule)> = rules
			.iter()
			.filter(|(item, _)| seed.is_none_or(|s| !s.contains(item)))
			.copied()
			.collect();

		while !pending.is_empty() {
			let mut deferred = Vec::new();
			for (item, rule) in pending.iter().copied() {
				if !apply(&mut list, item, rule) {
					deferred.push((item, rule));
				}
			}
			if deferred.len() == pending.len() {
				break;
			}
			pending = deferred;
		}

		for (item, rule) in pending {
			self.diagnostics.insert(Diagnostic::UnresolvedAnchor {
				target: target.to_string(),
				item: item.to_string(),
				anchor: rule.relative_to.clone().unwrap_or_default(),
			});
		}
		list
	}

	/// Children of `target` with expanded groups spliced in.
	///
	/// Each target is flattened once per resolution, so a cycle through
	/// expanded groups is broken at the same edge whichever target is read.
	fn flatten(
		&mut self,
		target: &'a str,
		raw: &IndexMap<&'a str, Vec<&'a str>>,
		expand: &HashSet<(&'a str, &'a str)>,
		visiting: &mut Vec<&'a str>,
		flattened: &mut HashMap<&'a str, Vec<&'a str>>,
	) -> Vec<&'a str> {
		if let Some(done) = flattened.get(target) {
			return done.clone();
		}
		let mut out = Vec::new();
		visiting.push(target);
		for &child in raw.get(target).into_iter().flatten() {
			if !expand.contains(&(target, child)) {
				out.push(child);
				continue;
			}
			if visiting.contains(&child) {
				self.cycle(target, child);
				continue;
			}
			let spliced = self.flatten(child, raw, expand, visiting, flattened);
			if spliced.contains(&target) {
				self.cycle(target, child);
			}
			out.extend(spliced.into_iter().filter(|id| *id != target));
		}
		visiting.pop();
		flattened.insert(target, out.clone());
		out
	}

	/// Drops edges pointing at an ancestor, visiting slots first, then the
	/// remaining targets in key order.
	fn break_cycles(&mut self, state: &mut DomainState) {
		let mut order: Vec<String> = self.model.top_levels.iter().cloned().collect();
		order.extend(
			state
				.keys()
				.filter(|key| !self.model.top_levels.contains(key.as_str()))
				.cloned(),
		);

		let mut walk = CycleWalk::default();
		for root in &order {
			walk.visit(root, state, &mut self.diagnostics);
		}
	}

	fn cycle(&mut self, parent: &str, child: &str) {
		self.diagnostics.insert(Diagnostic::Cycle {
			parent: parent.to_string(),
			child: child.to_string(),
		});
	}
}

/// Inserts `item` per `rule`. Returns `false` if the anchor is not placed.
fn apply<'a>(list: &mut Vec<&'a str>, item: &'a str, rule: &InsertionRule) -> bool {
	if list.contains(&item) {
		return true;
	}
	let Some(anchor) = rule.relative_to.as_deref() else {
		match rule.mode {
			InsertMode::Append => list.push(item),
			InsertMode::Unshift => list.insert(0, item),
		}
		return true;
	};
	let Some(pos) = list.iter().position(|entry| *entry == anchor) else {
		return false;
	};
	match rule.mode {
		InsertMode::Append => list.insert(pos + 1, item),
		InsertMode::Unshift => list.insert(pos, item),
	}
	true
}

fn dedup(list: Vec<&str>) -> Vec<String> {
	let mut seen = HashSet::default();
	list.into_iter()
		.filter(|id| seen.insert(*id))
		.map(str::to_string)
		.collect()
}

#[derive(Default)]
struct CycleWalk {
	on_path: HashSet<String>,
	done: HashSet<String>,
}

impl CycleWalk {
	fn visit(&mut self, node: &str, state: &mut DomainState, diagnostics: &mut IndexSet<Diagnostic>) {
		if self.done.contains(node) {
			return;
		}
		self.on_path.insert(node.to_string());

		let children = state.get_mut(node).map(std::mem::take).unwrap_or_default();
		let mut kept = Vec::with_capacity(children.len());
		for child in children {
			if self.on_path.contains(&child) {
				diagnostics.insert(Diagnostic::Cycle {
					parent: node.to_string(),
					child,
				});
				continue;
			}
			if state.contains_key(&child) {
				self.visit(&child, state, diagnostics);
			}
			kept.push(child);
		}
		if let Some(slot) = state.get_mut(node) {
			*slot = kept;
		}

		self.on_path.remove(node);
		self.done.insert(node.to_string());
	}
}
