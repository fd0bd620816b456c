//! Binds a resolved domain layout onto toolkit containers.
//!
//! The embedder supplies one [`UiContainer`] per top-level slot plus an
//! [`ActionItem`] per concrete action, widget or submenu. [`ActionDomain::build`]
//! clears every container it touches and refills it in state order, so
//! building twice over an unchanged state yields identical contents.

use std::collections::VecDeque;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::{debug, warn};

use super::{ActionDomain, DomainState, ItemKind};


/// A toolkit menu, menu bar or toolbar being filled.
pub trait UiContainer {
	fn clear(&mut self);
	fn add_action(&mut self, id: &str);
	fn add_widget(&mut self, id: &str);
	/// Adds the entry opening submenu `id`.
	fn add_menu(&mut self, id: &str);
	fn add_separator(&mut self);
	fn add_stretch(&mut self);
	fn last_is_separator(&self) -> bool;
	fn is_empty(&self) -> bool;
}

/// What a live item wraps.
#[derive(Debug)]
pub enum ActionItemKind<C> {
	Action,
	Widget,
	/// A submenu, carrying the container its children go into.
	Menu(C),
}

/// Live binding of a domain item id to a toolkit object.
#[derive(Debug)]
pub struct ActionItem<C> {
	id: String,
	kind: ActionItemKind<C>,
}

impl<C> ActionItem<C> {
	pub fn action(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind: ActionItemKind::Action,
		}
	}

	pub fn widget(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind: ActionItemKind::Widget,
		}
	}

	pub fn menu(id: impl Into<String>, container: C) -> Self {
		Self {
			id: id.into(),
			kind: ActionItemKind::Menu(container),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn kind(&self) -> &ActionItemKind<C> {
		&self.kind
	}

	pub fn is_action(&self) -> bool {
		matches!(self.kind, ActionItemKind::Action)
	}

	pub fn is_widget(&self) -> bool {
		matches!(self.kind, ActionItemKind::Widget)
	}

	pub fn is_menu(&self) -> bool {
		matches!(self.kind, ActionItemKind::Menu(_))
	}

	pub fn as_menu(&self) -> Option<&C> {
		match &self.kind {
			ActionItemKind::Menu(container) => Some(container),
			_ => None,
		}
	}

	pub fn as_menu_mut(&mut self) -> Option<&mut C> {
		match &mut self.kind {
			ActionItemKind::Menu(container) => Some(container),
			_ => None,
		}
	}
}

/// One insertion into a container, computed before the container is
/// borrowed mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
	Action(String),
	Widget(String),
	Menu(String),
	Separator,
	Stretch,
	/// Edge of an inline group. Becomes a separator only between entries.
	GroupBoundary,
}

#[derive(Debug, Clone, Copy)]
enum Fill<'a> {
	Slot(&'a str),
	Menu(usize),
}

impl ActionDomain {
	/// Fills `top_levels` and the submenus among `items` from
	/// [`cached_state`](ActionDomain::cached_state).
	///
	/// Containers are walked breadth-first from each slot the domain knows;
	/// containers for unknown slots are left alone. Entries whose binding is
	/// missing or of the wrong kind are skipped and logged.
	///
	/// Returns `false` if any entry was skipped.
	pub fn build<C: UiContainer>(&self, top_levels: &mut IndexMap<String, C>, items: &mut [ActionItem<C>]) -> bool {
		let state = self.cached_state();

		let mut index: HashMap<&str, usize> = HashMap::default();
		for (pos, item) in items.iter().enumerate() {
			if index.contains_key(item.id()) {
				warn!(domain = %self.id, id = item.id(), "duplicate live binding ignored");
				continue;
			}
			index.insert(item.id(), pos);
		}
		let index: HashMap<String, usize> = index.into_iter().map(|(id, pos)| (id.to_string(), pos)).collect();

		let mut complete = true;
		let slots: Vec<String> = top_levels.keys().cloned().collect();
		let mut queue: VecDeque<(String, Fill<'_>)> = VecDeque::new();
		for slot in &slots {
			if self.contains_top_level(slot) {
				queue.push_back((slot.clone(), Fill::Slot(slot)));
			} else {
				debug!(domain = %self.id, slot = %slot, "container for unknown slot left untouched");
			}
		}

		let mut filled: HashSet<String> = HashSet::default();
		while let Some((id, target)) = queue.pop_front() {
			let mut ops = Vec::new();
			complete &= self.collect_ops(&id, &state, items, &index, &mut ops, &mut Vec::new());

			let container = match target {
				Fill::Slot(slot) => top_levels.get_mut(slot),
				Fill::Menu(pos) => items[pos].as_menu_mut(),
			};
			let Some(container) = container else {
				continue;
			};
			apply_ops(container, &ops);

			for op in ops {
				if let Op::Menu(menu) = op
					&& filled.insert(menu.clone())
					&& let Some(&pos) = index.get(&menu)
				{
					queue.push_back((menu, Fill::Menu(pos)));
				}
			}
		}

		complete
	}

	/// Computes the insertions for `parent`, rendering non-expanded groups
	/// inline. Returns `false` if a binding was missing.
	fn collect_ops<C>(
		&self,
		parent: &str,
		state: &DomainState,
		items: &[ActionItem<C>],
		index: &HashMap<String, usize>,
		ops: &mut Vec<Op>,
		groups: &mut Vec<String>,
	) -> bool {
		let mut complete = true;
		for child in state.get(parent).into_iter().flatten() {
			match self.item_kind(child) {
				Some(ItemKind::Separator) => ops.push(Op::Separator),
				Some(ItemKind::Stretch) => ops.push(Op::Stretch),
				Some(ItemKind::Group) => {
					if groups.contains(child) {
						continue;
					}
					groups.push(child.clone());
					ops.push(Op::GroupBoundary);
					complete &= self.collect_ops(child, state, items, index, ops, groups);
					ops.push(Op::GroupBoundary);
					groups.pop();
				}
				Some(kind) => {
					let binding = index.get(child.as_str()).map(|&pos| &items[pos]);
					match (kind, binding.map(ActionItem::kind)) {
						(ItemKind::Menu, Some(ActionItemKind::Menu(_))) => ops.push(Op::Menu(child.clone())),
						(ItemKind::Action, Some(ActionItemKind::Action)) => ops.push(Op::Action(child.clone())),
						(ItemKind::Action, Some(ActionItemKind::Widget)) => ops.push(Op::Widget(child.clone())),
						(_, None) => {
							warn!(domain = %self.id, id = %child, parent, "no live binding, entry skipped");
							complete = false;
						}
						(_, Some(_)) => {
							warn!(domain = %self.id, id = %child, kind = %kind, parent, "live binding of wrong kind, entry skipped");
							complete = false;
						}
					}
				}
				None => {
					warn!(domain = %self.id, id = %child, parent, "unknown item in layout");
					complete = false;
				}
			}
		}
		complete
	}
}

fn apply_ops<C: UiContainer>(container: &mut C, ops: &[Op]) {
	container.clear();
	let mut boundary = false;
	for op in ops {
		let separator_fits = !container.is_empty() && !container.last_is_separator();
		match op {
			Op::GroupBoundary => {
				boundary = true;
				continue;
			}
			Op::Separator => {
				if separator_fits {
					container.add_separator();
				}
			}
			_ if boundary && separator_fits => container.add_separator(),
			_ => {}
		}
		boundary = false;
		match op {
			Op::Action(id) => container.add_action(id),
			Op::Widget(id) => container.add_widget(id),
			Op::Menu(id) => container.add_menu(id),
			Op::Stretch => container.add_stretch(),
			Op::Separator | Op::GroupBoundary => {}
		}
	}
}
