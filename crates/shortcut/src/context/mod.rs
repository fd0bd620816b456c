use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use appcore_keyseq::{KeySequence, format_list};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::{debug, trace, warn};

use crate::ShortcutHost;


/// Sequences an action lost to a higher-precedence action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutConflict<A> {
	/// Action left with a reduced shortcut list.
	pub action: A,
	/// Action that kept the sequences.
	pub winner: A,
	pub keys: Vec<KeySequence>,
}

/// Outcome of one [`ShortcutContext::pump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixReport<A> {
	pub conflicts: Vec<ShortcutConflict<A>>,
	/// Number of actions whose shortcuts were rewritten.
	pub updated: usize,
}

impl<A> Default for FixReport<A> {
	fn default() -> Self {
		Self {
			conflicts: Vec::new(),
			updated: 0,
		}
	}
}

#[derive(Debug)]
struct WidgetEntry<A> {
	priority: i32,
	actions: IndexSet<A>,
}

#[derive(Debug)]
struct ActionEntry<W> {
	/// Shortcuts the action asked for before any disambiguation.
	desired: Vec<KeySequence>,
	widgets: IndexSet<W>,
	/// Last list the context settled on. A change reporting exactly this
	/// list is an echo of our own write.
	applied: Option<Vec<KeySequence>>,
}

/// Live widget/action population sharing one shortcut space.
///
/// Lower priority values take precedence; equal priorities fall back to the
/// order widgets were added.
#[derive(Debug)]
pub struct ShortcutContext<W, A> {
	groups: BTreeMap<i32, IndexSet<W>>,
	widgets: IndexMap<W, WidgetEntry<A>>,
	actions: IndexMap<A, ActionEntry<W>>,
	pending: bool,
	fixing: bool,
}

impl<W, A> Default for ShortcutContext<W, A> {
	fn default() -> Self {
		Self {
			groups: BTreeMap::new(),
			widgets: IndexMap::new(),
			actions: IndexMap::new(),
			pending: false,
			fixing: false,
		}
	}
}

impl<W, A> ShortcutContext<W, A>
where
	W: Clone + Eq + Hash + Debug,
	A: Clone + Eq + Hash + Debug,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts tracking `widget` and the actions attached to it. Ignored if
	/// the widget is already tracked.
	pub fn add_widget<H>(&mut self, host: &H, widget: W, priority: i32)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if self.widgets.contains_key(&widget) {
			debug!(?widget, "widget already in shortcut context");
			return;
		}
		self.groups.entry(priority).or_default().insert(widget.clone());
		self.widgets.insert(
			widget.clone(),
			WidgetEntry {
				priority,
				actions: IndexSet::new(),
			},
		);
		for action in host.widget_actions(&widget) {
			self.attach(host, &widget, action);
		}
		trace!(?widget, priority, "widget added to shortcut context");
		self.post_fix();
	}

	/// Stops tracking `widget`. Actions no other widget holds get their
	/// desired shortcuts back immediately.
	pub fn remove_widget<H>(&mut self, host: &mut H, widget: &W)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		let Some(entry) = self.widgets.shift_remove(widget) else {
			return;
		};
		if let Some(group) = self.groups.get_mut(&entry.priority) {
			group.shift_remove(widget);
			if group.is_empty() {
				self.groups.remove(&entry.priority);
			}
		}
		for action in &entry.actions {
			self.release(host, widget, action);
		}
		trace!(?widget, "widget removed from shortcut context");
		self.post_fix();
	}

	/// Re-reads the actions of `widget`: new ones are appended, vanished ones
	/// released and external shortcut edits recaptured.
	pub fn widget_actions_changed<H>(&mut self, host: &mut H, widget: &W)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		let Some(entry) = self.widgets.get(widget) else {
			return;
		};
		let current: IndexSet<A> = host.widget_actions(widget).into_iter().collect();
		let removed: Vec<A> = entry.actions.iter().filter(|a| !current.contains(*a)).cloned().collect();
		let reordered = !removed.is_empty() || !entry.actions.iter().eq(current.iter());

		let mut changed = reordered;
		for action in &removed {
			self.detach(host, widget, action);
		}
		for action in &current {
			if self.widgets.get(widget).is_some_and(|entry| entry.actions.contains(action)) {
				changed |= self.recapture(host, action);
			} else {
				self.attach(host, widget, action.clone());
			}
		}
		if let Some(entry) = self.widgets.get_mut(widget) {
			entry.actions = current;
		}
		if changed {
			self.post_fix();
		}
	}

	pub fn action_added<H>(&mut self, host: &H, widget: &W, action: A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if self.widgets.get(widget).is_some_and(|entry| !entry.actions.contains(&action)) {
			self.attach(host, widget, action);
			self.post_fix();
		}
	}

	pub fn action_removed<H>(&mut self, host: &mut H, widget: &W, action: &A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if self.widgets.get(widget).is_some_and(|entry| entry.actions.contains(action)) {
			self.detach(host, widget, action);
			self.post_fix();
		}
	}

	/// Notes a shortcut change on `action`. Changes caused by the context's
	/// own writes are ignored; anything else becomes the new desired list.
	pub fn action_changed<H>(&mut self, host: &H, action: &A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if self.fixing {
			return;
		}
		if self.recapture(host, action) {
			self.post_fix();
		}
	}

	pub fn is_pending(&self) -> bool {
		self.pending
	}

	/// Runs the scheduled recomputation, if any.
	///
	/// Walks priority groups in ascending order, widgets in add order and
	/// actions in attachment order. Each action is visited once and claims
	/// the desired sequences nobody before it claimed.
	pub fn pump<H>(&mut self, host: &mut H) -> Option<FixReport<A>>
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if !self.pending {
			return None;
		}
		self.pending = false;
		self.fixing = true;

		let mut report = FixReport::default();
		let mut claimed: HashMap<KeySequence, A> = HashMap::default();
		let mut seen: HashSet<A> = HashSet::default();

		for widget in self.groups.values().flatten() {
			let Some(entry) = self.widgets.get(widget) else {
				continue;
			};
			for action in &entry.actions {
				if !seen.insert(action.clone()) {
					continue;
				}
				let Some(state) = self.actions.get_mut(action) else {
					continue;
				};

				let mut effective = Vec::with_capacity(state.desired.len());
				let mut lost: IndexMap<A, Vec<KeySequence>> = IndexMap::new();
				for key in &state.desired {
					match claimed.get(key) {
						Some(owner) if owner == action => {}
						Some(owner) => lost.entry(owner.clone()).or_default().push(key.clone()),
						None => {
							claimed.insert(key.clone(), action.clone());
							effective.push(key.clone());
						}
					}
				}
				report
					.conflicts
					.extend(lost.into_iter().map(|(winner, keys)| ShortcutConflict {
						action: action.clone(),
						winner,
						keys,
					}));

				if host.shortcuts(action) != effective {
					host.set_shortcuts(action, effective.clone());
					report.updated += 1;
				}
				state.applied = Some(effective);
			}
		}
		self.fixing = false;

		for conflict in &report.conflicts {
			warn!(
				action = ?conflict.action,
				winner = ?conflict.winner,
				keys = %format_list(&conflict.keys),
				"shortcut conflict, sequences dropped"
			);
		}
		debug!(
			actions = seen.len(),
			updated = report.updated,
			conflicts = report.conflicts.len(),
			"shortcut pass complete"
		);
		Some(report)
	}

	/// Tracked widgets in precedence order.
	pub fn widgets(&self) -> impl Iterator<Item = &W> {
		self.groups.values().flatten()
	}

	pub fn contains_widget(&self, widget: &W) -> bool {
		self.widgets.contains_key(widget)
	}

	pub fn priority(&self, widget: &W) -> Option<i32> {
		self.widgets.get(widget).map(|entry| entry.priority)
	}

	/// Actions tracked for `widget`, in attachment order.
	pub fn widget_actions(&self, widget: &W) -> impl Iterator<Item = &A> {
		self.widgets.get(widget).into_iter().flat_map(|entry| entry.actions.iter())
	}

	pub fn contains_action(&self, action: &A) -> bool {
		self.actions.contains_key(action)
	}

	/// Shortcuts `action` asked for before disambiguation.
	pub fn desired_shortcuts(&self, action: &A) -> Option<&[KeySequence]> {
		self.actions.get(action).map(|entry| entry.desired.as_slice())
	}

	fn post_fix(&mut self) {
		if !self.pending {
			trace!("shortcut pass scheduled");
		}
		self.pending = true;
	}

	fn attach<H>(&mut self, host: &H, widget: &W, action: A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		let Some(entry) = self.widgets.get_mut(widget) else {
			return;
		};
		if !entry.actions.insert(action.clone()) {
			return;
		}
		if !self.actions.contains_key(&action) {
			let desired = host.shortcuts(&action);
			self.actions.insert(
				action.clone(),
				ActionEntry {
					desired,
					widgets: IndexSet::new(),
					applied: None,
				},
			);
		}
		if let Some(state) = self.actions.get_mut(&action) {
			state.widgets.insert(widget.clone());
		}
	}

	fn detach<H>(&mut self, host: &mut H, widget: &W, action: &A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		if let Some(entry) = self.widgets.get_mut(widget) {
			entry.actions.shift_remove(action);
		}
		self.release(host, widget, action);
	}

	/// Drops the `widget` claim on `action`, untracking and restoring the
	/// action once no widget holds it.
	fn release<H>(&mut self, host: &mut H, widget: &W, action: &A)
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		let Some(state) = self.actions.get_mut(action) else {
			return;
		};
		state.widgets.shift_remove(widget);
		if !state.widgets.is_empty() {
			return;
		}
		let Some(state) = self.actions.shift_remove(action) else {
			return;
		};
		if host.shortcuts(action) != state.desired {
			self.fixing = true;
			host.set_shortcuts(action, state.desired);
			self.fixing = false;
			trace!(?action, "desired shortcuts restored");
		}
	}

	/// Adopts an external shortcut edit as the new desired list. Returns
	/// whether anything changed.
	fn recapture<H>(&mut self, host: &H, action: &A) -> bool
	where
		H: ShortcutHost<Widget = W, Action = A>,
	{
		let Some(state) = self.actions.get_mut(action) else {
			return false;
		};
		let current = host.shortcuts(action);
		let expected = state.applied.as_ref().unwrap_or(&state.desired);
		if *expected == current {
			return false;
		}
		debug!(?action, keys = %format_list(&current), "shortcuts changed outside the context");
		state.desired = current;
		state.applied = None;
		true
	}
}
