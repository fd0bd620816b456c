//! Shortcut disambiguation across overlapping widgets.
//!
//! Several live widgets may carry actions that want the same key sequence.
//! A [`ShortcutContext`] tracks which widgets hold which actions, captures
//! each action's desired shortcuts when first seen and, on [`pump`], hands
//! every sequence to the highest-precedence action that wants it. Losers get
//! the remaining subset written back through the [`ShortcutHost`].
//!
//! Events only mark the context pending. The embedder calls [`pump`] once
//! per event-loop turn so that a burst of changes costs one recomputation.
//!
//! [`pump`]: ShortcutContext::pump

use std::fmt::Debug;
use std::hash::Hash;

use appcore_keyseq::KeySequence;

mod context;

pub use context::{FixReport, ShortcutConflict, ShortcutContext};

/// Toolkit access used by a [`ShortcutContext`].
pub trait ShortcutHost {
	type Widget: Clone + Eq + Hash + Debug;
	type Action: Clone + Eq + Hash + Debug;

	/// Actions attached to `widget`, in attachment order.
	fn widget_actions(&self, widget: &Self::Widget) -> Vec<Self::Action>;

	/// Shortcuts currently set on `action`.
	fn shortcuts(&self, action: &Self::Action) -> Vec<KeySequence>;

	fn set_shortcuts(&mut self, action: &Self::Action, keys: Vec<KeySequence>);
}
