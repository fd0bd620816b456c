//! Synchronous observer lists.

use std::fmt;
use std::sync::Arc;

/// Handle returned by [`Notifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Typed list of subscribers, invoked in subscription order on [`emit`].
///
/// [`emit`]: Notifier::emit
pub struct Notifier<E> {
	next_id: u64,
	subscribers: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Default for Notifier<E> {
	fn default() -> Self {
		Self {
			next_id: 0,
			subscribers: Vec::new(),
		}
	}
}

impl<E> fmt::Debug for Notifier<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Notifier")
			.field("subscribers", &self.subscribers.len())
			.finish()
	}
}

impl<E> Notifier<E> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
	where
		F: Fn(&E) + Send + Sync + 'static,
	{
		let id = SubscriptionId(self.next_id);
		self.next_id += 1;
		self.subscribers.push((id, Arc::new(callback)));
		id
	}

	/// Removes a subscriber. Returns `false` if the id was unknown.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.subscribers.len();
		self.subscribers.retain(|(sub, _)| *sub != id);
		self.subscribers.len() != before
	}

	pub fn emit(&self, event: &E) {
		for (_, callback) in &self.subscribers {
			callback(event);
		}
	}

	pub fn len(&self) -> usize {
		self.subscribers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.subscribers.is_empty()
	}
}
