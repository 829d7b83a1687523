//! User-activity contracts feeding renewal rescheduling.

// self
use crate::_prelude::*;

/// Kind of host interaction that counts as user activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
	/// Pointer movement.
	Pointer,
	/// Key press.
	Key,
	/// Click or tap.
	Click,
	/// Page became visible again.
	Visibility,
}

/// Consumer side of the activity stream; the token lifecycle implements this.
pub trait ActivityObserver: Send + Sync {
	/// Handles one observed interaction.
	fn on_activity(&self, kind: ActivityKind);
}

/// Producer side of the activity stream, implemented by host adapters.
///
/// Hosts should coalesce high-frequency events (pointer movement in particular) before
/// delivery; every delivered event re-arms the renewal timer.
pub trait ActivitySignal: Send + Sync {
	/// Registers the observer that receives subsequent interaction events.
	fn subscribe(&self, observer: Arc<dyn ActivityObserver>);
}
