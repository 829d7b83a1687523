//! Injectable time source so cache freshness and renewal math stay testable.

// self
use crate::_prelude::*;

/// Time source consulted for cache freshness checks and renewal scheduling.
pub trait Clock: Send + Sync {
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock implementation used outside tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}
