//! Host capability contracts (time, page context, user-activity signals).
//!
//! The gateway runs embedded in a host shell: a browser frontend, a desktop wrapper, or a
//! test harness. Everything the gateway needs from that shell is expressed as a trait here
//! so hosts can bring their own clock, navigation side effects, and interaction plumbing
//! without expanding the surface of `portal-gateway` itself.

pub mod activity;
pub mod clock;
pub mod navigator;

pub use activity::*;
pub use clock::*;
pub use navigator::*;
