//! [`Locker`](corral_common::locker::Locker) backends.

mod in_memory;
mod noop;

pub use in_memory::InMemoryLocker;
pub use noop::NoopLocker;
