//! # corral-core
//!
//! Target acquisition for test jobs: picks a bounded set of devices out of a
//! catalog and reserves them exclusively, or backs out cleanly.
//!
//! Data flows through the modules in order:
//!
//! * **[`filter`]**: raw catalog records become validated, prefix-filtered targets.
//! * **[`shuffle`]**: optional random reordering for wear-leveling.
//! * **[`acquisition`]**: the quorum-aware lock attempt and its unwind.
//! * **[`manager`]**: wires a catalog and a locker through the steps above.

pub mod acquisition;
pub mod filter;
pub mod manager;
pub mod shuffle;

pub use acquisition::AcquisitionCoordinator;
pub use manager::TargetManager;
