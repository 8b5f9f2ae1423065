//! Observer plumbing
//!
//! A grid publishes `GridEvent`s through an `EventBus`; UI drivers subscribe
//! to keep toolbars, headers and paging controls in sync.

pub mod dispatcher;
pub mod events;
