//! Session change notifications.

pub mod events;
pub mod hub;

pub use events::SyncEvent;
pub use hub::SyncHub;
