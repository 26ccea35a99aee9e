//! Client-side preference state: in-memory, mirrored to a local blob,
//! pushed to the remote record through one explicit sync function.

mod store;

pub use store::{PreferenceState, PreferenceStore};
