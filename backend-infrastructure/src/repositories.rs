pub mod firestore;
pub mod memory_store;
pub mod roster_file;

pub use firestore::FirestoreCheckInStore;
pub use memory_store::InMemoryCheckInStore;
pub use roster_file::{RosterEntry, RosterFileRepository};
