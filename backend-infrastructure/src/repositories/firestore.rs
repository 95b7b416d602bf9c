// Firestore REST (v1) backed attendee directory

pub mod client;
pub mod store;
pub mod value;

pub use client::{CommitError, FirestoreClient};
pub use store::FirestoreCheckInStore;
pub use value::{Document, FieldValue};
