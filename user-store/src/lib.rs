pub mod record;
pub mod rest;
pub mod store;

pub use record::{UserData, validate_id};
pub use store::{KeyedStore, MemoryStore, StoreError, UserStore};
