//! Store abstraction for the user service.
//!
//! This module provides a key-addressed store with existence-aware CRUD
//! semantics, allowing handlers to work with domain objects instead of
//! raw map operations.
//!
//! # Architecture
//!
//! ```text
//! handlers.rs → Arc<dyn UserStore>
//!                     ↓
//!               MemoryStore            // logging, validation
//!                     ↓
//!               KeyedStore<UserData>   // sharded map, per-key atomicity
//! ```
//!
//! Absence is a normal return: missing keys surface as `StoreError::NotFound`,
//! duplicate creates as `StoreError::AlreadyExists`.
//!
//! # Usage
//!
//! ```ignore
//! use user_store::{MemoryStore, UserData, UserStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.create_user(UserData::new("u1", "Ann", "ann@example.com")).await?;
//! let user = store.get_user("u1").await?;
//! ```

mod error;
mod keyed;
mod memory;
mod traits;

pub use error::{Result, StoreError};
pub use keyed::KeyedStore;
pub use memory::MemoryStore;
pub use traits::*;
