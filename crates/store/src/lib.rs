//! `store` crate: generic data access for record+content entities.
//!
//! Each entity is one row in a record table (metadata) joined to one row in
//! a content table (timestamps and body). The [`CrudEngine`] keeps the two
//! tables paired; entity types describe their own statements through the
//! [`Entity`] trait.

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod lookup;
pub mod models;
pub mod pool;
pub mod query;
pub mod tables;

pub use config::StoreConfig;
pub use engine::{CrudEngine, Deadline};
pub use entity::Entity;
pub use error::{Result, StoreError};
pub use lookup::{HashedLookup, StaticLookup};
pub use models::{Page, Paste};
pub use pool::Driver;
pub use tables::{TablePair, Tables};
