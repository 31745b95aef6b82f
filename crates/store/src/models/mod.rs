//! Concrete entities stored by this crate.
//!
//! Both follow the same shape: a metadata record row joined to a content row.

pub mod page;
pub mod paste;

pub use page::Page;
pub use paste::Paste;
