//! Tree store interface and backends.
//!
//! The [`TreeStore`] trait is the only surface the resolver writes through.
//! [`InMemoryTreeStore`] is the reference backend.

mod memory;
mod push_id;
mod traits;

pub use memory::InMemoryTreeStore;
pub use push_id::{PushIdGenerator, PUSH_ID_LEN};
pub use traits::{PushRef, StoreError, TreeStore};
