//! # rtdbql - Directive-driven writes against a realtime tree store
//!
//! rtdbql resolves query fields annotated with directives into writes against a
//! path-addressed tree store, and reshapes the written values so the mutation
//! response mirrors the selection the client asked for. A client-side cache can
//! then store the response without a follow-up read.
//!
//! ## Core Concepts
//!
//! - **Directive**: `@rtdbUpdate`, `@rtdbSet`, `@rtdbRemove`, `@rtdbPush` perform
//!   writes; `@type`, `@key`, `@pushKey` answer informational leaves
//! - **Envelope**: the `{payload, __typename, generatedKey}` value a mutation
//!   field hands to its descendants
//! - **VisitContext**: per-execution state carrying the store and the path of
//!   the last mutation
//! - **TreeStore**: the store surface (`update`, `set`, `remove`, `push`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rtdbql::{Executor, InMemoryTreeStore, Selection};
//! use serde_json::json;
//!
//! let store = Arc::new(InMemoryTreeStore::new());
//! let query = Selection::from_json(&json!({
//!     "name": "createUser",
//!     "arguments": { "input": { "name": "Ana" } },
//!     "directives": { "rtdbPush": { "ref": "/users", "type": "User" } },
//!     "selections": [
//!         { "name": "id", "directives": { "pushKey": null } },
//!         { "name": "name" },
//!         { "name": "__typename" }
//!     ]
//! }))?;
//!
//! let result = Executor::new(store).execute(&[query]).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod directive;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod logging;
pub mod path;
pub mod resolver;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use config::ResolverConfig;
pub use directive::{Directive, DirectiveSet, MutationDirective, MutationKind};
pub use envelope::{Envelope, ResolvedValue};
pub use error::{ConfigError, DirectiveError, PathError, ResolveError, ResolveResult};
pub use executor::{Executor, Selection};
pub use path::PathTemplate;
pub use resolver::{Arguments, FieldInfo, FieldResolver, VisitContext};
pub use storage::{InMemoryTreeStore, PushIdGenerator, PushRef, StoreError, TreeStore};
