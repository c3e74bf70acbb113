//! The page tree indexer and conflict resolver.
//!
//! ```text
//! SourceFile ─► route::resolve ─► conflict::check ─► tree::insert ─► aggregate ─► context
//! ```

pub mod component;
pub mod conflict;
pub mod context;
pub mod key;
pub mod route;
pub mod tree;

pub use component::{Component, ComponentTable};
pub use context::{Environment, build_environment};
pub use key::DottedKey;
pub use route::{ResolvedPage, SourceType};
pub use tree::{Attributes, PageNode, PageTree};
