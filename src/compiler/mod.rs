//! Per-page compilation stages.
//!
//! - **pages**: front-matter extraction and page compilation
//! - **assets**: copying `Assets/` into the output
//!
//! # Page Flow
//!
//! ```text
//! ResolvedPage ──► extract_page_data() ──► PageNode ──► (tree, aggregate)
//!                                                            │
//! Output/.../index.html ◄── compile_page() ◄── Environment ◄─┘
//! ```

pub mod assets;
pub mod pages;

pub use assets::copy_assets;
pub use pages::{PageContext, compile_page, extract_page_data};
