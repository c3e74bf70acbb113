//! Template engine capability.
//!
//! The build hands every page's raw source to a [`TemplateEngine`] twice:
//! once to pull out its front matter before the tree is built, and once to
//! compile it against the finished tree. The engine is a black box to the
//! build; [`stencil::StencilEngine`] is the one shipped with the binary.

pub mod stencil;

use crate::site::{Attributes, ComponentTable, Environment, SourceType};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use stencil::StencilEngine;

/// Engine failure with a message ready to print.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompilationError {
    pub path: PathBuf,
    pub message: String,
}

impl CompilationError {
    pub fn new(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Where a source came from.
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo<'a> {
    pub language: SourceType,
    /// Project-relative path, used in messages
    pub path: &'a Path,
}

/// Everything a page compiles against.
#[derive(Debug, Clone, Copy)]
pub struct CompileInput<'a> {
    /// Global config, exposed as `$config`
    pub config: &'a Attributes,
    pub components: &'a ComponentTable,
    pub environment: &'a Environment<'a>,
}

#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Front-matter attributes of a source.
    async fn extract_data(
        &self,
        raw: &str,
        source: SourceInfo<'_>,
    ) -> Result<Attributes, CompilationError>;

    /// Compile a source to its final HTML.
    async fn compile(
        &self,
        raw: &str,
        input: CompileInput<'_>,
        source: SourceInfo<'_>,
    ) -> Result<String, CompilationError>;
}
