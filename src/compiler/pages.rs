use crate::{
    engine::{CompileInput, CompilationError, SourceInfo, TemplateEngine},
    error::BuildError,
    filesystem::Filesystem,
    site::{Attributes, ComponentTable, PageNode, PageTree, ResolvedPage, build_environment},
};
use anyhow::Result;
use std::path::Path;

/// Shared, read-only inputs of every page compilation.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub tree: &'a PageTree,
    pub config: &'a Attributes,
    pub components: &'a ComponentTable,
}

fn source_info(page: &ResolvedPage) -> SourceInfo<'_> {
    SourceInfo {
        language: page.source_type,
        path: Path::new(&page.display_path),
    }
}

/// Turn a page's front matter into its tree node.
pub async fn extract_page_data(
    page: &ResolvedPage,
    engine: &dyn TemplateEngine,
) -> Result<PageNode, CompilationError> {
    let attributes = engine
        .extract_data(&page.source.contents, source_info(page))
        .await?;

    Ok(PageNode {
        name: page.source.name.clone(),
        path: page.url_path.clone(),
        slug: page.slug().to_owned(),
        attributes,
    })
}

/// Compile one page and write its `index.html`.
///
/// Engine failures come back as [`CompilationError`] inside the `anyhow`
/// error, so the caller can tell them apart from I/O failures.
pub async fn compile_page(
    page: &ResolvedPage,
    context: PageContext<'_>,
    fs: &dyn Filesystem,
    engine: &dyn TemplateEngine,
) -> Result<()> {
    let environment = build_environment(context.tree, &page.source_key)
        .map_err(|err| BuildError::Internal(err.to_string()))?;

    let input = CompileInput {
        config: context.config,
        components: context.components,
        environment: &environment,
    };
    let html = engine
        .compile(&page.source.contents, input, source_info(page))
        .await?;

    fs.create_directory(&page.output_directory).await?;
    fs.write_file(&page.output_path, &html).await?;
    Ok(())
}
