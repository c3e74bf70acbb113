//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── check Pages/ and Components/ exist
//!     ├── discover + resolve pages, discover components
//!     ├── conflict::check()          ── fails before anything is written
//!     ├── load Config/*.toml
//!     ├── build_tree()
//!     │       ├── extract_page_data() for every page
//!     │       ├── PageTree::insert()
//!     │       └── PageTree::aggregate()
//!     ├── prepare Output/
//!     ├── compile_pages()            ── at most `jobs` pages in flight
//!     └── copy_assets()
//! ```
//!
//! A failing page does not stop the others; every page failure, from the
//! engine or from writing its output, is collected and reported together once
//! all pages were attempted. Pages that compiled stay on disk.

use crate::{
    compiler::{PageContext, compile_page, copy_assets, extract_page_data},
    config::{self, ProjectPaths, SiteConfig},
    engine::{CompilationError, TemplateEngine},
    error::{BuildError, header},
    filesystem::Filesystem,
    log,
    logger::{self, Progress},
    site::{Attributes, ComponentTable, PageTree, ResolvedPage, component, conflict, route},
};
use anyhow::{Result, bail};
use futures::{StreamExt, stream};

/// What a build produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub assets: usize,
}

/// Build the entire site described by `config`.
pub async fn build_site(
    config: &SiteConfig,
    fs: &dyn Filesystem,
    engine: &dyn TemplateEngine,
) -> Result<BuildReport> {
    let paths = &config.paths;
    let jobs = config.build.jobs.max(1);

    for (directory, name) in [
        (&paths.pages, config::PAGES_DIR),
        (&paths.components, config::COMPONENTS_DIR),
    ] {
        if !fs.exists(directory).await {
            bail!(BuildError::MissingDirectory(name.into()));
        }
    }

    // ========================================================================
    // Discover and check
    // ========================================================================

    let pages = discover_pages(paths, fs).await?;
    let components = component::discover(fs.list_files(&paths.components).await?, &paths.components);
    log!("build"; "found {} pages, {} components", pages.len(), components.len());

    conflict::check(&pages, &components)?;
    let components = ComponentTable::new(components);

    let globals = if fs.exists(&paths.config).await {
        config::load_globals(fs.list_files(&paths.config).await?)?
    } else {
        Attributes::new()
    };

    let tree = build_tree(&pages, engine, jobs).await?;

    // ========================================================================
    // Write
    // ========================================================================

    if config.build.clean {
        fs.remove_directory(&paths.output).await?;
    }
    fs.create_directory(&paths.output).await?;

    let context = PageContext {
        tree: &tree,
        config: &globals,
        components: &components,
    };
    compile_pages(&pages, context, fs, engine, jobs, config.build.progress).await?;

    let assets = if config.build.assets.enable {
        copy_assets(paths, fs).await?
    } else {
        0
    };

    Ok(BuildReport {
        pages: pages.len(),
        assets,
    })
}

async fn discover_pages(paths: &ProjectPaths, fs: &dyn Filesystem) -> Result<Vec<ResolvedPage>> {
    let files = fs.list_files(&paths.pages).await?;
    let pages = files
        .into_iter()
        .map(|file| route::resolve(file, &paths.pages, &paths.output))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(pages)
}

/// Extract every page's data, insert it and aggregate.
///
/// Reports all extraction failures at once. Structural clashes were already
/// ruled out by [`conflict::check`], so an insert failure is a bug.
async fn build_tree(
    pages: &[ResolvedPage],
    engine: &dyn TemplateEngine,
    jobs: usize,
) -> Result<PageTree> {
    let extracted: Vec<_> = stream::iter(pages)
        .map(|page| extract_page_data(page, engine))
        .buffered(jobs)
        .collect()
        .await;

    let mut tree = PageTree::new();
    let mut failures = Vec::new();

    for (page, node) in pages.iter().zip(extracted) {
        match node {
            Ok(node) => {
                tree.insert(&page.source_key, node)
                    .map_err(|err| BuildError::Internal(err.to_string()))?;
            }
            Err(err) => failures.push(err),
        }
    }

    if !failures.is_empty() {
        bail!(BuildError::Compilation(failures));
    }

    tree.aggregate();
    Ok(tree)
}

/// Compile and write every page, `jobs` at a time.
async fn compile_pages(
    pages: &[ResolvedPage],
    context: PageContext<'_>,
    fs: &dyn Filesystem,
    engine: &dyn TemplateEngine,
    jobs: usize,
    show_progress: bool,
) -> Result<()> {
    let progress = Progress::new("pages", pages.len(), show_progress);
    let progress = &progress;

    let results: Vec<(&ResolvedPage, Result<()>)> = stream::iter(pages)
        .map(|page| async move {
            let result = compile_page(page, context, fs, engine).await;
            progress.inc();
            (page, result)
        })
        .buffer_unordered(jobs)
        .collect()
        .await;

    progress.finish();

    let mut failures: Vec<CompilationError> = Vec::new();
    let mut internal = None;
    for (page, result) in results {
        let Err(err) = result else {
            continue;
        };
        if err.downcast_ref::<BuildError>().is_some() {
            if internal.is_none() {
                internal = Some(err);
            }
            continue;
        }
        match err.downcast::<CompilationError>() {
            Ok(err) => failures.push(err),
            Err(err) => failures.push(write_failure(page, &err)),
        }
    }

    // Completion order is arbitrary
    failures.sort_by(|a, b| a.path.cmp(&b.path));

    if let Some(err) = internal {
        for failure in &failures {
            logger::report(&failure.message);
        }
        return Err(err);
    }
    if !failures.is_empty() {
        bail!(BuildError::Compilation(failures));
    }

    log!("build"; "compiled {} pages", progress.count());
    Ok(())
}

/// A page whose output could not be written, reported like any other page failure.
fn write_failure(page: &ResolvedPage, err: &anyhow::Error) -> CompilationError {
    CompilationError::new(
        page.display_path.clone().into(),
        format!(
            "{}\n\nThe output of \"{}\" could not be written:\n\n     {err:#}",
            header("Write failed"),
            page.display_path
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::{CompileInput, SourceInfo, StencilEngine},
        filesystem::memory::MemoryFilesystem,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;

    /// Memory filesystem whose writes below one directory fail.
    struct FailingWrites {
        inner: MemoryFilesystem,
        broken: &'static str,
    }

    #[async_trait]
    impl Filesystem for FailingWrites {
        async fn list_files(&self, dir: &Path) -> Result<Vec<crate::filesystem::SourceFile>> {
            self.inner.list_files(dir).await
        }

        async fn exists(&self, path: &Path) -> bool {
            self.inner.exists(path).await
        }

        async fn create_directory(&self, path: &Path) -> Result<()> {
            self.inner.create_directory(path).await
        }

        async fn remove_directory(&self, path: &Path) -> Result<()> {
            self.inner.remove_directory(path).await
        }

        async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
            if path.starts_with(self.broken) {
                bail!("disk full");
            }
            self.inner.write_file(path, contents).await
        }

        async fn copy_directory_contents(&self, src: &Path, dst: &Path) -> Result<usize> {
            self.inner.copy_directory_contents(src, dst).await
        }
    }

    /// Engine double: attributes from `key=value` lines, output is the raw
    /// source plus the page's URL, and any source containing `FAIL` fails.
    #[derive(Default)]
    struct RecordingEngine {
        compiled: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TemplateEngine for RecordingEngine {
        async fn extract_data(
            &self,
            raw: &str,
            source: SourceInfo<'_>,
        ) -> Result<Attributes, CompilationError> {
            if raw.contains("BAD DATA") {
                return Err(CompilationError::new(source.path.to_path_buf(), "bad data"));
            }
            Ok(raw
                .lines()
                .filter_map(|line| line.split_once('='))
                .map(|(k, v)| (k.to_owned(), v.into()))
                .collect())
        }

        async fn compile(
            &self,
            raw: &str,
            input: CompileInput<'_>,
            source: SourceInfo<'_>,
        ) -> Result<String, CompilationError> {
            self.compiled.lock().push(source.path.display().to_string());
            if raw.contains("FAIL") {
                return Err(CompilationError::new(
                    source.path.to_path_buf(),
                    format!("failed {}", source.path.display()),
                ));
            }
            let path = input.environment.attributes.get("path").cloned().unwrap_or_default();
            Ok(format!("{raw}|{}", path.as_str().unwrap_or_default()))
        }
    }

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.paths = ProjectPaths::new(Path::new("/site"));
        config.build.progress = false;
        config
    }

    fn project() -> MemoryFilesystem {
        MemoryFilesystem::new()
            .with_directory("/site/Pages")
            .with_directory("/site/Components")
    }

    fn writes(fs: &MemoryFilesystem) -> Vec<String> {
        fs.journal()
            .into_iter()
            .filter(|entry| !entry.starts_with("mkdir"))
            .collect()
    }

    #[tokio::test]
    async fn test_build_writes_every_page() {
        let fs = project()
            .with_file("/site/Pages/Index.stencil", "home")
            .with_file("/site/Pages/About.stencil", "about")
            .with_file("/site/Pages/Blog/Index.md", "blog")
            .with_file("/site/Pages/Blog/FirstPost.md", "first")
            .with_file("/site/Assets/logo.svg", "<svg/>");
        let engine = RecordingEngine::default();

        let report = build_site(&config(), &fs, &engine).await.unwrap();

        assert_eq!(report, BuildReport { pages: 4, assets: 1 });
        assert_eq!(fs.read("/site/Output/index.html").as_deref(), Some("home|/"));
        assert_eq!(fs.read("/site/Output/about/index.html").as_deref(), Some("about|/about/"));
        assert_eq!(fs.read("/site/Output/blog/index.html").as_deref(), Some("blog|/blog/"));
        assert_eq!(
            fs.read("/site/Output/blog/first-post/index.html").as_deref(),
            Some("first|/blog/first-post/")
        );
        assert_eq!(fs.read("/site/Output/logo.svg").as_deref(), Some("<svg/>"));
    }

    #[tokio::test]
    async fn test_missing_directories() {
        let fs = MemoryFilesystem::new().with_directory("/site/Components");
        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::MissingDirectory(name)) if name == "Pages"));

        let fs = MemoryFilesystem::new().with_directory("/site/Pages");
        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::MissingDirectory(name)) if name == "Components"));
    }

    #[tokio::test]
    async fn test_conflict_writes_nothing() {
        let fs = project()
            .with_file("/site/Pages/Articles.stencil", "a")
            .with_file("/site/Pages/Articles/Index.stencil", "b")
            .with_file("/site/Output/stale.html", "old");
        let engine = RecordingEngine::default();

        let err = build_site(&config(), &fs, &engine).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::DuplicatePagesFromFileAndFolder(_))
        ));
        assert!(fs.journal().is_empty());
        assert!(engine.compiled.lock().is_empty());
        assert_eq!(fs.read("/site/Output/stale.html").as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_component_conflict_writes_nothing() {
        let fs = project()
            .with_file("/site/Pages/Index.stencil", "home")
            .with_file("/site/Components/Button.stencil", "x")
            .with_file("/site/Components/ui/Button.stencil", "y");

        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();

        let Some(BuildError::DuplicateComponentName(duplicates)) = err.downcast_ref::<BuildError>() else {
            panic!("expected duplicate components, got {err:#}");
        };
        assert_eq!(duplicates[0].paths.len(), 2);
        assert!(fs.journal().is_empty());
    }

    #[tokio::test]
    async fn test_page_directory_clash_writes_nothing() {
        let fs = project()
            .with_file("/site/Pages/Articles.stencil", "a")
            .with_file("/site/Pages/Articles/First.stencil", "b")
            .with_file("/site/Pages/Articles/Second.stencil", "c");

        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();

        let Some(BuildError::PageDirectoryClash(clashes)) = err.downcast_ref::<BuildError>() else {
            panic!("expected a clash, got {err:#}");
        };
        assert_eq!(clashes.len(), 1);
        assert_eq!(clashes[0].key, "Articles");
        assert_eq!(clashes[0].files.len(), 3);
        assert!(fs.journal().is_empty());
    }

    #[tokio::test]
    async fn test_clash_is_reported_before_data_errors() {
        let fs = project()
            .with_file("/site/Pages/Articles.stencil", "BAD DATA")
            .with_file("/site/Pages/Articles/First.stencil", "b");

        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::PageDirectoryClash(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_page_file() {
        let fs = project().with_file("/site/Pages/notes.txt", "x");
        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::UnsupportedPageFile(_))));
    }

    #[tokio::test]
    async fn test_binary_files_on_disk() {
        use crate::filesystem::LocalFilesystem;
        use std::fs;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Pages")).unwrap();
        fs::create_dir_all(dir.path().join("Components")).unwrap();
        fs::write(dir.path().join("Pages/Index.stencil"), "home").unwrap();
        fs::write(dir.path().join("Components/icon.png"), [0x89, 0xff, 0xfe]).unwrap();

        let mut config = config();
        config.paths = ProjectPaths::new(dir.path());

        let report = build_site(&config, &LocalFilesystem, &RecordingEngine::default())
            .await
            .unwrap();
        assert_eq!(report.pages, 1);

        fs::write(dir.path().join("Pages/photo.png"), [0x89, 0xff, 0xfe]).unwrap();
        let err = build_site(&config, &LocalFilesystem, &RecordingEngine::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::UnsupportedPageFile(_))
        ));
    }

    #[tokio::test]
    async fn test_data_errors_are_collected() {
        let fs = project()
            .with_file("/site/Pages/A.stencil", "BAD DATA")
            .with_file("/site/Pages/B.stencil", "BAD DATA")
            .with_file("/site/Pages/C.stencil", "fine");

        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();

        let Some(BuildError::Compilation(errors)) = err.downcast_ref::<BuildError>() else {
            panic!("expected compilation errors, got {err:#}");
        };
        assert_eq!(errors.len(), 2);
        assert!(fs.journal().is_empty());
    }

    #[tokio::test]
    async fn test_failing_page_does_not_stop_siblings() {
        let fs = project()
            .with_file("/site/Pages/A.stencil", "FAIL")
            .with_file("/site/Pages/B.stencil", "b")
            .with_file("/site/Pages/C.stencil", "FAIL")
            .with_file("/site/Pages/D.stencil", "d");
        let engine = RecordingEngine::default();

        let err = build_site(&config(), &fs, &engine).await.unwrap_err();

        let Some(BuildError::Compilation(errors)) = err.downcast_ref::<BuildError>() else {
            panic!("expected compilation errors, got {err:#}");
        };
        let failed: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(failed, vec!["failed Pages/A.stencil", "failed Pages/C.stencil"]);

        assert_eq!(engine.compiled.lock().len(), 4);
        assert!(fs.read("/site/Output/b/index.html").is_some());
        assert!(fs.read("/site/Output/d/index.html").is_some());
    }

    #[tokio::test]
    async fn test_write_failures_are_reported_with_compilation_errors() {
        let fs = FailingWrites {
            inner: project()
                .with_file("/site/Pages/A.stencil", "FAIL")
                .with_file("/site/Pages/B.stencil", "b")
                .with_file("/site/Pages/C.stencil", "c"),
            broken: "/site/Output/b",
        };

        let err = build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap_err();

        let Some(BuildError::Compilation(errors)) = err.downcast_ref::<BuildError>() else {
            panic!("expected compilation errors, got {err:#}");
        };
        let paths: Vec<_> = errors.iter().map(|e| e.path.display().to_string()).collect();
        assert_eq!(paths, vec!["Pages/A.stencil", "Pages/B.stencil"]);
        assert_eq!(errors[0].message, "failed Pages/A.stencil");
        assert!(errors[1].message.contains("disk full"));

        let report = err.to_string();
        assert!(report.contains("failed Pages/A.stencil"));
        assert!(report.contains("disk full"));
        assert!(fs.inner.read("/site/Output/c/index.html").is_some());
    }

    #[tokio::test]
    async fn test_no_clean_keeps_output() {
        let fs = project()
            .with_file("/site/Pages/Index.stencil", "home")
            .with_file("/site/Output/keep.txt", "kept");
        let mut config = config();
        config.build.clean = false;

        build_site(&config, &fs, &RecordingEngine::default()).await.unwrap();

        assert_eq!(fs.read("/site/Output/keep.txt").as_deref(), Some("kept"));
        assert!(!writes(&fs).iter().any(|entry| entry.starts_with("rmdir")));
    }

    #[tokio::test]
    async fn test_clean_removes_output_first() {
        let fs = project()
            .with_file("/site/Pages/Index.stencil", "home")
            .with_file("/site/Output/stale.txt", "old");

        build_site(&config(), &fs, &RecordingEngine::default()).await.unwrap();

        assert!(fs.read("/site/Output/stale.txt").is_none());
        assert_eq!(
            writes(&fs),
            vec!["rmdir /site/Output", "write /site/Output/index.html"]
        );
    }

    #[tokio::test]
    async fn test_assets_disabled() {
        let fs = project()
            .with_file("/site/Pages/Index.stencil", "home")
            .with_file("/site/Assets/logo.svg", "<svg/>");
        let mut config = config();
        config.build.assets.enable = false;

        let report = build_site(&config, &fs, &RecordingEngine::default()).await.unwrap();

        assert_eq!(report.assets, 0);
        assert!(fs.read("/site/Output/logo.svg").is_none());
    }

    #[tokio::test]
    async fn test_end_to_end_with_stencil_engine() {
        let fs = project()
            .with_file(
                "/site/Pages/Index.stencil",
                "<Data>title: Home</Data>\n<Nav /><h1>{{ title }}</h1>",
            )
            .with_file("/site/Pages/Docs/Index.md", "---\ntitle: Docs\n---\n# {{ title }}\n")
            .with_file("/site/Pages/Docs/Install.md", "---\ntitle: Install\n---\nRun it.\n")
            .with_file(
                "/site/Components/Nav.stencil",
                "<a href=\"{{ $pages.Docs.Install }}\">{{ $pages.allPages.Docs.Install.title }}</a>",
            )
            .with_file("/site/Config/Site.toml", "name = \"Paper\"");

        let report = build_site(&config(), &fs, &StencilEngine).await.unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(
            fs.read("/site/Output/index.html").as_deref(),
            Some("<a href=\"/docs/install/\">Install</a><h1>Home</h1>")
        );
        assert_eq!(
            fs.read("/site/Output/docs/index.html").as_deref(),
            Some("<h1>Docs</h1>\n")
        );
    }
}
