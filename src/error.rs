//! Build error types.
//!
//! Every [`BuildError`] renders as a self-contained report: a header line,
//! the offending URL and files, and a short explanation of the rule that was
//! broken. `main` prints the report verbatim and exits non-zero.

use crate::engine::CompilationError;
use thiserror::Error;

/// Pages that would be written to the same URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlConflict {
    pub url: String,
    /// Source files, relative to the project root
    pub files: Vec<String>,
}

/// A component whose name is reserved for a built-in construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedComponent {
    pub name: String,
    pub path: String,
}

/// Components sharing one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateComponent {
    pub name: String,
    pub paths: Vec<String>,
}

/// A tree position claimed by both a page and a directory of pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeClash {
    /// Dotted key of the contested position
    pub key: String,
    pub files: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{}", missing_directory(.0))]
    MissingDirectory(String),

    #[error("{}", unsupported_page(.0))]
    UnsupportedPageFile(String),

    #[error("{}", file_and_folder(.0))]
    DuplicatePagesFromFileAndFolder(Vec<UrlConflict>),

    #[error("{}", extension(.0))]
    DuplicatePagesFromExtension(Vec<UrlConflict>),

    #[error("{}", reserved_component(.0))]
    ReservedComponentName(Vec<ReservedComponent>),

    #[error("{}", duplicate_component(.0))]
    DuplicateComponentName(Vec<DuplicateComponent>),

    #[error("{}", page_directory_clash(.0))]
    PageDirectoryClash(Vec<TreeClash>),

    #[error("{}", compilation(.0))]
    Compilation(Vec<CompilationError>),

    /// Broken internal invariant, e.g. a page missing from its own tree.
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Report formatting
// ============================================================================

pub(crate) fn header(title: &str) -> String {
    format!("-----  Error: {title}  ----------------------")
}

fn bullets<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("     -  {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn url_conflicts(conflicts: &[UrlConflict]) -> String {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "You have multiple pages with the url \"{}\".\n\nThe pages are located here:\n{}",
                conflict.url,
                bullets(&conflict.files)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn missing_directory(directory: &str) -> String {
    format!(
        "{}\n\nIt seems like this project is missing the '{directory}' directory.\n\n\
         Every project needs a 'Pages' and a 'Components' directory next to each other.",
        header("Missing directory")
    )
}

fn unsupported_page(path: &str) -> String {
    format!(
        "{}\n\nThe file \"{path}\" is not a page.\n\n\
         The 'Pages' directory must only contain '.stencil' and '.md' files.",
        header("Unsupported page")
    )
}

fn file_and_folder(conflicts: &[UrlConflict]) -> String {
    format!(
        "{}\n\n{}\n\n\
         This error occured because there was a conflict between a named page and an index page during compilation:\n\n  \
         Pages with the name \"Index\" will use the path of the folder it's in:\n       \
         -  \"Pages/Articles/Index.stencil\" compiles to \"Output/articles/index.html\" and has the path \"/articles/\"\n\n  \
         Pages with any other name will be placed inside a new folder named after the file and the file will be renamed to \"Index\":\n       \
         -  \"Pages/Articles.stencil\" compiles to \"Output/articles/index.html\" and has the path \"/articles/\"",
        header("Duplicate pages"),
        url_conflicts(conflicts)
    )
}

fn extension(conflicts: &[UrlConflict]) -> String {
    format!(
        "{}\n\n{}\n\n\
         This error most likely occured because you are using the same file name with different extensions,\n\
         or two file names that produce the same url.",
        header("Duplicate pages"),
        url_conflicts(conflicts)
    )
}

fn reserved_component(components: &[ReservedComponent]) -> String {
    let body = components
        .iter()
        .map(|component| {
            let explanation = match component.name.as_str() {
                "Data" => "\"<Data>\" is used to add extra data to a page with Yaml:\n\n     \
                           1 |   <Data>\n     \
                           2 |       title: Value, Price and Profit\n     \
                           3 |       featured: true\n     \
                           4 |   </Data>",
                _ => "\"<Component>\" is used to dynamically render another component:\n\n     \
                      1 |   <Component is=\"{{ $name }}\" />",
            };
            format!(
                "You have a custom component called \"{}\", but that is a reserved name.\n\n{explanation}\n\n\
                 The component is located at \"{}\".",
                component.name, component.path
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{}\n\n{body}", header("Reserved component name"))
}

fn duplicate_component(duplicates: &[DuplicateComponent]) -> String {
    let body = duplicates
        .iter()
        .map(|duplicate| {
            format!(
                "You have multiple components called \"{}\", which is not allowed.\n\n\
                 The components are located here:\n{}",
                duplicate.name,
                bullets(&duplicate.paths)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\n{body}\n\n\
         It's not possible to have multiple components with the same name, even if they are in different directories.\n\
         This is to allow referencing a component by name, without needing to import it.",
        header("Duplicate components")
    )
}

fn page_directory_clash(clashes: &[TreeClash]) -> String {
    let body = clashes
        .iter()
        .map(|clash| {
            format!(
                "\"{}\" is both a page and a folder of pages.\n\nThe files are located here:\n{}",
                clash.key,
                bullets(&clash.files)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\n{body}\n\n\
         A page and a folder with the same name cannot live side by side.\n\
         Move the page into the folder and rename it to \"Index\":\n       \
         -  \"Pages/Articles.stencil\" becomes \"Pages/Articles/Index.stencil\"",
        header("Page and folder clash")
    )
}

fn compilation(errors: &[CompilationError]) -> String {
    errors
        .iter()
        .map(|error| error.message.trim_end().to_owned())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_file_and_folder_report_names_url_and_files() {
        let err = BuildError::DuplicatePagesFromFileAndFolder(vec![UrlConflict {
            url: "/articles/".into(),
            files: vec![
                "Pages/Articles.stencil".into(),
                "Pages/Articles/Index.stencil".into(),
            ],
        }]);
        let report = err.to_string();

        assert!(report.starts_with("-----  Error: Duplicate pages"));
        assert!(report.contains("\"/articles/\""));
        assert!(report.contains("     -  Pages/Articles.stencil"));
        assert!(report.contains("     -  Pages/Articles/Index.stencil"));
    }

    #[test]
    fn test_reserved_component_explains_data() {
        let err = BuildError::ReservedComponentName(vec![ReservedComponent {
            name: "Data".into(),
            path: "Components/Data.stencil".into(),
        }]);
        let report = err.to_string();

        assert!(report.contains("reserved name"));
        assert!(report.contains("<Data>"));
        assert!(report.contains("Components/Data.stencil"));
    }

    #[test]
    fn test_compilation_report_joins_messages() {
        let err = BuildError::Compilation(vec![
            CompilationError::new(PathBuf::from("a"), "first\n"),
            CompilationError::new(PathBuf::from("b"), "second"),
        ]);
        assert_eq!(err.to_string(), "first\n\nsecond");
    }

    #[test]
    fn test_missing_directory_report() {
        let report = BuildError::MissingDirectory("Pages".into()).to_string();
        assert!(report.contains("missing the 'Pages' directory"));
    }
}
