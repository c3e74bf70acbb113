//! Component discovery.
//!
//! Components live anywhere under `Components/` and are referenced by file
//! name alone (`<Button />`), so names must be unique across the whole
//! directory and may not shadow the built-in `<Component>` and `<Data>` tags.

use super::route::display_path;
use crate::filesystem::SourceFile;
use rustc_hash::FxHashMap;
use std::path::Path;

/// Extension of component files
pub const COMPONENT_EXTENSION: &str = "stencil";

/// Names taken by built-in template constructs
pub const RESERVED_NAMES: &[&str] = &["Component", "Data"];

#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    /// Relative to the project root: `Components/ui/Button.stencil`
    pub display_path: String,
    pub contents: String,
}

/// Keep the `.stencil` files and name them by file stem.
pub fn discover(files: Vec<SourceFile>, components_root: &Path) -> Vec<Component> {
    files
        .into_iter()
        .filter(|file| file.extension == COMPONENT_EXTENSION)
        .map(|file| Component {
            display_path: display_path(&file.path, components_root),
            name: file.name,
            contents: file.contents,
        })
        .collect()
}

/// Components by name, as handed to the template engine.
///
/// Built only after the name checks passed, so names are unique.
#[derive(Debug, Default)]
pub struct ComponentTable {
    items: Vec<Component>,
    index: FxHashMap<String, usize>,
}

impl ComponentTable {
    pub fn new(items: Vec<Component>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, component)| (component.name.clone(), i))
            .collect();
        Self { items, index }
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.items[i])
    }
}
