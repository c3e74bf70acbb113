//! Build-breaking conflict checks.
//!
//! Run once all pages are resolved and before anything is compiled or
//! written. Checks run in a fixed order and the first category with a
//! violation decides the error; within that category every instance is
//! reported.
//!
//! 1. File/folder: `Articles.stencil` next to `Articles/Index.stencil`
//! 2. Output path: `Index.md` next to `Index.stencil`, or two names that
//!    slugify alike
//! 3. Components: reserved names, then duplicate names
//! 4. Page/folder: `Articles.stencil` next to `Articles/First.stencil`, a
//!    position the page tree cannot hold

use super::{
    component::{Component, RESERVED_NAMES},
    route::{INDEX_NAME, ResolvedPage},
};
use crate::error::{BuildError, DuplicateComponent, ReservedComponent, TreeClash, UrlConflict};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Run every check in order.
pub fn check(pages: &[ResolvedPage], components: &[Component]) -> Result<(), BuildError> {
    let conflicts = file_and_folder_conflicts(pages);
    if !conflicts.is_empty() {
        return Err(BuildError::DuplicatePagesFromFileAndFolder(conflicts));
    }

    let conflicts = output_path_conflicts(pages);
    if !conflicts.is_empty() {
        return Err(BuildError::DuplicatePagesFromExtension(conflicts));
    }

    let reserved = reserved_components(components);
    if !reserved.is_empty() {
        return Err(BuildError::ReservedComponentName(reserved));
    }

    let duplicates = duplicate_components(components);
    if !duplicates.is_empty() {
        return Err(BuildError::DuplicateComponentName(duplicates));
    }

    let clashes = page_directory_clashes(pages);
    if !clashes.is_empty() {
        return Err(BuildError::PageDirectoryClash(clashes));
    }

    Ok(())
}

/// Non-index pages `X` that also have an `X/Index` page.
///
/// Conflicts sharing a URL are merged, so a three-way collision
/// (`Articles.stencil`, `Articles/Index.stencil`, `Articles/Index.md`) is one
/// entry listing all three files.
pub fn file_and_folder_conflicts(pages: &[ResolvedPage]) -> Vec<UrlConflict> {
    let mut by_key: FxHashMap<_, Vec<&ResolvedPage>> = FxHashMap::default();
    for page in pages {
        by_key.entry(&page.source_key).or_default().push(page);
    }

    let mut conflicts = ConflictList::default();
    for page in pages.iter().filter(|page| !page.is_index()) {
        let index_key = page.source_key.child(INDEX_NAME);
        let Some(indexes) = by_key.get(&index_key) else {
            continue;
        };

        conflicts.add(&page.url_path, &page.display_path);
        for index in indexes {
            conflicts.add(&page.url_path, &index.display_path);
        }
    }

    conflicts.into_inner()
}

/// Groups of pages writing the same output file.
pub fn output_path_conflicts(pages: &[ResolvedPage]) -> Vec<UrlConflict> {
    let mut groups: Vec<(&Path, UrlConflict)> = Vec::new();
    let mut positions: FxHashMap<&Path, usize> = FxHashMap::default();

    for page in pages {
        let position = *positions
            .entry(page.output_path.as_path())
            .or_insert_with(|| {
                groups.push((
                    page.output_path.as_path(),
                    UrlConflict {
                        url: page.url_path.clone(),
                        files: Vec::new(),
                    },
                ));
                groups.len() - 1
            });
        groups[position].1.files.push(page.display_path.clone());
    }

    groups
        .into_iter()
        .map(|(_, conflict)| conflict)
        .filter(|conflict| conflict.files.len() > 1)
        .collect()
}

pub fn reserved_components(components: &[Component]) -> Vec<ReservedComponent> {
    components
        .iter()
        .filter(|component| RESERVED_NAMES.contains(&component.name.as_str()))
        .map(|component| ReservedComponent {
            name: component.name.clone(),
            path: component.display_path.clone(),
        })
        .collect()
}

pub fn duplicate_components(components: &[Component]) -> Vec<DuplicateComponent> {
    let mut groups: Vec<DuplicateComponent> = Vec::new();
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();

    for component in components {
        match positions.get(component.name.as_str()) {
            Some(&i) => groups[i].paths.push(component.display_path.clone()),
            None => {
                positions.insert(&component.name, groups.len());
                groups.push(DuplicateComponent {
                    name: component.name.clone(),
                    paths: vec![component.display_path.clone()],
                });
            }
        }
    }

    groups.retain(|group| group.paths.len() > 1);
    groups
}

/// Pages whose key is also the folder of other pages.
///
/// Each clash lists the page itself and every page below it.
pub fn page_directory_clashes(pages: &[ResolvedPage]) -> Vec<TreeClash> {
    let mut clashes: Vec<TreeClash> = Vec::new();

    for page in pages {
        let key = &page.source_key;
        if !pages.iter().any(|other| key.is_ancestor_of(&other.source_key)) {
            continue;
        }

        let name = key.to_string();
        if clashes.iter().any(|clash| clash.key == name) {
            continue;
        }

        clashes.push(TreeClash {
            key: name,
            files: pages
                .iter()
                .filter(|other| other.source_key == *key || key.is_ancestor_of(&other.source_key))
                .map(|other| other.display_path.clone())
                .collect(),
        });
    }

    clashes
}

/// URL conflicts in first-seen order, files deduplicated.
#[derive(Default)]
struct ConflictList(Vec<UrlConflict>);

impl ConflictList {
    fn add(&mut self, url: &str, file: &str) {
        let conflict = match self.0.iter().position(|c| c.url == url) {
            Some(i) => &mut self.0[i],
            None => {
                self.0.push(UrlConflict {
                    url: url.to_owned(),
                    files: Vec::new(),
                });
                let last = self.0.len() - 1;
                &mut self.0[last]
            }
        };
        if !conflict.files.iter().any(|f| f == file) {
            conflict.files.push(file.to_owned());
        }
    }

    fn into_inner(self) -> Vec<UrlConflict> {
        self.0
    }
}
