//! Per-page template environment.
//!
//! A page sees three kinds of names:
//!
//! - `$page`: its own node
//! - `$pages`: the tree root
//! - bare names: every attribute of its own node, reserved fields included
//!
//! Names are dotted paths resolved step by step. Directories expose their
//! four aggregate views and their children; views are entered with the
//! longest dotted key that matches, so `$pages.allPages.Blog.First.title`
//! finds the `Blog.First` entry.

use super::{
    key::DottedKey,
    tree::{AggregateView, Attributes, Node, NodeId, PageTree, TreeError},
};
use serde_json::Value;

pub const PAGE_VARIABLE: &str = "$page";
pub const PAGES_VARIABLE: &str = "$pages";

/// What a dotted name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Node(NodeId),
    View(NodeId, AggregateView),
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct Environment<'t> {
    pub tree: &'t PageTree,
    pub page: NodeId,
    /// Page attributes flattened to the top level
    pub attributes: Attributes,
}

/// Build the environment of the page at `key`.
///
/// A miss means the tree and the page list disagree, which is a bug in the
/// caller rather than a user error.
pub fn build_environment<'t>(tree: &'t PageTree, key: &DottedKey) -> Result<Environment<'t>, TreeError> {
    let not_found = || TreeError::NotFound { key: key.clone() };

    let page = tree.get(key).ok_or_else(not_found)?;
    let node = tree.page(page).ok_or_else(not_found)?;

    let mut attributes = node.attributes.clone();
    for field in RESERVED_PAGE_FIELDS {
        if let Some(value) = page_field(tree.node(page), field) {
            attributes.insert((*field).to_owned(), value);
        }
    }

    Ok(Environment {
        tree,
        page,
        attributes,
    })
}

impl Environment<'_> {
    /// Resolve a dotted name such as `$page.title` or `$pages.Blog.pages`.
    pub fn lookup(&self, expression: &str) -> Option<Lookup> {
        let segments: Vec<&str> = expression.split('.').map(str::trim).collect();
        let (first, rest) = segments.split_first()?;

        match *first {
            PAGE_VARIABLE => self.step(Lookup::Node(self.page), rest),
            PAGES_VARIABLE => self.step(Lookup::Node(self.tree.root()), rest),
            name => {
                let value = self.attributes.get(name)?;
                walk_value(value, rest).cloned().map(Lookup::Value)
            }
        }
    }

    fn step(&self, cursor: Lookup, rest: &[&str]) -> Option<Lookup> {
        let Some((field, tail)) = rest.split_first() else {
            return Some(cursor);
        };

        match cursor {
            Lookup::Value(value) => walk_value(&value, rest).cloned().map(Lookup::Value),

            Lookup::Node(id) => match self.tree.node(id) {
                Node::Page(page) => {
                    if let Some(value) = page_field(self.tree.node(id), field) {
                        return self.step(Lookup::Value(value), tail);
                    }
                    let value = page.attributes.get(*field)?;
                    walk_value(value, tail).cloned().map(Lookup::Value)
                }
                Node::Directory(_) => {
                    if let Some(value) = directory_field(self.tree.node(id), field) {
                        return self.step(Lookup::Value(value), tail);
                    }
                    if let Some(view) = AggregateView::from_field(field) {
                        return self.step(Lookup::View(id, view), tail);
                    }
                    let child = self.tree.child(id, field)?;
                    self.step(Lookup::Node(child), tail)
                }
            },

            Lookup::View(id, which) => {
                let view = self.tree.node(id).as_directory()?.aggregates.view(which);
                // Longest key first: `Guide.Install` beats `Guide`
                (1..=rest.len()).rev().find_map(|len| {
                    let key = DottedKey::new(rest[..len].iter().map(|s| (*s).to_owned()).collect());
                    let (_, node) = view.iter().find(|(entry, _)| *entry == key)?;
                    self.step(Lookup::Node(*node), &rest[len..])
                })
            }
        }
    }
}

const RESERVED_PAGE_FIELDS: &[&str] = &["name", "path", "slug", "isPage", "isDirectory"];

/// Reserved page fields. These shadow front-matter keys of the same name.
fn page_field(node: &Node, field: &str) -> Option<Value> {
    let Node::Page(page) = node else {
        return None;
    };
    match field {
        "name" => Some(Value::from(page.name.as_str())),
        "path" => Some(Value::from(page.path.as_str())),
        "slug" => Some(Value::from(page.slug.as_str())),
        "isPage" => Some(Value::Bool(true)),
        "isDirectory" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn directory_field(node: &Node, field: &str) -> Option<Value> {
    match (node, field) {
        (Node::Directory(_), "isPage") => Some(Value::Bool(false)),
        (Node::Directory(_), "isDirectory") => Some(Value::Bool(true)),
        _ => None,
    }
}

/// Follow `segments` into a JSON value. Arrays take numeric indices.
pub fn walk_value<'v>(value: &'v Value, segments: &[&str]) -> Option<&'v Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    })
}
