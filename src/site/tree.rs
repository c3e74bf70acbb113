//! Page tree: the navigable index exposed to templates as `$pages`.
//!
//! # Layout
//!
//! Nodes live in one arena (`Vec<Node>`) and refer to each other by
//! [`NodeId`]. The root directory is always `NodeId(0)`. Directories keep
//! their children as an ordered `(segment, id)` list, so iteration follows
//! insertion order while structural comparison can ignore it.
//!
//! ```text
//! Pages/Index.stencil          root
//! Pages/Blog/Index.md    ->    ├── Index          (page)
//! Pages/Blog/First.md          └── Blog           (directory)
//!                                  ├── Index      (page)
//!                                  └── First      (page)
//! ```
//!
//! # Aggregation
//!
//! [`PageTree::aggregate`] fills every directory's four views in one
//! post-order pass. Views are recomputed from the children each time, so
//! running it twice yields the same result.

use super::key::DottedKey;
use serde_json::{Map, Value};
use thiserror::Error;

/// Open front-matter map of a page.
pub type Attributes = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: Self = Self(0);
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    /// Source file stem
    pub name: String,
    /// URL path
    pub path: String,
    /// Last URL segment, empty for the root page
    pub slug: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryNode {
    pub children: Vec<(String, NodeId)>,
    pub aggregates: Aggregates,
}

/// Dotted relative key to node, in traversal order.
pub type View = Vec<(DottedKey, NodeId)>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub pages: View,
    pub all_pages: View,
    pub directories: View,
    pub all_directories: View,
}

impl Aggregates {
    pub fn view(&self, which: AggregateView) -> &View {
        match which {
            AggregateView::Pages => &self.pages,
            AggregateView::AllPages => &self.all_pages,
            AggregateView::Directories => &self.directories,
            AggregateView::AllDirectories => &self.all_directories,
        }
    }
}

/// One of a directory's four aggregate views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateView {
    Pages,
    AllPages,
    Directories,
    AllDirectories,
}

impl AggregateView {
    /// Template field name: `pages`, `allPages`, `directories`, `allDirectories`.
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "pages" => Some(Self::Pages),
            "allPages" => Some(Self::AllPages),
            "directories" => Some(Self::Directories),
            "allDirectories" => Some(Self::AllDirectories),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Page(PageNode),
    Directory(DirectoryNode),
}

impl Node {
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    pub fn as_page(&self) -> Option<&PageNode> {
        match self {
            Self::Page(page) => Some(page),
            Self::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            Self::Directory(directory) => Some(directory),
            Self::Page(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A page and a directory claim the same position.
    #[error("'{key}' is both a page and a directory")]
    PageDirectoryClash { key: DottedKey },

    #[error("'{key}' already holds a page")]
    DuplicatePage { key: DottedKey },

    #[error("page key is empty")]
    EmptyKey,

    #[error("no page at '{key}'")]
    NotFound { key: DottedKey },
}

#[derive(Debug, Clone)]
pub struct PageTree {
    nodes: Vec<Node>,
}

impl Default for PageTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Directory(DirectoryNode::default())],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn page(&self, id: NodeId) -> Option<&PageNode> {
        self.node(id).as_page()
    }

    /// Named child of a directory. `None` for pages and missing names.
    pub fn child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        self.node(parent)
            .as_directory()?
            .children
            .iter()
            .find(|(name, _)| name == segment)
            .map(|&(_, id)| id)
    }

    /// Insert a page, creating missing directories along the way.
    pub fn insert(&mut self, key: &DottedKey, page: PageNode) -> Result<NodeId, TreeError> {
        let Some((last, parents)) = key.segments().split_last() else {
            return Err(TreeError::EmptyKey);
        };

        let mut current = self.root();
        for (depth, segment) in parents.iter().enumerate() {
            current = match self.child(current, segment) {
                Some(id) if self.node(id).is_directory() => id,
                Some(_) => {
                    return Err(TreeError::PageDirectoryClash {
                        key: DottedKey::new(key.segments()[..=depth].to_vec()),
                    });
                }
                None => self.push_child(current, segment, Node::Directory(DirectoryNode::default())),
            };
        }

        match self.child(current, last) {
            Some(id) if self.node(id).is_directory() => {
                Err(TreeError::PageDirectoryClash { key: key.clone() })
            }
            Some(_) => Err(TreeError::DuplicatePage { key: key.clone() }),
            None => Ok(self.push_child(current, last, Node::Page(page))),
        }
    }

    /// Node at `key`, page or directory.
    pub fn get(&self, key: &DottedKey) -> Option<NodeId> {
        key.segments()
            .iter()
            .try_fold(self.root(), |id, segment| self.child(id, segment))
    }

    /// Fill the aggregate views of every directory.
    pub fn aggregate(&mut self) {
        self.aggregate_directory(self.root());
    }

    fn push_child(&mut self, parent: NodeId, segment: &str, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Node::Directory(directory) = &mut self.nodes[parent.0] {
            directory.children.push((segment.to_owned(), id));
        }
        id
    }

    fn aggregate_directory(&mut self, id: NodeId) {
        let children = match self.node(id) {
            Node::Directory(directory) => directory.children.clone(),
            Node::Page(_) => return,
        };

        let mut aggregates = Aggregates::default();
        for (segment, child) in children {
            let key = DottedKey::from(segment.as_str());

            if self.node(child).is_page() {
                aggregates.pages.push((key.clone(), child));
                aggregates.all_pages.push((key, child));
                continue;
            }

            self.aggregate_directory(child);
            aggregates.directories.push((key.clone(), child));
            aggregates.all_directories.push((key, child));

            if let Node::Directory(nested) = self.node(child) {
                let rekey = |view: &View| -> View {
                    view.iter()
                        .map(|(nested_key, node)| (nested_key.prefixed(&segment), *node))
                        .collect()
                };
                aggregates.all_pages.extend(rekey(&nested.aggregates.all_pages));
                aggregates
                    .all_directories
                    .extend(rekey(&nested.aggregates.all_directories));
            }
        }

        if let Node::Directory(directory) = &mut self.nodes[id.0] {
            directory.aggregates = aggregates;
        }
    }
}
