use crate::domain::{SecretKey, SecretMetadata};
use crate::infra::SecretStore;
use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;
use tracing::debug;

/// One listed secret together with its version history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: SecretKey,
    pub metadata: SecretMetadata,
}

/// Lists every secret and fetches its metadata. Any failure aborts the whole
/// load; a partial catalog is never returned.
pub fn load_catalog(store: &dyn SecretStore) -> Result<Vec<CatalogEntry>> {
    let keys = store.list_secrets().context("failed to list secrets")?;
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let metadata = store
            .metadata(&key)
            .with_context(|| format!("failed to read secret metadata: {key}"))?;
        entries.push(CatalogEntry { key, metadata });
    }
    debug!(count = entries.len(), "catalog loaded");
    Ok(entries)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLeaf {
    pub key: SecretKey,
    pub metadata: SecretMetadata,
    pub selected_version: u32,
}

impl SecretLeaf {
    pub fn display_label(&self) -> String {
        let head = format!("{}:{}", self.key.name, self.selected_version);
        match self.metadata.get(self.selected_version) {
            Some(info) if info.destroyed => format!("{head} (destroyed)"),
            Some(info) => match info.created_at.format(&Rfc3339) {
                Ok(stamp) => format!("{head} ({stamp})"),
                Err(_) => head,
            },
            None => head,
        }
    }

    /// `<identifier>:<version>`, the same shape the `diff` command accepts.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.key.identifier(), self.selected_version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory { children: Vec<NodeId> },
    Leaf(SecretLeaf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn leaf(&self) -> Option<&SecretLeaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Directory { .. } => None,
        }
    }

    pub fn is_selectable(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// A row of the flattened tree as drawn on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: usize,
    pub text: String,
    pub selectable: bool,
}

/// Arena-backed secret tree. The root is a directory that is never drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTree {
    nodes: Vec<TreeNode>,
}

impl SecretTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn build(entries: &[CatalogEntry]) -> Self {
        let mut tree = Self {
            nodes: vec![TreeNode {
                label: "vault".to_string(),
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            }],
        };

        for entry in entries {
            let mut parent = Self::ROOT;
            for segment in entry.key.segments() {
                parent = match tree.child_directory(parent, segment) {
                    Some(existing) => existing,
                    None => tree.push_child(
                        parent,
                        TreeNode {
                            label: segment.to_string(),
                            kind: NodeKind::Directory {
                                children: Vec::new(),
                            },
                        },
                    ),
                };
            }

            tree.push_child(
                parent,
                TreeNode {
                    label: entry.key.name.clone(),
                    kind: NodeKind::Leaf(SecretLeaf {
                        key: entry.key.clone(),
                        metadata: entry.metadata.clone(),
                        selected_version: entry.metadata.initial_version(),
                    }),
                },
            );
        }

        tree
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn leaf(&self, id: NodeId) -> Option<&SecretLeaf> {
        self.node(id).and_then(TreeNode::leaf)
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut SecretLeaf> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Directory { children }) => children.as_slice(),
            _ => &[],
        }
    }

    pub fn find_leaf(&self, key: &SecretKey) -> Option<NodeId> {
        self.leaves()
            .into_iter()
            .find(|id| self.leaf(*id).is_some_and(|leaf| &leaf.key == key))
    }

    /// Leaves in display order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.rows()
            .into_iter()
            .filter(|row| row.selectable)
            .map(|row| row.id)
            .collect()
    }

    pub fn rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for child in self.children(Self::ROOT) {
            self.push_rows(*child, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, id: NodeId, depth: usize, out: &mut Vec<TreeRow>) {
        let Some(node) = self.node(id) else {
            return;
        };
        let text = match &node.kind {
            NodeKind::Directory { .. } => format!("{}/", node.label),
            NodeKind::Leaf(leaf) => leaf.display_label(),
        };
        out.push(TreeRow {
            id,
            depth,
            text,
            selectable: node.is_selectable(),
        });
        for child in self.children(id) {
            self.push_rows(*child, depth + 1, out);
        }
    }

    fn child_directory(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|child| {
            self.node(*child).is_some_and(|node| {
                node.label == label && matches!(node.kind, NodeKind::Directory { .. })
            })
        })
    }

    fn push_child(&mut self, parent: NodeId, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        if let Some(NodeKind::Directory { children }) =
            self.nodes.get_mut(parent.0).map(|node| &mut node.kind)
        {
            children.push(id);
        }
        id
    }
}
