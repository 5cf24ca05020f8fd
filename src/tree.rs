//! Read-only snapshot of the bookmark hierarchy.
//!
//! The bookmark store owns the real tree. Views hold a [`BookmarkTree`] snapshot which is
//! replaced wholesale (through [`TreeModel::replace`]) whenever the store reports a change.
//! Nothing in this crate mutates a snapshot in place.

use std::collections::HashSet;
use std::rc::Rc;

/// Stable, unique identifier of a bookmark or folder.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bookmark (has a `url`) or a folder (no `url`).
///
/// A folder with no children is still a folder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Node>,
}

impl Node {
    pub fn folder(id: impl Into<NodeId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
            children: Vec::new(),
        }
    }

    pub fn link(id: impl Into<NodeId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }
}

/// Where a node currently sits: its parent (`None` for a top-level node) and its index among
/// that parent's children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub parent_id: Option<NodeId>,
    pub index: usize,
}

#[derive(Clone, Debug)]
struct IndexEntry {
    path: Vec<usize>,
    parent_id: Option<NodeId>,
}

/// Immutable snapshot of the whole hierarchy with an id index.
#[derive(Clone, Debug, Default)]
pub struct BookmarkTree {
    roots: Vec<Node>,
    index: ahash::HashMap<NodeId, IndexEntry>,
}

impl BookmarkTree {
    pub fn new(roots: impl Into<Vec<Node>>) -> Self {
        let roots = roots.into();
        let mut index: ahash::HashMap<NodeId, IndexEntry> = ahash::HashMap::default();

        let mut stack: Vec<(&Node, Vec<usize>, Option<NodeId>)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(ix, node)| (node, vec![ix], None))
            .collect();

        while let Some((node, path, parent_id)) = stack.pop() {
            for (ix, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(ix);
                stack.push((child, child_path, Some(node.id.clone())));
            }
            // First occurrence wins; duplicates are reported by `integrity_issues`.
            index
                .entry(node.id.clone())
                .or_insert(IndexEntry { path, parent_id });
        }

        Self { roots, index }
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Number of distinct node ids in the snapshot.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        let entry = self.index.get(id)?;
        let (first, rest) = entry.path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for ix in rest {
            node = node.children.get(*ix)?;
        }
        Some(node)
    }

    pub fn location(&self, id: &NodeId) -> Option<Location> {
        let entry = self.index.get(id)?;
        Some(Location {
            parent_id: entry.parent_id.clone(),
            index: *entry.path.last()?,
        })
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.index.get(id)?.parent_id.as_ref()
    }

    /// Children of `parent`, or the top-level nodes when `parent` is `None`.
    pub fn children_of(&self, parent: Option<&NodeId>) -> Option<&[Node]> {
        match parent {
            None => Some(&self.roots),
            Some(id) => self.get(id).map(|node| node.children.as_slice()),
        }
    }

    /// `true` if `node` is `ancestor` or lives anywhere below it.
    pub fn is_same_or_descendant(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let mut current = Some(node);
        // Bounded walk: a malformed snapshot with duplicate ids must not spin forever.
        for _ in 0..=self.index.len() {
            let Some(id) = current else {
                return false;
            };
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }
}

/// Structural problems in a snapshot, one line per issue. Empty means healthy.
pub fn integrity_issues(tree: &BookmarkTree) -> Vec<String> {
    let mut issues: Vec<String> = Vec::new();
    let mut seen: HashSet<&NodeId> = HashSet::new();
    let mut stack: Vec<&Node> = tree.roots.iter().collect();

    while let Some(node) = stack.pop() {
        if !seen.insert(&node.id) {
            issues.push(format!("integrity: duplicate node id {}", node.id));
        }
        if node.url.is_some() && !node.children.is_empty() {
            issues.push(format!(
                "integrity: link {} has {} children",
                node.id,
                node.children.len()
            ));
        }
        stack.extend(node.children.iter());
    }

    issues
}

/// The view-side holder of the current snapshot.
#[derive(Debug, Default)]
pub struct TreeModel {
    snapshot: Rc<BookmarkTree>,
    revision: u64,
}

impl TreeModel {
    pub fn new(tree: BookmarkTree) -> Self {
        Self {
            snapshot: Rc::new(tree),
            revision: 0,
        }
    }

    pub fn snapshot(&self) -> &BookmarkTree {
        &self.snapshot
    }

    /// Cheap handle for views that render from the snapshot after the model moves on.
    pub fn shared(&self) -> Rc<BookmarkTree> {
        Rc::clone(&self.snapshot)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn replace(&mut self, tree: BookmarkTree) {
        self.snapshot = Rc::new(tree);
        self.revision = self.revision.wrapping_add(1);
    }
}
