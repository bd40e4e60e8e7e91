//! Keyboard navigation over the ticket tree.
//!
//! The visible order is a pre-order walk restricted to expanded subtrees in
//! which every expanded node is followed, after its real children, by a
//! synthetic "add subtask" placeholder. Placeholders are never stored; they
//! are named by the id of the node that owns them.

use crate::model::task::TaskNode;

/// What the cursor is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The free-text input slot.
    Input,
    Node(String),
    /// The "add subtask" entry trailing the expanded node with this id.
    Placeholder(String),
}

impl Selection {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Selection::Node(id) => Some(id),
            _ => None,
        }
    }
}

/// One row of the rendered tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow<'a> {
    pub selection: Selection,
    pub depth: usize,
    /// `None` for placeholder rows.
    pub node: Option<&'a TaskNode>,
}

/// Index path from the roots down to the node with `id`.
fn find_path(nodes: &[TaskNode], id: &str) -> Option<Vec<usize>> {
    for (i, node) in nodes.iter().enumerate() {
        if node.id == id {
            return Some(vec![i]);
        }
        if let Some(mut rest) = find_path(&node.children, id) {
            rest.insert(0, i);
            return Some(rest);
        }
    }
    None
}

fn node_at<'a>(roots: &'a [TaskNode], path: &[usize]) -> Option<&'a TaskNode> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get(*first)?;
    for &i in rest {
        node = node.children.get(i)?;
    }
    Some(node)
}

/// Siblings of the node at `path` (the slice it lives in).
fn siblings<'a>(roots: &'a [TaskNode], path: &[usize]) -> Option<&'a [TaskNode]> {
    match path.split_last() {
        Some((_, [])) => Some(roots),
        Some((_, parent)) => node_at(roots, parent).map(|p| p.children.as_slice()),
        None => None,
    }
}

/// The last item shown for `node` and everything beneath it.
fn last_visible_in(node: &TaskNode) -> Selection {
    if node.expanded {
        Selection::Placeholder(node.id.clone())
    } else {
        Selection::Node(node.id.clone())
    }
}

/// First navigable item, if the tree has any roots.
pub fn first_visible(roots: &[TaskNode]) -> Option<Selection> {
    roots.first().map(|n| Selection::Node(n.id.clone()))
}

/// Last navigable item: where Up from the input slot lands.
pub fn last_visible(roots: &[TaskNode]) -> Option<Selection> {
    roots.last().map(last_visible_in)
}

/// Item after the whole subtree rooted at `path`.
fn next_after_subtree(roots: &[TaskNode], path: &[usize]) -> Option<Selection> {
    let (&index, parent_path) = path.split_last()?;
    let sibs = siblings(roots, path)?;
    if let Some(next) = sibs.get(index + 1) {
        return Some(Selection::Node(next.id.clone()));
    }
    // Last child of a visible parent: the parent's placeholder comes next.
    node_at(roots, parent_path).map(|parent| Selection::Placeholder(parent.id.clone()))
}

/// Successor of `current` in visible order. `None` means the end of the tree
/// was passed; callers wrap to the input slot.
pub fn next_visible(roots: &[TaskNode], current: &Selection) -> Option<Selection> {
    match current {
        Selection::Input => first_visible(roots),
        Selection::Placeholder(owner) => {
            let path = find_path(roots, owner)?;
            next_after_subtree(roots, &path)
        }
        Selection::Node(id) => {
            let path = find_path(roots, id)?;
            let node = node_at(roots, &path)?;
            if node.expanded {
                return Some(match node.children.first() {
                    Some(child) => Selection::Node(child.id.clone()),
                    None => Selection::Placeholder(node.id.clone()),
                });
            }
            next_after_subtree(roots, &path)
        }
    }
}

/// Predecessor of `current` in visible order. `None` from the first root;
/// from the input slot this is the last visible item.
pub fn prev_visible(roots: &[TaskNode], current: &Selection) -> Option<Selection> {
    match current {
        Selection::Input => last_visible(roots),
        Selection::Placeholder(owner) => {
            let node = crate::tree::find(roots, owner)?;
            Some(match node.children.last() {
                Some(child) => last_visible_in(child),
                None => Selection::Node(node.id.clone()),
            })
        }
        Selection::Node(id) => {
            let path = find_path(roots, id)?;
            let (&index, parent_path) = path.split_last()?;
            if index > 0 {
                let sibs = siblings(roots, &path)?;
                return Some(last_visible_in(&sibs[index - 1]));
            }
            node_at(roots, parent_path).map(|parent| Selection::Node(parent.id.clone()))
        }
    }
}

/// Whether `selection` is still reachable in the current view.
pub fn is_visible(roots: &[TaskNode], selection: &Selection) -> bool {
    let node_shown = |id: &str| match find_path(roots, id) {
        Some(path) => (1..path.len()).all(|k| node_at(roots, &path[..k]).is_some_and(|n| n.expanded)),
        None => false,
    };
    match selection {
        Selection::Input => true,
        Selection::Node(id) => node_shown(id),
        Selection::Placeholder(owner) => {
            node_shown(owner) && crate::tree::find(roots, owner).is_some_and(|n| n.expanded)
        }
    }
}

/// True when `selection` sits inside the subtree of `ancestor_id` (the
/// ancestor's own placeholder included, the ancestor itself excluded).
pub fn is_within(roots: &[TaskNode], ancestor_id: &str, selection: &Selection) -> bool {
    let Some(ancestor) = crate::tree::find(roots, ancestor_id) else {
        return false;
    };
    match selection {
        Selection::Input => false,
        Selection::Node(id) => id != ancestor_id && crate::tree::find(&ancestor.children, id).is_some(),
        Selection::Placeholder(owner) => {
            owner == ancestor_id || crate::tree::find(&ancestor.children, owner).is_some()
        }
    }
}

/// Every visible row in order, placeholders included.
pub fn visible_rows(roots: &[TaskNode]) -> Vec<VisibleRow<'_>> {
    fn walk<'a>(nodes: &'a [TaskNode], depth: usize, out: &mut Vec<VisibleRow<'a>>) {
        for node in nodes {
            out.push(VisibleRow {
                selection: Selection::Node(node.id.clone()),
                depth,
                node: Some(node),
            });
            if node.expanded {
                walk(&node.children, depth + 1, out);
                out.push(VisibleRow {
                    selection: Selection::Placeholder(node.id.clone()),
                    depth: depth + 1,
                    node: None,
                });
            }
        }
    }
    let mut rows = Vec::new();
    walk(roots, 0, &mut rows);
    rows
}
