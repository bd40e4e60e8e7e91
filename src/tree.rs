use crate::model::task::TaskNode;

/// Owns the root tickets and every fetched descendant.
///
/// Nodes are located by a depth-first search on `id`. Trees hold tens of
/// tickets, so there is no index.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    roots: Vec<TaskNode>,
}

impl TaskTree {
    pub fn new(roots: Vec<TaskNode>) -> Self {
        let mut tree = TaskTree::default();
        tree.set_roots(roots);
        tree
    }

    pub fn roots(&self) -> &[TaskNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Replace every root, restamping depth and parent links.
    pub fn set_roots(&mut self, mut nodes: Vec<TaskNode>) {
        for node in &mut nodes {
            stamp(node, 0, None);
        }
        self.roots = nodes;
    }

    /// Install fetched children under `parent_id` and expand it.
    /// Returns false when the parent is not in the tree.
    pub fn attach_children(&mut self, parent_id: &str, mut children: Vec<TaskNode>) -> bool {
        let Some(parent) = find_mut(&mut self.roots, parent_id) else {
            return false;
        };
        for child in &mut children {
            stamp(child, parent.depth + 1, Some(&parent.id));
        }
        parent.has_children = !children.is_empty();
        parent.children = children;
        parent.expanded = true;
        true
    }

    /// Append a freshly created child as the last real child of `parent_id`.
    pub fn append_child(&mut self, parent_id: &str, mut node: TaskNode) -> bool {
        let Some(parent) = find_mut(&mut self.roots, parent_id) else {
            return false;
        };
        stamp(&mut node, parent.depth + 1, Some(&parent.id));
        parent.children.push(node);
        parent.has_children = true;
        true
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> bool {
        match find_mut(&mut self.roots, id) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &str) -> Option<&TaskNode> {
        find(&self.roots, id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}

/// Depth-first lookup over an arbitrary root slice.
pub fn find<'a>(nodes: &'a [TaskNode], id: &str) -> Option<&'a TaskNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut<'a>(nodes: &'a mut [TaskNode], id: &str) -> Option<&'a mut TaskNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn stamp(node: &mut TaskNode, depth: usize, parent_id: Option<&str>) {
    node.depth = depth;
    node.parent_id = parent_id.map(str::to_string);
    let id = node.id.clone();
    for child in &mut node.children {
        stamp(child, depth + 1, Some(&id));
    }
}
