use generational_arena::{Arena, Index};
use std::collections::HashMap;
use std::fmt;
use termtree::Tree;
use tracing::instrument;

use crate::domain::Member;

/// Data payload for tree nodes: the displayable part of a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub public_id: String,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
}

impl From<&Member> for NodeData {
    fn from(member: &Member) -> Self {
        Self {
            public_id: member.public_id.clone(),
            full_name: member.full_name.clone(),
            email: member.email.clone(),
            is_active: member.is_active,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.public_id, self.full_name)?;
        if !self.is_active {
            write!(f, " [inactive]")?;
        }
        Ok(())
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct MemberNode {
    /// Member data for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Distance from the root (root = 0)
    pub level: usize,
    /// Indices of child nodes in registration order
    pub children: Vec<Index>,
}

/// Arena-based referral tree materialized below one member.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
#[derive(Debug)]
pub struct MemberArena {
    arena: Arena<MemberNode>,
    root: Option<Index>,
}

impl Default for MemberArena {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let level = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0);
        let node = MemberNode {
            data,
            parent,
            level,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&MemberNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children in registration order.
    pub fn iter(&self) -> PreOrderIterator {
        PreOrderIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Number of levels below the root (a lone root has depth 0).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, node)| node.level).max().unwrap_or(0)
    }

    /// Fold the arena bottom-up: `f` receives a node and its already folded
    /// children in order. Returns None for an empty arena.
    pub fn fold<T, F>(&self, mut f: F) -> Option<T>
    where
        F: FnMut(&MemberNode, Vec<T>) -> T,
    {
        let mut done: HashMap<Index, T> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|child| done.remove(child))
                .collect();
            done.insert(idx, f(node, children));
        }
        self.root.and_then(|root| done.remove(&root))
    }

    /// Terminal rendering of the tree.
    pub fn to_termtree(&self) -> Option<Tree<NodeData>> {
        self.fold(|node, children| Tree::new(node.data.clone()).with_leaves(children))
    }
}

pub struct PreOrderIterator<'a> {
    arena: &'a MemberArena,
    stack: Vec<Index>,
}

impl<'a> PreOrderIterator<'a> {
    fn new(arena: &'a MemberArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PreOrderIterator<'a> {
    type Item = (Index, &'a MemberNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a MemberArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a MemberArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a MemberNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: &str) -> NodeData {
        NodeData {
            public_id: id.to_string(),
            full_name: format!("Member {id}"),
            email: format!("{id}@example.com"),
            is_active: true,
        }
    }

    fn sample() -> MemberArena {
        // REG1 -> (REG2 -> REG4), REG3
        let mut arena = MemberArena::new();
        let root = arena.insert_node(data("REG1"), None);
        let a = arena.insert_node(data("REG2"), Some(root));
        arena.insert_node(data("REG3"), Some(root));
        arena.insert_node(data("REG4"), Some(a));
        arena
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_in_insertion_order() {
        let arena = sample();
        let ids: Vec<_> = arena.iter().map(|(_, n)| n.data.public_id.clone()).collect();
        assert_eq!(ids, vec!["REG1", "REG2", "REG4", "REG3"]);
    }

    #[test]
    fn given_tree_when_postorder_then_children_before_parent() {
        let arena = sample();
        let ids: Vec<_> = arena
            .iter_postorder()
            .map(|(_, n)| n.data.public_id.clone())
            .collect();
        assert_eq!(ids, vec!["REG4", "REG2", "REG3", "REG1"]);
    }

    #[test]
    fn given_tree_when_depth_then_reports_levels() {
        let arena = sample();
        assert_eq!(arena.depth(), 2);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn given_tree_when_folding_then_counts_descendants() {
        let arena = sample();
        let total = arena.fold(|_, children: Vec<usize>| 1 + children.iter().sum::<usize>());
        assert_eq!(total, Some(4));
    }

    #[test]
    fn given_empty_arena_when_rendering_then_none() {
        let arena = MemberArena::new();
        assert!(arena.to_termtree().is_none());
        assert_eq!(arena.depth(), 0);
    }

    #[test]
    fn given_inactive_member_when_displayed_then_marked() {
        let mut node = data("REG9");
        node.is_active = false;
        assert_eq!(node.to_string(), "REG9 (Member REG9) [inactive]");
    }
}
