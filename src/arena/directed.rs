//! Implementation of an [arena allocated](https://en.wikipedia.org/wiki/Region-based_memory_management)
//! pose tree. Nodes know their parent, which makes walking from a leaf toward the root cheap.

use core::fmt;
use std::collections::HashMap;

use itertools::Itertools;

use super::ChainView;
use crate::{Pose, TendrilError};

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub struct ArenaIndex(pub usize);

/// A node structure to be used in an arena allocated tree.
#[derive(Debug)]
pub struct ArenaNode {
    /// World-space pose owned by the node
    pub(super) pose: Pose,
    /// Index in the arena allocation
    index: ArenaIndex,
    /// identifier for lookups
    name: String,
    /// references for children
    children: Vec<ArenaIndex>,
    /// Depth in the tree
    depth: usize,
    parent: Option<ArenaIndex>,
}

impl ArenaNode {
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn index(&self) -> ArenaIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[ArenaIndex] {
        &self.children
    }

    /// Distance to the root node
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent(&self) -> Option<ArenaIndex> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for ArenaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (arena index {:?}, children: {:?}), position: {}",
            self.name,
            self.index,
            self.children,
            self.pose.position.transpose()
        )
    }
}

/// Tree of world-space poses using arena allocation.
///
/// Nodes are stored in insertion order. Every pose is a world-space pose; moving a node does not
/// move its descendants.
#[derive(Debug, Default)]
pub struct PoseArena {
    /// Memory allocated area for nodes
    pub(super) nodes: Vec<ArenaNode>,
    /// Lookup arena indices by name
    lookup: HashMap<String, ArenaIndex>,
}

impl PoseArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        PoseArena {
            nodes: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
        }
    }

    /// Deletes all nodes and sets a new root
    pub fn set_root(&mut self, pose: Pose, name: impl Into<String>) -> ArenaIndex {
        let name = name.into();
        self.nodes.clear();
        self.lookup.clear();
        self.lookup.insert(name.clone(), ArenaIndex(0));
        self.nodes.push(ArenaNode {
            pose,
            index: ArenaIndex(0),
            name,
            children: vec![],
            depth: 0,
            parent: None,
        });
        ArenaIndex(0)
    }

    /// Add a new node as a child of `parent`.
    pub fn add(&mut self, pose: Pose, name: impl Into<String>, parent: ArenaIndex) -> Result<ArenaIndex, TendrilError> {
        let name = name.into();
        if self.nodes.is_empty() {
            return Err(TendrilError::RootNotSet);
        }
        // First check whether we can add the node (name not used yet)
        if self.lookup.contains_key(&name) {
            return Err(TendrilError::NotUnique(name));
        }
        let index = ArenaIndex(self.nodes.len());
        let parent_node = self
            .nodes
            .get_mut(parent.0)
            .ok_or(TendrilError::UnknownNode(parent.0))?;
        parent_node.children.push(index);
        let depth = parent_node.depth + 1;

        self.lookup.insert(name.clone(), index);
        self.nodes.push(ArenaNode {
            pose,
            index,
            name,
            children: vec![],
            depth,
            parent: Some(parent),
        });
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ArenaNode] {
        &self.nodes
    }

    pub fn node(&self, index: ArenaIndex) -> Option<&ArenaNode> {
        self.nodes.get(index.0)
    }

    pub fn index_of(&self, name: &str) -> Option<ArenaIndex> {
        self.lookup.get(name).copied()
    }

    pub fn pose(&self, index: ArenaIndex) -> Option<&Pose> {
        self.node(index).map(ArenaNode::pose)
    }

    pub fn parent(&self, index: ArenaIndex) -> Result<Option<ArenaIndex>, TendrilError> {
        self.node(index).map(ArenaNode::parent).ok_or(TendrilError::UnknownNode(index.0))
    }

    /// Distance of the node at `index` to the root
    pub fn depth(&self, index: ArenaIndex) -> Result<usize, TendrilError> {
        self.node(index).map(ArenaNode::depth).ok_or(TendrilError::UnknownNode(index.0))
    }

    pub fn set_pose(&mut self, index: ArenaIndex, pose: Pose) -> Result<(), TendrilError> {
        let node = self.nodes.get_mut(index.0).ok_or(TendrilError::UnknownNode(index.0))?;
        node.pose = pose;
        Ok(())
    }

    /// Iterates from `index` (inclusive) toward the root.
    pub fn ancestors(&self, index: ArenaIndex) -> impl Iterator<Item = &ArenaNode> {
        std::iter::successors(self.node(index), move |node| node.parent.and_then(|parent| self.node(parent)))
    }

    /// The arena indices of the chain ending in `effector` with `chain_length` links, ordered
    /// from the base to the effector.
    pub fn chain_indices(&self, effector: ArenaIndex, chain_length: usize) -> Result<Vec<ArenaIndex>, TendrilError> {
        if chain_length < 1 {
            return Err(TendrilError::InvalidChainLength(chain_length));
        }
        let node = self.node(effector).ok_or(TendrilError::UnknownNode(effector.0))?;
        if node.depth < chain_length {
            return Err(TendrilError::ChainTooLong {
                requested: chain_length,
                depth: node.depth,
            });
        }
        let mut indices = self
            .ancestors(effector)
            .take(chain_length + 1)
            .map(ArenaNode::index)
            .collect_vec();
        indices.reverse();
        Ok(indices)
    }

    /// Ordered view of the chain ending in `effector`, usable as a [crate::PoseProvider].
    pub fn chain(&mut self, effector: ArenaIndex, chain_length: usize) -> Result<ChainView<'_>, TendrilError> {
        let indices = self.chain_indices(effector, chain_length)?;
        Ok(ChainView::new(self, indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    // Layout of the tree
    //      body
    //     /    \
    //   hip_l  hip_r
    //    |      |
    //  knee_l  knee_r
    //    |
    //  foot_l
    fn spider() -> PoseArena {
        let mut tree = PoseArena::new();
        let at = |x, y| Pose::from_position(Vector3::new(x, y, 0.0));

        let body = tree.set_root(at(0.0, 2.0), "body");
        let hip_l = tree.add(at(-1.0, 2.0), "hip_l", body).unwrap();
        let hip_r = tree.add(at(1.0, 2.0), "hip_r", body).unwrap();
        let knee_l = tree.add(at(-2.0, 3.0), "knee_l", hip_l).unwrap();
        tree.add(at(2.0, 3.0), "knee_r", hip_r).unwrap();
        tree.add(at(-3.0, 0.0), "foot_l", knee_l).unwrap();
        tree
    }

    #[test_log::test]
    fn test_adding() {
        let tree = spider();

        assert_eq!(tree.len(), 6);
        assert_eq!(tree.nodes()[0].children(), &[ArenaIndex(1), ArenaIndex(2)]);
        assert_eq!(tree.nodes()[1].children(), &[ArenaIndex(3)]);

        let depths = tree.nodes().iter().map(ArenaNode::depth).collect_vec();
        assert_eq!(depths, &[0, 1, 1, 2, 2, 3]);

        let foot = tree.index_of("foot_l").unwrap();
        assert!(tree.node(foot).unwrap().is_leaf());
        let names = tree.ancestors(foot).map(ArenaNode::name).collect_vec();
        assert_eq!(names, &["foot_l", "knee_l", "hip_l", "body"]);

        assert_eq!(tree.parent(foot), Ok(tree.index_of("knee_l")));
        assert_eq!(tree.parent(ArenaIndex(0)), Ok(None));
        assert_eq!(tree.depth(foot), Ok(3));
        assert_eq!(tree.depth(ArenaIndex(9)), Err(TendrilError::UnknownNode(9)));
        assert!(tree.node(foot).unwrap().to_string().starts_with("foot_l (arena index"));
    }

    #[test]
    fn test_adding_errors() {
        let mut tree = PoseArena::new();
        assert_eq!(
            tree.add(Pose::default(), "orphan", ArenaIndex(0)),
            Err(TendrilError::RootNotSet)
        );

        let root = tree.set_root(Pose::default(), "root");
        assert_eq!(
            tree.add(Pose::default(), "root", root),
            Err(TendrilError::NotUnique("root".into()))
        );
        assert_eq!(
            tree.add(Pose::default(), "child", ArenaIndex(7)),
            Err(TendrilError::UnknownNode(7))
        );
    }

    #[test]
    fn test_chain_indices() {
        let tree = spider();
        let foot = tree.index_of("foot_l").unwrap();

        assert_eq!(
            tree.chain_indices(foot, 2).unwrap(),
            &[ArenaIndex(1), ArenaIndex(3), ArenaIndex(5)]
        );
        assert_eq!(tree.chain_indices(foot, 3).unwrap().len(), 4);
        assert_eq!(
            tree.chain_indices(foot, 4),
            Err(TendrilError::ChainTooLong { requested: 4, depth: 3 })
        );
        assert_eq!(tree.chain_indices(foot, 0), Err(TendrilError::InvalidChainLength(0)));
    }
}
