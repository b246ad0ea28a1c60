use super::AnnotationValue;
use crate::io::writer::newick_writer::write_newick;
use crate::io::InternalLabels;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

pub type TreeIndex = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeError {
    EmptyTree,
    NodeNotInTree(TreeIndex),
    OutgroupIsRoot,
}
impl Error for TreeError {}
impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreeError::EmptyTree => write!(f, "tree has no root"),
            TreeError::NodeNotInTree(index) => write!(f, "node {} is not part of the tree", index),
            TreeError::OutgroupIsRoot => write!(f, "cannot use the root of the tree as outgroup"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutableTreeNode {
    pub taxon: Option<String>,
    pub label: Option<String>,
    pub support: Option<f64>,
    pub parent: Option<TreeIndex>,
    pub children: Vec<TreeIndex>,
    pub length: Option<f64>,
    pub annotations: Option<HashMap<String, AnnotationValue>>,
}

impl MutableTreeNode {
    pub(crate) fn new(taxon: Option<String>) -> Self {
        MutableTreeNode {
            taxon,
            label: None,
            support: None,
            parent: None,
            children: vec![],
            length: None,
            annotations: None,
        }
    }
}

/// Rooted tree backed by a vector of nodes. Nodes are never removed, so a
/// `TreeIndex` stays valid through restructuring.
#[derive(Debug, Clone, Default)]
pub struct MutableTree {
    nodes: Vec<MutableTreeNode>,
    root: Option<TreeIndex>,
}

impl MutableTree {
    pub fn new() -> Self {
        MutableTree {
            nodes: Vec::new(),
            root: None,
        }
    }

    fn add_node(&mut self, node: MutableTreeNode) -> TreeIndex {
        let index = self.nodes.len();
        self.nodes.push(node);
        index
    }

    pub fn make_external_node(&mut self, taxon: Option<&str>) -> TreeIndex {
        self.add_node(MutableTreeNode::new(taxon.map(String::from)))
    }

    pub fn make_internal_node(&mut self, children: Vec<TreeIndex>) -> TreeIndex {
        let mut node = MutableTreeNode::new(None);
        node.children = children;
        let index = self.add_node(node);
        for child in self.nodes[index].children.clone() {
            self.nodes[child].parent = Some(index);
        }
        index
    }

    pub fn set_root(&mut self, root: Option<TreeIndex>) {
        self.root = root
    }
    pub fn get_root(&self) -> Option<TreeIndex> {
        self.root
    }

    pub fn get_node(&self, index: TreeIndex) -> Option<&MutableTreeNode> {
        self.nodes.get(index)
    }
    fn get_node_mut(&mut self, index: TreeIndex) -> Option<&mut MutableTreeNode> {
        self.nodes.get_mut(index)
    }

    pub fn get_children(&self, index: TreeIndex) -> &[TreeIndex] {
        match self.get_node(index) {
            Some(node) => node.children.as_slice(),
            None => &[],
        }
    }
    pub fn get_num_children(&self, index: TreeIndex) -> usize {
        self.get_children(index).len()
    }
    pub fn get_child(&self, index: TreeIndex, i: usize) -> Option<TreeIndex> {
        self.get_children(index).get(i).copied()
    }
    pub fn get_parent(&self, index: TreeIndex) -> Option<TreeIndex> {
        self.get_node(index).and_then(|n| n.parent)
    }

    pub fn is_external(&self, index: TreeIndex) -> bool {
        self.get_num_children(index) == 0
    }
    pub fn get_node_count(&self) -> usize {
        self.nodes.len()
    }
    pub fn get_external_nodes(&self) -> Vec<TreeIndex> {
        self.preorder_iter().filter(|n| self.is_external(*n)).collect()
    }
    pub fn get_external_node_count(&self) -> usize {
        self.get_external_nodes().len()
    }
    pub fn get_internal_node_count(&self) -> usize {
        self.preorder_iter().filter(|n| !self.is_external(*n)).count()
    }

    pub fn get_taxon(&self, index: TreeIndex) -> Option<&str> {
        self.get_node(index).and_then(|n| n.taxon.as_deref())
    }
    pub fn get_label(&self, index: TreeIndex) -> Option<&str> {
        self.get_node(index).and_then(|n| n.label.as_deref())
    }
    /// The taxon of a tip or the label of an internal node.
    pub fn get_name(&self, index: TreeIndex) -> Option<&str> {
        if self.is_external(index) {
            self.get_taxon(index)
        } else {
            self.get_label(index)
        }
    }
    pub fn label_node(&mut self, index: TreeIndex, label: String) {
        if let Some(node) = self.get_node_mut(index) {
            node.label = Some(label);
        } else {
            warn!("node {} not found", index);
        }
    }

    pub fn get_length(&self, index: TreeIndex) -> Option<f64> {
        self.get_node(index).and_then(|n| n.length)
    }
    pub fn set_length(&mut self, index: TreeIndex, bl: f64) {
        if let Some(node) = self.get_node_mut(index) {
            node.length = Some(bl);
        }
    }
    pub fn get_support(&self, index: TreeIndex) -> Option<f64> {
        self.get_node(index).and_then(|n| n.support)
    }
    pub fn set_support(&mut self, index: TreeIndex, support: f64) {
        if let Some(node) = self.get_node_mut(index) {
            node.support = Some(support);
        }
    }

    pub fn get_annotation(&self, index: TreeIndex, key: &str) -> Option<&AnnotationValue> {
        self.get_annotations(index).and_then(|a| a.get(key))
    }
    pub fn get_annotations(&self, index: TreeIndex) -> Option<&HashMap<String, AnnotationValue>> {
        self.get_node(index).and_then(|n| n.annotations.as_ref())
    }
    pub fn annotate_node(&mut self, index: TreeIndex, key: String, value: AnnotationValue) {
        if let Some(node) = self.get_node_mut(index) {
            node.annotations
                .get_or_insert_with(HashMap::new)
                .insert(key, value);
        } else {
            warn!("node {} not found", index);
        }
    }

    pub fn preorder_iter(&self) -> PreorderIter<'_> {
        PreorderIter::new(self)
    }

    /// First node in preorder whose name equals `name` exactly.
    pub fn find_node_by_name(&self, name: &str) -> Option<TreeIndex> {
        self.preorder_iter().find(|n| self.get_name(*n) == Some(name))
    }

    /// Roots the tree on the branch above `outgroup`. The root ends up with two
    /// children, the outgroup and the rest of the tree, and the outgroup's
    /// branch length is split evenly between them.
    pub fn reroot_on_outgroup(&mut self, outgroup: TreeIndex) -> Result<(), TreeError> {
        let root = self.root.ok_or(TreeError::EmptyTree)?;
        if outgroup >= self.nodes.len() {
            return Err(TreeError::NodeNotInTree(outgroup));
        }
        if outgroup == root {
            return Err(TreeError::OutgroupIsRoot);
        }

        // ancestors of the outgroup below the root, nearest first
        let mut path = vec![];
        let mut node = outgroup;
        loop {
            match self.nodes[node].parent {
                Some(parent) if parent == root => break,
                Some(parent) => {
                    path.push(parent);
                    node = parent;
                }
                None => return Err(TreeError::NodeNotInTree(outgroup)),
            }
        }
        let root_child = node;

        if path.is_empty() && self.nodes[root].children.len() == 1 {
            return Ok(());
        }

        self.remove_child(root, root_child);
        let down = match self.nodes[root].children.len() {
            0 => None,
            1 => self.nodes[root].children.pop(),
            _ => {
                let siblings = std::mem::take(&mut self.nodes[root].children);
                let connector = self.make_internal_node(siblings);
                self.nodes[connector].support = self.nodes[root_child].support;
                Some(connector)
            }
        };

        let ingroup = match path.first() {
            Some(&outgroup_parent) => {
                let mut carried = (
                    self.nodes[outgroup_parent].length,
                    self.nodes[outgroup_parent].support,
                );
                for pair in path.windows(2) {
                    let (lower, upper) = (pair[0], pair[1]);
                    self.remove_child(upper, lower);
                    self.nodes[lower].children.push(upper);
                    self.nodes[upper].parent = Some(lower);
                    let next = (self.nodes[upper].length, self.nodes[upper].support);
                    self.nodes[upper].length = carried.0;
                    self.nodes[upper].support = carried.1;
                    carried = next;
                }
                if let Some(down) = down {
                    self.nodes[root_child].children.push(down);
                    self.nodes[down].parent = Some(root_child);
                    self.nodes[down].length = add_lengths(self.nodes[down].length, carried.0);
                }
                self.remove_child(outgroup_parent, outgroup);
                self.nodes[outgroup_parent].length = None;
                outgroup_parent
            }
            // the root has at least one other child here
            None => match down {
                Some(down) => down,
                None => return Err(TreeError::NodeNotInTree(outgroup)),
            },
        };

        let half = add_lengths(self.nodes[outgroup].length, self.nodes[ingroup].length)
            .map(|l| l / 2.0);
        self.nodes[outgroup].length = half;
        self.nodes[ingroup].length = half;
        self.nodes[ingroup].support = self.nodes[outgroup].support;
        self.nodes[outgroup].parent = Some(root);
        self.nodes[ingroup].parent = Some(root);
        self.nodes[root].children = vec![outgroup, ingroup];
        Ok(())
    }

    fn remove_child(&mut self, parent: TreeIndex, child: TreeIndex) {
        self.nodes[parent].children.retain(|c| *c != child);
    }
}

fn add_lengths(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

impl fmt::Display for MutableTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", write_newick(self, InternalLabels::Names))
    }
}

pub struct PreorderIter<'a> {
    tree: &'a MutableTree,
    stack: Vec<TreeIndex>,
}

impl<'a> PreorderIter<'a> {
    pub fn new(tree: &'a MutableTree) -> Self {
        PreorderIter {
            tree,
            stack: tree.get_root().into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreorderIter<'a> {
    type Item = TreeIndex;

    fn next(&mut self) -> Option<TreeIndex> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.get_children(node).iter().rev().copied());
        Some(node)
    }
}
