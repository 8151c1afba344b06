//! Hierarchy reconstruction and radial tidy tree layout.
//!
//! Records arrive as a flat list whose ids are dotted paths. [`build_layout`]
//! derives parent/child links from those paths and then places every node
//! with the Buchheim-Jünger-Leipert variant of Walker's tidy tree algorithm:
//!
//! 1. **First walk (post-order):** assign preliminary positions by merging
//!    subtree contours, using threads to walk contours in amortized O(1).
//! 2. **Second walk (pre-order):** accumulate modifiers into final positions.
//! 3. **Normalization:** map the horizontal extent onto `[0, angle_span]` and
//!    depth onto radial distance.
//!
//! Nothing is cached between calls; every parameter change rebuilds the tree.

use crate::types::{Dataset, NodeRecord, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters controlling the radial layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Radial distance between consecutive depth levels
    pub radius_unit: f32,
    /// Angular extent, in degrees, the leaves are spread across
    pub angle_span: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius_unit: crate::constants::DEFAULT_RADIUS_SLIDER * crate::constants::RADIUS_PER_STEP,
            angle_span: crate::constants::DEFAULT_ANGLE_SLIDER * crate::constants::ANGLE_PER_STEP,
        }
    }
}

/// A positioned node of the laid-out tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// The input record this node was built from
    pub record: NodeRecord,
    /// Index of the parent node, `None` for the root
    pub parent: Option<usize>,
    /// Indices of the children, in input order
    pub children: Vec<usize>,
    /// Number of ancestors
    pub depth: usize,
    /// Position on the angular axis, in degrees
    pub angle: f32,
    /// Distance from the root
    pub radial_distance: f32,
}

impl LayoutNode {
    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The laid-out tree. Nodes are stored in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
    root: usize,
}

impl LayoutTree {
    /// The root node.
    pub fn root(&self) -> &LayoutNode {
        &self.nodes[self.root]
    }

    /// Index of the root node.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Node at the given index.
    pub fn node(&self, index: usize) -> &LayoutNode {
        &self.nodes[index]
    }

    /// All nodes, in input order.
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Always false for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node indices in breadth-first order starting with the root.
    pub fn descendants(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        order.push(self.root);
        let mut head = 0;
        while head < order.len() {
            let current = order[head];
            order.extend(self.nodes[current].children.iter().copied());
            head += 1;
        }
        order
    }

    /// Largest depth of any node.
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

/// Parent/child structure derived from dotted ids.
#[derive(Debug)]
struct Hierarchy {
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    depth: Vec<usize>,
    root: usize,
}

/// Derives the hierarchy from record ids, rejecting anything that is not a single tree.
fn stratify(records: &[NodeRecord]) -> Result<Hierarchy, TreeError> {
    if records.is_empty() {
        return Err(TreeError::Empty);
    }

    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        if index_of.insert(record.id.as_str(), i).is_some() {
            return Err(TreeError::DuplicateId(record.id.clone()));
        }
    }

    let mut parent = vec![None; records.len()];
    let mut children = vec![Vec::new(); records.len()];
    let mut root: Option<usize> = None;
    for (i, record) in records.iter().enumerate() {
        match record.parent_id() {
            None => {
                if let Some(existing) = root {
                    return Err(TreeError::MultipleRoots(
                        records[existing].id.clone(),
                        record.id.clone(),
                    ));
                }
                root = Some(i);
            }
            Some(parent_id) => {
                let p = *index_of
                    .get(parent_id)
                    .ok_or_else(|| TreeError::MissingParent {
                        id: record.id.clone(),
                        parent: parent_id.to_string(),
                    })?;
                parent[i] = Some(p);
                children[p].push(i);
            }
        }
    }
    let root = root.ok_or(TreeError::NoRoot)?;

    // Parents are strict prefixes, so a walk from the root reaches every record.
    let mut depth = vec![0; records.len()];
    let mut stack = vec![root];
    let mut reached = 0;
    while let Some(node) = stack.pop() {
        reached += 1;
        for &child in &children[node] {
            depth[child] = depth[node] + 1;
            stack.push(child);
        }
    }
    if reached != records.len() {
        return Err(TreeError::NoRoot);
    }

    Ok(Hierarchy {
        parent,
        children,
        depth,
        root,
    })
}

/// Builds the hierarchy and computes the radial layout.
///
/// # Errors
///
/// Returns a [`TreeError`] when the records are empty, contain duplicate ids,
/// reference a missing parent, or have more than one root.
pub fn build_layout(dataset: &Dataset, config: &LayoutConfig) -> Result<LayoutTree, TreeError> {
    let hierarchy = stratify(&dataset.records)?;
    let x = TidyWalker::new(&hierarchy).run();

    let max_depth = hierarchy.depth.iter().copied().max().unwrap_or(0);
    let mut left = hierarchy.root;
    let mut right = hierarchy.root;
    for node in preorder(&hierarchy) {
        if x[node] < x[left] {
            left = node;
        }
        if x[node] > x[right] {
            right = node;
        }
    }
    let s = if left == right {
        1.0
    } else {
        separation(&hierarchy, left, right) / 2.0
    };
    let tx = s - x[left];
    let kx = config.angle_span / (x[right] + s + tx);
    log::debug!(
        "laid out {} nodes, depth {}, angle span {}",
        dataset.records.len(),
        max_depth,
        config.angle_span
    );

    let nodes = dataset
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| LayoutNode {
            record: record.clone(),
            parent: hierarchy.parent[i],
            children: hierarchy.children[i].clone(),
            depth: hierarchy.depth[i],
            angle: (x[i] + tx) * kx,
            radial_distance: hierarchy.depth[i] as f32 * config.radius_unit,
        })
        .collect();

    Ok(LayoutTree {
        nodes,
        root: hierarchy.root,
    })
}

/// Spacing between two adjacent nodes: siblings sit closer than cousins, and
/// deeper levels pack tighter.
fn separation(h: &Hierarchy, a: usize, b: usize) -> f32 {
    let base = if h.parent[a] == h.parent[b] { 1.0 } else { 2.0 };
    base / h.depth[a].max(1) as f32
}

fn preorder(h: &Hierarchy) -> Vec<usize> {
    let mut order = Vec::with_capacity(h.parent.len());
    let mut stack = vec![h.root];
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(h.children[node].iter().rev().copied());
    }
    order
}

fn postorder(h: &Hierarchy) -> Vec<usize> {
    let mut order = preorder_reversed_children(h);
    order.reverse();
    order
}

/// Pre-order visiting children right to left; reversed, it yields a
/// post-order visiting children left to right.
fn preorder_reversed_children(h: &Hierarchy) -> Vec<usize> {
    let mut order = Vec::with_capacity(h.parent.len());
    let mut stack = vec![h.root];
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(h.children[node].iter().copied());
    }
    order
}

/// Working state for the tidy tree walks. Index `n` is a sentinel parent of the root.
struct TidyWalker<'a> {
    h: &'a Hierarchy,
    sentinel: usize,
    /// Preliminary position
    z: Vec<f32>,
    /// Modifier applied to the whole subtree
    m: Vec<f32>,
    /// Change of shift for evenly spreading intermediate siblings
    c: Vec<f32>,
    /// Shift for evenly spreading intermediate siblings
    s: Vec<f32>,
    /// Contour thread
    t: Vec<Option<usize>>,
    /// Ancestor pointer
    a: Vec<usize>,
    /// Default ancestor stored on each parent
    default_ancestor: Vec<Option<usize>>,
    /// Position among siblings
    number: Vec<usize>,
}

impl<'a> TidyWalker<'a> {
    fn new(h: &'a Hierarchy) -> Self {
        let n = h.parent.len();
        let mut number = vec![0; n + 1];
        for kids in &h.children {
            for (i, &child) in kids.iter().enumerate() {
                number[child] = i;
            }
        }
        Self {
            h,
            sentinel: n,
            z: vec![0.0; n + 1],
            m: vec![0.0; n + 1],
            c: vec![0.0; n + 1],
            s: vec![0.0; n + 1],
            t: vec![None; n + 1],
            a: (0..=n).collect(),
            default_ancestor: vec![None; n + 1],
            number,
        }
    }

    /// Runs both walks and returns the unnormalized horizontal positions.
    fn run(mut self) -> Vec<f32> {
        for node in postorder(self.h) {
            self.first_walk(node);
        }
        self.m[self.sentinel] = -self.z[self.h.root];

        let mut x = vec![0.0; self.sentinel];
        for node in preorder(self.h) {
            let p = self.parent(node);
            x[node] = self.z[node] + self.m[p];
            self.m[node] += self.m[p];
        }
        x
    }

    fn parent(&self, v: usize) -> usize {
        self.h.parent[v].unwrap_or(self.sentinel)
    }

    fn siblings(&self, v: usize) -> &[usize] {
        match self.h.parent[v] {
            Some(p) => &self.h.children[p],
            None => std::slice::from_ref(&self.h.root),
        }
    }

    fn next_left(&self, v: usize) -> Option<usize> {
        self.h.children[v].first().copied().or(self.t[v])
    }

    fn next_right(&self, v: usize) -> Option<usize> {
        self.h.children[v].last().copied().or(self.t[v])
    }

    fn first_walk(&mut self, v: usize) {
        let h = self.h;
        let siblings = self.siblings(v);
        let first_sibling = siblings[0];
        let w = (self.number[v] > 0).then(|| siblings[self.number[v] - 1]);

        let kids = &h.children[v];
        if let (Some(&first), Some(&last)) = (kids.first(), kids.last()) {
            self.execute_shifts(v);
            let midpoint = (self.z[first] + self.z[last]) / 2.0;
            match w {
                Some(w) => {
                    self.z[v] = self.z[w] + separation(h, v, w);
                    self.m[v] = self.z[v] - midpoint;
                }
                None => self.z[v] = midpoint,
            }
        } else if let Some(w) = w {
            self.z[v] = self.z[w] + separation(h, v, w);
        }

        let p = self.parent(v);
        let ancestor = self.default_ancestor[p].unwrap_or(first_sibling);
        self.default_ancestor[p] = Some(self.apportion(v, w, ancestor));
    }

    fn apportion(&mut self, v: usize, w: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = w else {
            return ancestor;
        };

        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.siblings(v)[0];
        let mut sip = self.m[vip];
        let mut sop = self.m[vop];
        let mut sim = self.m[vim];
        let mut som = self.m[vom];

        let (next_im, next_ip) = loop {
            let (Some(im), Some(ip)) = (self.next_right(vim), self.next_left(vip)) else {
                break (self.next_right(vim), self.next_left(vip));
            };
            vim = im;
            vip = ip;
            vom = self.next_left(vom).unwrap_or(vom);
            vop = self.next_right(vop).unwrap_or(vop);
            self.a[vop] = v;
            let shift = self.z[vim] + sim - self.z[vip] - sip + separation(self.h, vim, vip);
            if shift > 0.0 {
                let from = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(from, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.m[vim];
            sip += self.m[vip];
            som += self.m[vom];
            sop += self.m[vop];
        };

        if let Some(im) = next_im {
            if self.next_right(vop).is_none() {
                self.t[vop] = Some(im);
                self.m[vop] += sim - sop;
            }
        }
        if let Some(ip) = next_ip {
            if self.next_left(vom).is_none() {
                self.t[vom] = Some(ip);
                self.m[vom] += sip - som;
                ancestor = v;
            }
        }
        ancestor
    }

    fn next_ancestor(&self, vim: usize, v: usize, ancestor: usize) -> usize {
        if self.parent(self.a[vim]) == self.parent(v) {
            self.a[vim]
        } else {
            ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f32) {
        let subtrees = (self.number[wp] - self.number[wm]) as f32;
        let change = shift / subtrees;
        self.c[wp] -= change;
        self.s[wp] += shift;
        self.c[wm] += change;
        self.z[wp] += shift;
        self.m[wp] += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        let h = self.h;
        for &w in h.children[v].iter().rev() {
            self.z[w] += shift;
            self.m[w] += shift;
            change += self.c[w];
            shift += self.s[w] + change;
        }
    }
}
