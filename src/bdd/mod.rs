//! Binary Decision Diagram (BDD) package underlying all symbolic values
//!
//! This module provides a canonical representation of boolean functions using
//! reduced ordered binary decision diagrams (ROBDDs). Transition labels and
//! acceptance values are plain [`Bdd`] handles, so equality tests between them
//! are constant time.
//!
//! # Implementation Details
//!
//! The package uses:
//! - **One manager per allocator**: the node table belongs to the
//!   [`BddAllocator`](crate::alloc::BddAllocator) that created it; handles
//!   from different managers must never be combined
//! - **Hash consing**: unique table for canonical node representation
//! - **Operation caching**: ITE and existential-projection results are memoized
//! - **Variable ordering**: variables are numeric indices, ordered by index
//!
//! The variable count (`varnum`) only ever grows, and only the allocator is
//! allowed to grow it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use std::sync::{Arc, RwLock};

/// Node identifier in the BDD
pub type NodeId = usize;

/// Variable identifier (index in the variable ordering)
pub type VarId = usize;

/// Terminal node for FALSE
pub(crate) const FALSE_NODE: NodeId = 0;

/// Terminal node for TRUE
pub(crate) const TRUE_NODE: NodeId = 1;

/// Binary decision diagram node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BddNode {
    /// Terminal node (true or false)
    Terminal(bool),
    /// Decision node
    Decision {
        var: VarId,
        low: NodeId,  // false edge
        high: NodeId, // true edge
    },
}

/// BDD manager maintaining the unique table and operation caches
///
/// # Critical Invariant: NodeId Stability
///
/// **NodeIds are stable** - once a node is created at a given index, it remains
/// at that index forever. The `nodes` Vec only grows (via `push`), never
/// shrinks or reorders. A NodeId is therefore valid for the lifetime of the
/// manager and handles can be copied freely.
#[derive(Debug)]
pub(crate) struct BddManager {
    /// All nodes in the BDD (terminals at indices 0 and 1)
    /// INVARIANT: Nodes are never removed or reordered - only appended
    nodes: Vec<BddNode>,
    /// Unique table: (var, low, high) -> NodeId for hash consing
    unique_table: HashMap<(VarId, NodeId, NodeId), NodeId>,
    /// Number of variables currently declared; never shrinks
    varnum: usize,
    /// Cache for ITE operations: (f, g, h) -> result
    ite_cache: HashMap<(NodeId, NodeId, NodeId), NodeId>,
    /// Cache for existential projection: (f, var) -> result
    exists_cache: HashMap<(NodeId, VarId), NodeId>,
}

impl BddManager {
    /// Create a manager with `varnum` declared variables
    pub(crate) fn new(varnum: usize) -> Self {
        BddManager {
            nodes: vec![
                BddNode::Terminal(false), // FALSE_NODE = 0
                BddNode::Terminal(true),  // TRUE_NODE = 1
            ],
            unique_table: HashMap::new(),
            varnum,
            ite_cache: HashMap::new(),
            exists_cache: HashMap::new(),
        }
    }

    pub(crate) fn varnum(&self) -> usize {
        self.varnum
    }

    /// Declare `k` additional variables
    ///
    /// Growing is cheap: the variable order is the index order, so no node
    /// ever has to move.
    pub(crate) fn ext_varnum(&mut self, k: usize) {
        self.varnum += k;
    }

    /// Declare variables up to `n`; `n` below the current count is a bug
    pub(crate) fn set_varnum(&mut self, n: usize) {
        assert!(
            n >= self.varnum,
            "the variable count never shrinks ({} -> {})",
            self.varnum,
            n
        );
        self.varnum = n;
    }

    /// Get or create a decision node (with hash consing)
    ///
    /// # Invariant
    /// This method only creates Decision nodes, never Terminal nodes.
    /// Terminal nodes are always at positions 0 and 1.
    fn make_node(&mut self, var: VarId, low: NodeId, high: NodeId) -> NodeId {
        debug_assert!(var < self.varnum, "variable {} was never declared", var);

        // Reduction rule: if low == high, return that node (redundant test elimination)
        if low == high {
            return low;
        }

        // Check unique table
        let key = (var, low, high);
        if let Some(&existing) = self.unique_table.get(&key) {
            return existing;
        }

        let node_id = self.nodes.len();
        self.nodes.push(BddNode::Decision { var, low, high });
        self.unique_table.insert(key, node_id);
        node_id
    }

    fn get_node(&self, id: NodeId) -> &BddNode {
        &self.nodes[id]
    }

    /// If-Then-Else operation (Shannon expansion)
    ///
    /// Computes: if f then g else h
    /// This is the fundamental BDD operation from which all others are derived.
    fn ite(&mut self, f: NodeId, g: NodeId, h: NodeId) -> NodeId {
        // Terminal cases
        if f == TRUE_NODE {
            return g;
        }
        if f == FALSE_NODE {
            return h;
        }
        if g == TRUE_NODE && h == FALSE_NODE {
            return f;
        }
        if g == h {
            return g;
        }

        // Check cache
        let cache_key = (f, g, h);
        if let Some(&result) = self.ite_cache.get(&cache_key) {
            return result;
        }

        // Find the topmost variable among f, g, h
        let f_var = Self::node_var(self.get_node(f));
        let g_var = Self::node_var(self.get_node(g));
        let h_var = Self::node_var(self.get_node(h));
        let top_var = f_var.min(g_var).min(h_var);

        // Shannon expansion on the topmost variable
        let (f_low, f_high) = self.cofactors(f, f_var, top_var);
        let (g_low, g_high) = self.cofactors(g, g_var, top_var);
        let (h_low, h_high) = self.cofactors(h, h_var, top_var);

        let low = self.ite(f_low, g_low, h_low);
        let high = self.ite(f_high, g_high, h_high);

        let result = self.make_node(top_var, low, high);
        self.ite_cache.insert(cache_key, result);
        result
    }

    /// Get the variable of a node (usize::MAX for terminals)
    fn node_var(node: &BddNode) -> VarId {
        match node {
            BddNode::Terminal(_) => usize::MAX,
            BddNode::Decision { var, .. } => *var,
        }
    }

    /// Get cofactors (low and high children) for Shannon expansion
    fn cofactors(&self, node_id: NodeId, node_var: VarId, split_var: VarId) -> (NodeId, NodeId) {
        if node_var == split_var {
            match self.get_node(node_id) {
                BddNode::Decision { low, high, .. } => (*low, *high),
                BddNode::Terminal(_) => unreachable!(),
            }
        } else {
            // Variable doesn't appear in this branch
            (node_id, node_id)
        }
    }

    /// Existential projection: remove `var` from `f` by disjoining its cofactors
    fn exists(&mut self, f: NodeId, var: VarId) -> NodeId {
        let (f_var, low, high) = match *self.get_node(f) {
            BddNode::Terminal(_) => return f,
            BddNode::Decision { var, low, high } => (var, low, high),
        };
        // Variables below f's root are all larger, so `var` cannot occur there.
        if f_var > var {
            return f;
        }

        let cache_key = (f, var);
        if let Some(&result) = self.exists_cache.get(&cache_key) {
            return result;
        }

        let result = if f_var == var {
            self.ite(low, TRUE_NODE, high)
        } else {
            let low = self.exists(low, var);
            let high = self.exists(high, var);
            self.make_node(f_var, low, high)
        };
        self.exists_cache.insert(cache_key, result);
        result
    }

    /// Collect the variables occurring in `f`, in ascending order
    fn support_vars(&self, f: NodeId) -> Vec<VarId> {
        let mut vars = std::collections::BTreeSet::new();
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![f];
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if let BddNode::Decision { var, low, high } = self.get_node(node) {
                vars.insert(*var);
                stack.push(*low);
                stack.push(*high);
            }
        }
        vars.into_iter().collect()
    }

    /// Build the positive cube of the variables occurring in `f`
    fn support(&mut self, f: NodeId) -> NodeId {
        let vars = self.support_vars(f);
        let mut cube = TRUE_NODE;
        for var in vars.into_iter().rev() {
            cube = self.make_node(var, FALSE_NODE, cube);
        }
        cube
    }

    /// Enumerate the satisfying cubes of `f` (paths to the TRUE terminal)
    fn cubes(&self, f: NodeId, path: &mut BTreeMap<VarId, bool>, out: &mut Vec<BTreeMap<VarId, bool>>) {
        match *self.get_node(f) {
            BddNode::Terminal(true) => out.push(path.clone()),
            BddNode::Terminal(false) => {}
            BddNode::Decision { var, low, high } => {
                path.insert(var, false);
                self.cubes(low, path, out);
                path.insert(var, true);
                self.cubes(high, path, out);
                path.remove(&var);
            }
        }
    }
}

/// Handle to a boolean function held in a [`BddManager`]
///
/// The handle is cheap to clone; equality is a root comparison, which is exact
/// because the manager hash-conses nodes. Combining handles from different
/// managers is a contract violation.
#[derive(Clone)]
pub struct Bdd {
    manager: Arc<RwLock<BddManager>>,
    root: NodeId,
}

impl Bdd {
    pub(crate) fn constant(manager: &Arc<RwLock<BddManager>>, value: bool) -> Self {
        Bdd {
            manager: Arc::clone(manager),
            root: if value { TRUE_NODE } else { FALSE_NODE },
        }
    }

    /// The positive literal of variable `var`
    pub(crate) fn ithvar(manager: &Arc<RwLock<BddManager>>, var: VarId) -> Self {
        let root = manager.write().unwrap().make_node(var, FALSE_NODE, TRUE_NODE);
        Bdd {
            manager: Arc::clone(manager),
            root,
        }
    }

    /// The negative literal of variable `var`
    pub(crate) fn nithvar(manager: &Arc<RwLock<BddManager>>, var: VarId) -> Self {
        let root = manager.write().unwrap().make_node(var, TRUE_NODE, FALSE_NODE);
        Bdd {
            manager: Arc::clone(manager),
            root,
        }
    }

    fn apply(&self, other: &Bdd, g: impl FnOnce(&mut BddManager, NodeId, NodeId) -> NodeId) -> Bdd {
        debug_assert!(
            Arc::ptr_eq(&self.manager, &other.manager),
            "combining BDDs from different managers"
        );
        let manager = Arc::clone(&self.manager);
        let result = g(&mut manager.write().unwrap(), self.root, other.root);
        Bdd {
            manager,
            root: result,
        }
    }

    /// Logical AND: `and(f, g) = ite(f, g, false)`
    pub fn and(&self, other: &Bdd) -> Bdd {
        self.apply(other, |mgr, f, g| mgr.ite(f, g, FALSE_NODE))
    }

    /// Logical OR: `or(f, g) = ite(f, true, g)`
    pub fn or(&self, other: &Bdd) -> Bdd {
        self.apply(other, |mgr, f, g| mgr.ite(f, TRUE_NODE, g))
    }

    /// Logical NOT: `not(f) = ite(f, false, true)`
    pub fn not(&self) -> Bdd {
        let manager = Arc::clone(&self.manager);
        let result = manager
            .write()
            .unwrap()
            .ite(self.root, FALSE_NODE, TRUE_NODE);
        Bdd {
            manager,
            root: result,
        }
    }

    /// Set difference on the boolean algebra: `diff(f, g) = f AND NOT g`
    pub fn diff(&self, other: &Bdd) -> Bdd {
        self.apply(other, |mgr, f, g| mgr.ite(g, FALSE_NODE, f))
    }

    /// Existentially project `var` out of this function
    pub fn exists(&self, var: VarId) -> Bdd {
        let manager = Arc::clone(&self.manager);
        let result = manager.write().unwrap().exists(self.root, var);
        Bdd {
            manager,
            root: result,
        }
    }

    /// The set of variables this function depends on, as a positive cube
    pub fn support(&self) -> Bdd {
        let manager = Arc::clone(&self.manager);
        let result = manager.write().unwrap().support(self.root);
        Bdd {
            manager,
            root: result,
        }
    }

    /// The set of variables this function depends on, in ascending order
    pub fn support_vars(&self) -> Vec<VarId> {
        self.manager.read().unwrap().support_vars(self.root)
    }

    /// Check if this function is a constant
    pub fn is_terminal(&self) -> bool {
        self.root == TRUE_NODE || self.root == FALSE_NODE
    }

    /// Check if this function is TRUE
    pub fn is_true(&self) -> bool {
        self.root == TRUE_NODE
    }

    /// Check if this function is FALSE
    pub fn is_false(&self) -> bool {
        self.root == FALSE_NODE
    }

    /// Enumerate the satisfying cubes (paths to the TRUE terminal)
    ///
    /// Each cube maps the variables tested along the path to their polarity;
    /// untested variables are don't-cares. The constant TRUE yields one empty
    /// cube, the constant FALSE yields none.
    pub fn satisfying_cubes(&self) -> Vec<BTreeMap<VarId, bool>> {
        let mut out = Vec::new();
        let mut path = BTreeMap::new();
        self.manager
            .read()
            .unwrap()
            .cubes(self.root, &mut path, &mut out);
        out
    }

    /// Number of nodes reachable from the root, terminals included
    pub fn node_count(&self) -> usize {
        let mgr = self.manager.read().unwrap();
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if let BddNode::Decision { low, high, .. } = mgr.get_node(node) {
                stack.push(*low);
                stack.push(*high);
            }
        }
        seen.len()
    }

    pub(crate) fn manager(&self) -> &Arc<RwLock<BddManager>> {
        &self.manager
    }
}

impl PartialEq for Bdd {
    fn eq(&self, other: &Self) -> bool {
        // Hash consing makes the root comparison exact.
        Arc::ptr_eq(&self.manager, &other.manager) && self.root == other.root
    }
}

impl Eq for Bdd {}

impl fmt::Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_true() {
            write!(f, "Bdd(true)")
        } else if self.is_false() {
            write!(f, "Bdd(false)")
        } else {
            write!(f, "Bdd(#{})", self.root)
        }
    }
}

impl BitAnd for &Bdd {
    type Output = Bdd;

    fn bitand(self, rhs: &Bdd) -> Bdd {
        self.and(rhs)
    }
}

impl BitOr for &Bdd {
    type Output = Bdd;

    fn bitor(self, rhs: &Bdd) -> Bdd {
        self.or(rhs)
    }
}

impl Sub for &Bdd {
    type Output = Bdd;

    fn sub(self, rhs: &Bdd) -> Bdd {
        self.diff(rhs)
    }
}

impl Not for &Bdd {
    type Output = Bdd;

    fn not(self) -> Bdd {
        Bdd::not(self)
    }
}

impl BitAndAssign<&Bdd> for Bdd {
    fn bitand_assign(&mut self, rhs: &Bdd) {
        *self = self.and(rhs);
    }
}

impl BitOrAssign<&Bdd> for Bdd {
    fn bitor_assign(&mut self, rhs: &Bdd) {
        *self = self.or(rhs);
    }
}

#[cfg(test)]
mod tests;
