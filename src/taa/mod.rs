//! Transition-based Alternating Automata (TAA)
//!
//! A TAA is built from named *locations*; each transition leads from one
//! location to a *set* of locations, carries a symbolic label, and a symbolic
//! acceptance value. The observable states of the automaton are sets of
//! locations, and the successors of a state are the joint expansions of one
//! transition choice per member location.
//!
//! Locations are interned: [`Taa::add_location`] assigns each name a small
//! identity that ordering and hashing of state sets are based on, which makes
//! both deterministic across runs.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use itertools::Itertools;

use crate::automaton::{wang32, Automaton, SuccIterator};
use crate::bdd::Bdd;
use crate::dict::{BddDict, ClientId};
use crate::formula::Formula;

/// Interned identity of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct LocationId(u32);

impl LocationId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Observable state of a TAA: a set of locations
///
/// Kept sorted by location identity, so comparison is lexicographic over the
/// identity sequence (shorter sequences first) and identity-equal sets hash
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StateSet(Vec<LocationId>);

impl StateSet {
    fn new(mut locations: Vec<LocationId>) -> Self {
        locations.sort_unstable();
        locations.dedup();
        StateSet(locations)
    }

    fn empty() -> Self {
        StateSet(Vec::new())
    }

    /// Whether this is the empty ("dead") state set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of member locations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn iter(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.0.iter().copied()
    }
}

impl Hash for StateSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut res = wang32(0);
        for location in &self.0 {
            res = res.wrapping_add(location.0);
            res ^= wang32(res);
        }
        state.write_u32(res);
    }
}

/// Handle to a transition, for refinement through [`Taa::add_label`] and
/// [`Taa::add_acceptance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRef {
    src: LocationId,
    idx: usize,
}

#[derive(Debug)]
struct Transition {
    dst: StateSet,
    condition: Bdd,
    acceptance: Bdd,
}

/// A transition-based alternating automaton
///
/// Construction interleaves freely with queries: adding an acceptance marker
/// after the first query only invalidates the cached "all acceptance
/// conditions" value, which is recomputed lazily.
#[derive(Debug)]
pub struct Taa {
    dict: Rc<RefCell<BddDict>>,
    client: ClientId,
    /// Location names by identity
    names: Vec<String>,
    name_map: HashMap<String, LocationId>,
    /// Outgoing transitions by location identity
    outgoing: Vec<Vec<Transition>>,
    init: Option<LocationId>,
    neg_acceptance: Bdd,
    all_acceptance: RefCell<Option<Bdd>>,
}

impl Taa {
    pub fn new(dict: Rc<RefCell<BddDict>>) -> Self {
        let (client, neg_acceptance) = {
            let mut dict = dict.borrow_mut();
            (dict.new_client(), dict.bdd_true())
        };
        Taa {
            dict,
            client,
            names: Vec::new(),
            name_map: HashMap::new(),
            outgoing: Vec::new(),
            init: None,
            neg_acceptance,
            all_acceptance: RefCell::new(None),
        }
    }

    /// Intern the location `name`
    ///
    /// The first location added becomes the initial location; this can be
    /// overridden with [`Taa::set_initial`].
    pub fn add_location(&mut self, name: &str) {
        self.intern(name);
    }

    /// Make `name` the initial location, interning it if necessary
    pub fn set_initial(&mut self, name: &str) {
        let id = self.intern(name);
        self.init = Some(id);
    }

    fn intern(&mut self, name: &str) -> LocationId {
        if let Some(&id) = self.name_map.get(name) {
            return id;
        }
        let id = LocationId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_map.insert(name.to_string(), id);
        self.outgoing.push(Vec::new());
        if self.init.is_none() {
            self.init = Some(id);
        }
        id
    }

    /// Create a transition from `src` to the set of locations `dsts`
    ///
    /// All names are interned on the fly; duplicate destinations collapse.
    /// The label starts out `true` and the acceptance value `false`; refine
    /// them through the returned handle.
    pub fn create_transition(&mut self, src: &str, dsts: &[&str]) -> TransitionRef {
        let src = self.intern(src);
        let dst = StateSet::new(dsts.iter().map(|d| self.intern(d)).collect());
        let (condition, acceptance) = {
            let dict = self.dict.borrow();
            (dict.bdd_true(), dict.bdd_false())
        };
        let idx = self.outgoing[src.index()].len();
        self.outgoing[src.index()].push(Transition {
            dst,
            condition,
            acceptance,
        });
        TransitionRef { src, idx }
    }

    /// Conjoin the translation of `f` onto the label of `t`
    pub fn add_label(&mut self, t: TransitionRef, f: &Formula) {
        let label = f.to_bdd(&mut self.dict.borrow_mut(), self.client);
        let transition = &mut self.outgoing[t.src.index()][t.idx];
        transition.condition &= &label;
    }

    /// Add the acceptance marker `f` to transition `t`
    ///
    /// A marker seen for the first time allocates an acceptance variable and
    /// retrofits its negation onto the acceptance value of every existing
    /// transition, so older transitions stay well-typed against the enlarged
    /// marker space. Idempotent on the marker, additive on the transition.
    pub fn add_acceptance(&mut self, t: TransitionRef, f: &Formula) {
        let name = f.to_string();
        let mut dict = self.dict.borrow_mut();
        if dict.acc_map(&name).is_none() {
            let var = dict.register_acceptance_marker(&name, self.client);
            let neg = dict.nithvar(var);
            self.neg_acceptance &= &neg;

            // Append neg to all acceptance values.
            for transitions in &mut self.outgoing {
                for transition in transitions {
                    transition.acceptance &= &neg;
                }
            }

            *self.all_acceptance.borrow_mut() = None;
        }

        let var = dict
            .acc_map(&name)
            .expect("marker was registered just above");
        let v = dict.ithvar(var);
        let transition = &mut self.outgoing[t.src.index()][t.idx];
        transition.acceptance |= &v.and(&self.neg_acceptance.exists(var));
    }

    fn format_state_set(&self, set: &StateSet) -> String {
        format!(
            "{{{}}}",
            set.iter().map(|l| self.names[l.index()].as_str()).join(",")
        )
    }
}

impl Automaton for Taa {
    type State = StateSet;
    type SuccIter = TaaSuccIterator;

    fn initial_state(&self) -> StateSet {
        let init = self
            .init
            .expect("an automaton without locations has no initial state");
        StateSet::new(vec![init])
    }

    fn successors(&self, state: &StateSet) -> TaaSuccIterator {
        TaaSuccIterator::new(self, state)
    }

    fn format_state(&self, state: &StateSet) -> String {
        self.format_state_set(state)
    }

    fn dict(&self) -> Rc<RefCell<BddDict>> {
        Rc::clone(&self.dict)
    }

    fn all_acceptance_conditions(&self) -> Bdd {
        let mut cached = self.all_acceptance.borrow_mut();
        if cached.is_none() {
            // For each marker m: m AND (neg_acceptance with m projected out).
            let dict = self.dict.borrow();
            let mut all = dict.bdd_false();
            for var in self.neg_acceptance.support_vars() {
                all |= &dict.ithvar(var).and(&self.neg_acceptance.exists(var));
            }
            *cached = Some(all);
        }
        cached.as_ref().expect("filled just above").clone()
    }

    fn neg_acceptance_conditions(&self) -> Bdd {
        self.neg_acceptance.clone()
    }

    fn support_labels(&self, state: &StateSet) -> Bdd {
        let mut res = self.dict.borrow().bdd_false();
        for location in state.iter() {
            for transition in &self.outgoing[location.index()] {
                res |= &transition.condition;
            }
        }
        res
    }

    fn support_variables(&self, state: &StateSet) -> Bdd {
        let mut res = self.dict.borrow().bdd_true();
        for location in state.iter() {
            for transition in &self.outgoing[location.index()] {
                res &= &transition.condition.support();
            }
        }
        res
    }
}

impl Drop for Taa {
    fn drop(&mut self) {
        self.dict.borrow_mut().unregister_all(self.client);
    }
}

impl fmt::Display for Taa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dict = self.dict.borrow();
        for (name, transitions) in self.names.iter().zip(&self.outgoing) {
            writeln!(f, "Location: {}", name)?;
            for t in transitions {
                writeln!(
                    f,
                    "  {}, C:{}, A:{}",
                    self.format_state_set(&t.dst),
                    dict.format_condition(&t.condition),
                    dict.format_acceptance(&t.acceptance),
                )?;
            }
        }
        Ok(())
    }
}

struct ProductTransition {
    dst: StateSet,
    condition: Bdd,
    acceptance: Bdd,
}

/// Joint-successor enumerator of a TAA state
///
/// Built eagerly: the Cartesian product of the per-location transition lists
/// is expanded up front, with candidates merged or dropped as they are
/// produced. Enumeration then just walks the kept product transitions.
pub struct TaaSuccIterator {
    succ: Vec<ProductTransition>,
    all_acceptance: Bdd,
    /// Current position; `None` is "before first"
    pos: Option<usize>,
}

impl TaaSuccIterator {
    fn new(aut: &Taa, state: &StateSet) -> Self {
        let all_acceptance = aut.all_acceptance_conditions();
        let dict = aut.dict.borrow();

        if state.is_empty() {
            // The dead state set stays dead, under every label.
            return TaaSuccIterator {
                succ: vec![ProductTransition {
                    dst: StateSet::empty(),
                    condition: dict.bdd_true(),
                    acceptance: dict.bdd_false(),
                }],
                all_acceptance,
                pos: None,
            };
        }

        let mut succ: Vec<ProductTransition> = Vec::new();
        // Kept transitions indexed by destination set, in insertion order.
        let mut seen: HashMap<StateSet, Vec<usize>> = HashMap::new();

        let choices = state
            .iter()
            .map(|l| aut.outgoing[l.index()].iter())
            .multi_cartesian_product();
        'product: for tuple in choices {
            let mut condition = dict.bdd_true();
            let mut acceptance = dict.bdd_false();
            let mut dst = Vec::new();
            for t in &tuple {
                condition &= &t.condition;
                if condition.is_false() {
                    continue 'product;
                }
                acceptance |= &t.acceptance;
                for location in t.dst.iter() {
                    // Drop well locations: a destination with no expansion
                    // of its own imposes no obligation.
                    if !aut.outgoing[location.index()].is_empty() {
                        dst.push(location);
                    }
                }
            }
            let dst = StateSet::new(dst);

            // Look for another transition to merge with.
            if let Some(indices) = seen.get(&dst) {
                let mut merged = false;
                for &i in indices {
                    if succ[i].condition == condition {
                        // Same label: strengthen the acceptance value.
                        succ[i].acceptance &= &acceptance;
                        merged = true;
                        break;
                    }
                    if succ[i].acceptance == acceptance {
                        // Same acceptance: widen the label.
                        succ[i].condition |= &condition;
                        merged = true;
                        break;
                    }
                }
                if merged {
                    continue;
                }
            }

            seen.entry(dst.clone()).or_default().push(succ.len());
            succ.push(ProductTransition {
                dst,
                condition,
                acceptance,
            });
        }

        TaaSuccIterator {
            succ,
            all_acceptance,
            pos: None,
        }
    }

    fn current(&self) -> &ProductTransition {
        let pos = self.pos.expect("the enumerator was never started");
        assert!(pos < self.succ.len(), "the enumerator is exhausted");
        &self.succ[pos]
    }
}

impl SuccIterator for TaaSuccIterator {
    type State = StateSet;

    fn first(&mut self) {
        self.pos = Some(0);
    }

    fn advance(&mut self) {
        let pos = self.pos.expect("the enumerator was never started");
        self.pos = Some(pos + 1);
    }

    fn done(&self) -> bool {
        self.pos
            .map_or(self.succ.is_empty(), |pos| pos >= self.succ.len())
    }

    fn current_state(&self) -> StateSet {
        self.current().dst.clone()
    }

    fn current_label(&self) -> Bdd {
        self.current().condition.clone()
    }

    fn current_acceptance(&self) -> Bdd {
        let acc = &self.current().acceptance;
        self.all_acceptance.diff(&acc.and(&self.all_acceptance))
    }
}
