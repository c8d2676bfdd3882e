//! On-the-fly language-emptiness check for symbolic omega-automata
//!
//! Implements Couvreur's algorithm (FM'99): a single depth-first search
//! maintaining a stack of candidate SCC roots with accumulated acceptance.
//! An SCC whose accumulated acceptance reaches the automaton's "all
//! acceptance conditions" value is accepting and stops the search; the
//! language is empty when the search exhausts the reachable states instead.
//!
//! After a non-empty verdict, [`EmptinessCheck::counter_example`]
//! reconstructs an accepted lasso: a prefix leading into the accepting SCC
//! and a cycle inside it that carries every acceptance marker.
//!
//! The search is iterative with an explicit frame stack; each frame owns its
//! successor enumerator and releases it when popped.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, trace};

use crate::automaton::{carried_acceptance, Automaton, AutomatonState, SuccIterator};
use crate::bdd::Bdd;

/// Candidate SCC root met during the depth-first search
struct RootRecord {
    /// DFS index of the lowest live state known to belong to this SCC
    index: usize,
    /// Union of the markers seen on transitions entirely inside this SCC
    condition: Bdd,
}

struct Frame<A: Automaton> {
    state: A::State,
    iter: A::SuccIter,
}

enum Status<S> {
    Unchecked,
    Empty,
    NonEmpty(Witness<S>),
}

/// Everything needed to rebuild a counter-example after the search stopped
struct Witness<S> {
    /// States on the DFS stack when the accepting SCC closed, in push order
    suffix: Vec<S>,
    /// Source of the back-edge that made the SCC accepting
    source: S,
    /// Destination of that back-edge
    target: S,
    label: Bdd,
    /// Markers carried by the back-edge
    acc: Bdd,
    /// Index of the accepting root; live states at or above it form the SCC
    root_index: usize,
}

/// An accepted lasso: prefix plus accepting cycle
///
/// The cycle is a sequence of `(state, label)` pairs; each pair is a
/// transition leaving `state`, and the transition of the last pair leads back
/// to the state of the first, which is the last state of the prefix.
pub struct CounterExample<S> {
    pub prefix: Vec<S>,
    pub cycle: Vec<(S, Bdd)>,
}

impl<S: AutomatonState> CounterExample<S> {
    /// Render the lasso with the automaton's own state formatting
    pub fn format<A: Automaton<State = S>>(&self, aut: &A) -> String {
        let dict = aut.dict();
        let dict = dict.borrow();
        let mut out = String::from("Prefix:\n");
        for state in &self.prefix {
            out.push_str(&format!("  {}\n", aut.format_state(state)));
        }
        out.push_str("Cycle:\n");
        for (state, label) in &self.cycle {
            out.push_str(&format!(
                "  {} | {}\n",
                aut.format_state(state),
                dict.format_condition(label)
            ));
        }
        out
    }
}

/// Couvreur's on-the-fly emptiness check over the abstract automaton contract
pub struct EmptinessCheck<'a, A: Automaton> {
    aut: &'a A,
    /// DFS index per visited state; 0 marks purged states
    h: HashMap<A::State, usize>,
    status: Status<A::State>,
}

impl<'a, A: Automaton> EmptinessCheck<'a, A> {
    pub fn new(aut: &'a A) -> Self {
        EmptinessCheck {
            aut,
            h: HashMap::new(),
            status: Status::Unchecked,
        }
    }

    /// Run the search; returns `true` iff the automaton's language is empty
    ///
    /// A second call returns the memoized verdict.
    pub fn check(&mut self) -> bool {
        match &self.status {
            Status::Empty => return true,
            Status::NonEmpty(_) => return false,
            Status::Unchecked => {}
        }

        let dict = self.aut.dict();
        let bddfalse = dict.borrow().bdd_false();
        let all_acc = self.aut.all_acceptance_conditions();

        let init = self.aut.initial_state();
        self.h.insert(init.clone(), 1);
        let mut next_index = 2usize;
        let mut roots = vec![RootRecord {
            index: 1,
            condition: bddfalse.clone(),
        }];
        // Markers on the arc that entered each root, folded in when roots
        // merge; without them the markers of DFS tree edges inside an SCC
        // would be lost.
        let mut arcs: Vec<Bdd> = vec![bddfalse.clone()];
        let mut iter = self.aut.successors(&init);
        iter.first();
        let mut dfs: Vec<Frame<A>> = vec![Frame { state: init, iter }];

        while let Some(top) = dfs.last_mut() {
            if top.iter.done() {
                let frame = dfs.pop().expect("the stack was just non-empty");
                if self.h[&frame.state] == roots.last().expect("roots outlive frames").index {
                    // The SCC rooted here closed without accepting.
                    trace!(index = self.h[&frame.state], "purging closed component");
                    self.remove_component(&frame.state);
                    roots.pop();
                    arcs.pop();
                }
                continue;
            }

            let dst = top.iter.current_state();
            let label = top.iter.current_label();
            let reported = top.iter.current_acceptance();
            top.iter.advance();
            let acc = carried_acceptance(&reported, &all_acc);

            match self.h.get(&dst).copied() {
                None => {
                    let index = next_index;
                    next_index += 1;
                    self.h.insert(dst.clone(), index);
                    roots.push(RootRecord {
                        index,
                        condition: bddfalse.clone(),
                    });
                    arcs.push(acc);
                    let mut iter = self.aut.successors(&dst);
                    iter.first();
                    dfs.push(Frame { state: dst, iter });
                }
                Some(0) => {
                    // Purged: this edge cannot contribute.
                }
                Some(threshold) => {
                    // Back or cross edge into a live state: merge every root
                    // above the destination into one surviving record.
                    let mut accum = acc;
                    while roots.last().expect("the destination's root remains").index > threshold {
                        let root = roots.pop().expect("checked by the loop condition");
                        accum |= &root.condition;
                        accum |= &arcs.pop().expect("arcs mirror roots");
                    }
                    let surviving = roots.last_mut().expect("the destination's root remains");
                    surviving.condition |= &accum;

                    if surviving.condition == all_acc {
                        let source = dfs.last().expect("frames are non-empty").state.clone();
                        debug!(
                            root = surviving.index,
                            states = self.h.len(),
                            "accepting component found"
                        );
                        self.status = Status::NonEmpty(Witness {
                            suffix: dfs.iter().map(|f| f.state.clone()).collect(),
                            source,
                            target: dst,
                            label,
                            acc: carried_acceptance(&reported, &all_acc),
                            root_index: surviving.index,
                        });
                        return false;
                    }
                }
            }
        }

        debug!(states = self.h.len(), "language is empty");
        self.status = Status::Empty;
        true
    }

    /// Zero the DFS index of every state of the component reachable from
    /// `start` through live states
    fn remove_component(&mut self, start: &A::State) {
        let _previous = self.h.insert(start.clone(), 0);
        debug_assert!(matches!(_previous, Some(i) if i > 0));

        let mut iter = self.aut.successors(start);
        iter.first();
        let mut stack = vec![iter];
        while let Some(top) = stack.last_mut() {
            if top.done() {
                stack.pop();
                continue;
            }
            let dst = top.current_state();
            top.advance();
            if let Some(index) = self.h.get_mut(&dst) {
                if *index != 0 {
                    *index = 0;
                    let mut iter = self.aut.successors(&dst);
                    iter.first();
                    stack.push(iter);
                }
            }
        }
    }

    /// Whether `state` belongs to the accepting SCC
    fn in_scc(&self, state: &A::State, root_index: usize) -> bool {
        self.h
            .get(state)
            .map_or(false, |&index| index != 0 && index >= root_index)
    }

    /// Rebuild an accepted lasso after [`check`](Self::check) returned
    /// non-empty
    ///
    /// Calling this before `check()`, or when the language is empty, is a
    /// contract violation.
    pub fn counter_example(&self) -> CounterExample<A::State> {
        let witness = match &self.status {
            Status::Unchecked => panic!("counter_example() requires a prior check()"),
            Status::Empty => panic!("the language is empty, there is no counter-example"),
            Status::NonEmpty(witness) => witness,
        };

        let all_acc = self.aut.all_acceptance_conditions();
        let mut cycle = vec![(witness.source.clone(), witness.label.clone())];
        let mut current = witness.target.clone();
        let mut rest = all_acc.diff(&witness.acc);

        // Hunt down the missing markers by iterated shortest searches inside
        // the accepting component.
        while !rest.is_false() {
            let (path, reached, covered) =
                self.shortest_in_scc_path(&current, witness.root_index, |_, acc| {
                    !acc.and(&rest).is_false()
                });
            cycle.extend(path);
            current = reached;
            rest = rest.diff(&covered);
        }

        // Close the cycle back to its entry state.
        if current != witness.source {
            let source = &witness.source;
            let (path, _, _) =
                self.shortest_in_scc_path(&current, witness.root_index, |dst, _| dst == source);
            cycle.extend(path);
        }

        CounterExample {
            prefix: witness.suffix.clone(),
            cycle,
        }
    }

    /// Breadth-first search inside the accepting SCC for a shortest path
    /// whose final edge satisfies `found`
    ///
    /// Returns the path as `(state, label)` pairs together with the state the
    /// final edge reaches and the markers it carries. Ties in path length are
    /// broken by the DFS index of the candidate destinations, which makes
    /// reconstruction deterministic.
    fn shortest_in_scc_path(
        &self,
        start: &A::State,
        root_index: usize,
        found: impl Fn(&A::State, &Bdd) -> bool,
    ) -> (Vec<(A::State, Bdd)>, A::State, Bdd) {
        let all_acc = self.aut.all_acceptance_conditions();
        let mut parent: HashMap<A::State, (A::State, Bdd)> = HashMap::new();
        let mut seen = HashSet::new();
        seen.insert(start.clone());
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());

        while let Some(state) = queue.pop_front() {
            let mut edges = Vec::new();
            let mut iter = self.aut.successors(&state);
            iter.first();
            while !iter.done() {
                let dst = iter.current_state();
                if self.in_scc(&dst, root_index) {
                    let acc = carried_acceptance(&iter.current_acceptance(), &all_acc);
                    edges.push((dst, iter.current_label(), acc));
                }
                iter.advance();
            }
            edges.sort_by_key(|(dst, _, _)| self.h[dst]);

            for (dst, label, acc) in edges {
                if found(&dst, &acc) {
                    // Walk the parent chain back to the start, then append
                    // the final edge.
                    let mut path = Vec::new();
                    let mut cursor = state.clone();
                    while cursor != *start {
                        let (prev, lbl) = parent
                            .get(&cursor)
                            .expect("every discovered state has a parent")
                            .clone();
                        path.push((prev.clone(), lbl));
                        cursor = prev;
                    }
                    path.reverse();
                    path.push((state, label));
                    return (path, dst, acc);
                }
                if seen.insert(dst.clone()) {
                    parent.insert(dst.clone(), (state.clone(), label));
                    queue.push_back(dst);
                }
            }
        }
        unreachable!("the accepting component satisfies every pending marker")
    }
}
