//! Round-trip tests: dumping an automaton and re-reading it produces an
//! automaton bisimilar under state renaming

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::rc::Rc;

use omega_check::{
    carried_acceptance, load_reachable, save_reachable, Automaton, Bdd, BddDict, EmptinessCheck,
    Formula, SuccIterator, Taa,
};

fn new_dict() -> Rc<RefCell<BddDict>> {
    Rc::new(RefCell::new(BddDict::new()))
}

/// Outgoing edges of one observable state: destination paired with label and
/// carried acceptance
fn edges_of<A: Automaton>(aut: &A, state: &A::State) -> Vec<(A::State, Bdd, Bdd)> {
    let all_acc = aut.all_acceptance_conditions();
    let mut iter = aut.successors(state);
    let mut out = Vec::new();
    iter.first();
    while !iter.done() {
        out.push((
            iter.current_state(),
            iter.current_label(),
            carried_acceptance(&iter.current_acceptance(), &all_acc),
        ));
        iter.advance();
    }
    out
}

/// Check that `left` and `right` are bisimilar under a renaming of states.
///
/// Both automata must draw from the same dictionary so labels and acceptance
/// values are comparable. Walks the reachable parts in lockstep, demanding a
/// bijection between the successor transitions of paired states.
fn assert_bisimilar<A, B>(left: &A, right: &B)
where
    A: Automaton,
    B: Automaton,
{
    let mut pairing: HashMap<A::State, B::State> = HashMap::new();
    let mut queue = vec![(left.initial_state(), right.initial_state())];
    let mut visited = HashSet::new();

    while let Some((l, r)) = queue.pop() {
        if let Some(previous) = pairing.get(&l) {
            assert!(
                previous == &r,
                "state {} paired with both {} and {}",
                left.format_state(&l),
                right.format_state(previous),
                right.format_state(&r),
            );
        } else {
            pairing.insert(l.clone(), r.clone());
        }
        if !visited.insert(l.clone()) {
            continue;
        }

        let left_edges = edges_of(left, &l);
        let mut right_edges = edges_of(right, &r);
        assert_eq!(
            left_edges.len(),
            right_edges.len(),
            "branching mismatch at {}",
            left.format_state(&l)
        );
        for (dst, label, acc) in left_edges {
            let matched = right_edges
                .iter()
                .position(|(_, rl, ra)| rl == &label && ra == &acc)
                .unwrap_or_else(|| {
                    panic!("no counterpart for an edge of {}", left.format_state(&l))
                });
            let (rdst, _, _) = right_edges.swap_remove(matched);
            queue.push((dst, rdst));
        }
    }
}

fn sample_automaton(dict: Rc<RefCell<BddDict>>) -> Taa {
    let mut aut = Taa::new(dict);
    let t = aut.create_transition("A", &["B"]);
    aut.add_label(t, &Formula::parse("p * ~q").unwrap());
    let t = aut.create_transition("A", &["C"]);
    aut.add_label(t, &Formula::ap("q"));
    let t = aut.create_transition("B", &["B"]);
    aut.add_acceptance(t, &Formula::ap("alpha"));
    let t = aut.create_transition("C", &["B", "C"]);
    aut.add_label(t, &Formula::ap("p"));
    aut.add_acceptance(t, &Formula::ap("beta"));
    aut
}

#[test]
fn test_round_trip_is_bisimilar() {
    let dict = new_dict();
    let aut = sample_automaton(Rc::clone(&dict));

    let mut out = Vec::new();
    save_reachable(&aut, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    // Ground the reloaded automaton in the same dictionary so its labels are
    // directly comparable.
    let reloaded = load_reachable(Rc::clone(&dict), &text).unwrap();
    assert_bisimilar(&aut, &reloaded);
}

#[test]
fn test_round_trip_preserves_emptiness_verdict() {
    let dict = new_dict();
    let aut = sample_automaton(Rc::clone(&dict));

    let mut out = Vec::new();
    save_reachable(&aut, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let reloaded = load_reachable(Rc::clone(&dict), &text).unwrap();

    assert_eq!(
        EmptinessCheck::new(&aut).check(),
        EmptinessCheck::new(&reloaded).check()
    );
}

#[test]
fn test_round_trip_through_a_file() {
    let dict = new_dict();
    let aut = sample_automaton(Rc::clone(&dict));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    save_reachable(&aut, &mut file).unwrap();
    file.flush().unwrap();

    let text = fs::read_to_string(file.path()).unwrap();
    let reloaded = load_reachable(Rc::clone(&dict), &text).unwrap();
    assert_bisimilar(&aut, &reloaded);
}

#[test]
fn test_double_round_trip_is_stable() {
    let dict = new_dict();
    let aut = sample_automaton(Rc::clone(&dict));

    let mut first = Vec::new();
    save_reachable(&aut, &mut first).unwrap();
    let reloaded = load_reachable(Rc::clone(&dict), &String::from_utf8(first).unwrap()).unwrap();

    let mut second = Vec::new();
    save_reachable(&reloaded, &mut second).unwrap();
    let again =
        load_reachable(Rc::clone(&dict), &String::from_utf8(second).unwrap()).unwrap();
    assert_bisimilar(&reloaded, &again);
}
