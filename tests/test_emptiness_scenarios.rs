//! End-to-end emptiness-check scenarios through the public API

use std::cell::RefCell;
use std::rc::Rc;

use omega_check::{
    carried_acceptance, Automaton, BddDict, EmptinessCheck, Formula, SuccIterator, Taa,
};

fn new_dict() -> Rc<RefCell<BddDict>> {
    Rc::new(RefCell::new(BddDict::new()))
}

#[test]
fn test_accepting_singleton_cycle() {
    let mut aut = Taa::new(new_dict());
    let t = aut.create_transition("A", &["B"]);
    aut.add_label(t, &Formula::ap("p"));
    let t = aut.create_transition("B", &["B"]);
    aut.add_label(t, &Formula::ap("q"));
    aut.add_acceptance(t, &Formula::ap("alpha"));

    let mut check = EmptinessCheck::new(&aut);
    assert!(!check.check());

    let lasso = check.counter_example();
    let prefix: Vec<String> = lasso.prefix.iter().map(|s| aut.format_state(s)).collect();
    assert_eq!(prefix, vec!["{A}", "{B}"]);
    assert_eq!(lasso.cycle.len(), 1);
    assert_eq!(aut.format_state(&lasso.cycle[0].0), "{B}");
}

#[test]
fn test_marker_without_reachable_support_is_empty() {
    let mut aut = Taa::new(new_dict());
    aut.create_transition("A", &["B"]);
    aut.create_transition("B", &["A"]);
    let unreachable = aut.create_transition("U", &["U"]);
    aut.add_acceptance(unreachable, &Formula::ap("alpha"));
    aut.set_initial("A");

    assert!(EmptinessCheck::new(&aut).check());
}

#[test]
fn test_alternation_joins_obligations() {
    // A branches universally into B and C; the accepting cycle lives on the
    // joint state {B,C} and collects the markers of both components.
    let dict = new_dict();
    let mut aut = Taa::new(Rc::clone(&dict));
    aut.create_transition("A", &["B", "C"]);
    let t = aut.create_transition("B", &["B"]);
    aut.add_acceptance(t, &Formula::ap("alpha"));
    let t = aut.create_transition("C", &["C"]);
    aut.add_acceptance(t, &Formula::ap("beta"));

    let mut check = EmptinessCheck::new(&aut);
    assert!(!check.check());

    let lasso = check.counter_example();
    let prefix: Vec<String> = lasso.prefix.iter().map(|s| aut.format_state(s)).collect();
    assert_eq!(prefix, vec!["{A}", "{B,C}"]);

    // The single joint self-loop carries both markers at once.
    let all_acc = aut.all_acceptance_conditions();
    let state = &lasso.cycle[0].0;
    let mut iter = aut.successors(state);
    iter.first();
    assert!(!iter.done());
    let carried = carried_acceptance(&iter.current_acceptance(), &all_acc);
    assert_eq!(carried, all_acc);
}

#[test]
fn test_alternation_with_incompatible_labels_is_empty() {
    // The joint expansion of {B,C} conjoins p with ~p, so the only candidate
    // loop is dropped and nothing accepting remains.
    let mut aut = Taa::new(new_dict());
    aut.create_transition("A", &["B", "C"]);
    let t = aut.create_transition("B", &["B"]);
    aut.add_label(t, &Formula::ap("p"));
    aut.add_acceptance(t, &Formula::ap("alpha"));
    let t = aut.create_transition("C", &["C"]);
    aut.add_label(t, &Formula::parse("~p").unwrap());

    assert!(EmptinessCheck::new(&aut).check());
}

#[test]
fn test_markers_spread_over_the_cycle() {
    let mut aut = Taa::new(new_dict());
    let t = aut.create_transition("A", &["B"]);
    aut.add_acceptance(t, &Formula::ap("alpha"));
    let t = aut.create_transition("B", &["C"]);
    aut.add_acceptance(t, &Formula::ap("beta"));
    aut.create_transition("C", &["A"]);

    let mut check = EmptinessCheck::new(&aut);
    assert!(!check.check());

    // The cycle has to pass through all three states to collect both markers.
    let lasso = check.counter_example();
    let mut states: Vec<String> = lasso.cycle.iter().map(|(s, _)| aut.format_state(s)).collect();
    states.sort();
    assert_eq!(states, vec!["{A}", "{B}", "{C}"]);
}

#[test]
fn test_deterministic_counter_example() {
    // Two accepting loops; reconstruction tie-breaks on DFS indices, so the
    // result is stable across runs.
    let build = || {
        let mut aut = Taa::new(new_dict());
        aut.create_transition("A", &["B"]);
        aut.create_transition("A", &["C"]);
        let t = aut.create_transition("B", &["B"]);
        aut.add_acceptance(t, &Formula::ap("alpha"));
        let t = aut.create_transition("C", &["C"]);
        aut.add_acceptance(t, &Formula::ap("alpha"));
        aut
    };

    let aut1 = build();
    let mut check1 = EmptinessCheck::new(&aut1);
    assert!(!check1.check());
    let aut2 = build();
    let mut check2 = EmptinessCheck::new(&aut2);
    assert!(!check2.check());

    assert_eq!(
        check1.counter_example().format(&aut1),
        check2.counter_example().format(&aut2)
    );
}

#[test]
fn test_support_queries_on_the_initial_state() {
    let dict = new_dict();
    let mut aut = Taa::new(Rc::clone(&dict));
    let t = aut.create_transition("A", &["A"]);
    aut.add_label(t, &Formula::parse("p * q").unwrap());
    let t = aut.create_transition("A", &["A"]);
    aut.add_label(t, &Formula::ap("r"));

    let state = aut.initial_state();
    let labels = aut.support_labels(&state);
    let vars = aut.support_variables(&state);

    let d = dict.borrow();
    let p = d.ithvar(d.prop_map("p").unwrap());
    let q = d.ithvar(d.prop_map("q").unwrap());
    let r = d.ithvar(d.prop_map("r").unwrap());
    assert_eq!(labels, p.and(&q).or(&r));
    assert_eq!(vars, p.and(&q).and(&r));
}
