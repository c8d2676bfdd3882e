//! Tests for the bdd module

use super::*;

fn manager(varnum: usize) -> Arc<RwLock<BddManager>> {
    Arc::new(RwLock::new(BddManager::new(varnum)))
}

#[test]
fn test_terminal_nodes() {
    let mgr = manager(2);
    let t = Bdd::constant(&mgr, true);
    let f = Bdd::constant(&mgr, false);

    assert!(t.is_true());
    assert!(!t.is_false());
    assert!(f.is_false());
    assert!(!f.is_true());
    assert!(t.is_terminal());
    assert!(f.is_terminal());
}

#[test]
fn test_literals() {
    let mgr = manager(2);
    let a = Bdd::ithvar(&mgr, 0);
    let na = Bdd::nithvar(&mgr, 0);

    assert!(!a.is_terminal());
    assert_ne!(a, na);
    assert_eq!(a.not(), na);
    assert!(a.and(&na).is_false());
    assert!(a.or(&na).is_true());
}

#[test]
fn test_hash_consing() {
    let mgr = manager(2);
    let a1 = Bdd::ithvar(&mgr, 0);
    let a2 = Bdd::ithvar(&mgr, 0);

    // Same variable should produce same node (hash consing)
    assert_eq!(a1, a2);

    // Equivalent functions share a root as well
    let b = Bdd::ithvar(&mgr, 1);
    assert_eq!(a1.and(&b), b.and(&a1));
}

#[test]
fn test_and_or_identities() {
    let mgr = manager(2);
    let t = Bdd::constant(&mgr, true);
    let f = Bdd::constant(&mgr, false);
    let a = Bdd::ithvar(&mgr, 0);

    assert_eq!(a.and(&t), a);
    assert!(a.and(&f).is_false());
    assert_eq!(a.or(&f), a);
    assert!(a.or(&t).is_true());
    assert_eq!(a.and(&a), a);
    assert_eq!(a.or(&a), a);
}

#[test]
fn test_diff() {
    let mgr = manager(2);
    let a = Bdd::ithvar(&mgr, 0);
    let b = Bdd::ithvar(&mgr, 1);

    assert_eq!(a.diff(&b), a.and(&b.not()));
    assert!(a.diff(&a).is_false());

    let t = Bdd::constant(&mgr, true);
    assert_eq!(t.diff(&a), a.not());
}

#[test]
fn test_operator_overloads() {
    let mgr = manager(2);
    let a = Bdd::ithvar(&mgr, 0);
    let b = Bdd::ithvar(&mgr, 1);

    assert_eq!(&a & &b, a.and(&b));
    assert_eq!(&a | &b, a.or(&b));
    assert_eq!(&a - &b, a.diff(&b));
    assert_eq!(!&a, a.not());

    let mut acc = Bdd::constant(&mgr, true);
    acc &= &a;
    acc &= &b;
    assert_eq!(acc, a.and(&b));

    let mut any = Bdd::constant(&mgr, false);
    any |= &a;
    any |= &b;
    assert_eq!(any, a.or(&b));
}

#[test]
fn test_exists() {
    let mgr = manager(3);
    let a = Bdd::ithvar(&mgr, 0);
    let b = Bdd::ithvar(&mgr, 1);

    // exists a. (a * b) == b
    assert_eq!(a.and(&b).exists(0), b);
    // exists b. (a * b) == a
    assert_eq!(a.and(&b).exists(1), a);
    // exists a. (a + b) == true
    assert!(a.or(&b).exists(0).is_true());
    // projecting a variable that does not occur is the identity
    assert_eq!(a.and(&b).exists(2), a.and(&b));
}

#[test]
fn test_support() {
    let mgr = manager(3);
    let a = Bdd::ithvar(&mgr, 0);
    let c = Bdd::ithvar(&mgr, 2);

    let f = a.and(&c.not());
    assert_eq!(f.support_vars(), vec![0, 2]);
    assert_eq!(f.support(), a.and(&c));

    let t = Bdd::constant(&mgr, true);
    assert!(t.support_vars().is_empty());
    assert!(t.support().is_true());
}

#[test]
fn test_satisfying_cubes() {
    let mgr = manager(2);
    let a = Bdd::ithvar(&mgr, 0);
    let b = Bdd::ithvar(&mgr, 1);

    let cubes = a.and(&b.not()).satisfying_cubes();
    assert_eq!(cubes.len(), 1);
    assert_eq!(cubes[0].get(&0), Some(&true));
    assert_eq!(cubes[0].get(&1), Some(&false));

    assert_eq!(Bdd::constant(&mgr, true).satisfying_cubes().len(), 1);
    assert!(Bdd::constant(&mgr, true).satisfying_cubes()[0].is_empty());
    assert!(Bdd::constant(&mgr, false).satisfying_cubes().is_empty());
}

#[test]
fn test_varnum_growth() {
    let mgr = manager(1);
    assert_eq!(mgr.read().unwrap().varnum(), 1);

    mgr.write().unwrap().ext_varnum(3);
    assert_eq!(mgr.read().unwrap().varnum(), 4);

    mgr.write().unwrap().set_varnum(6);
    assert_eq!(mgr.read().unwrap().varnum(), 6);

    // Variables declared by growth are usable
    let v = Bdd::ithvar(&mgr, 5);
    assert!(!v.is_terminal());
}

#[test]
#[should_panic(expected = "never shrinks")]
fn test_varnum_never_shrinks() {
    let mgr = manager(4);
    mgr.write().unwrap().set_varnum(2);
}

#[test]
fn test_node_count() {
    let mgr = manager(2);
    let t = Bdd::constant(&mgr, true);
    assert_eq!(t.node_count(), 1);

    let a = Bdd::ithvar(&mgr, 0);
    // Variable node: 1 decision node + 2 terminal nodes
    assert_eq!(a.node_count(), 3);
}
