//! # omega-check
//!
//! A symbolic omega-automata kernel for LTL model checking: Büchi-style
//! automata whose transition labels and acceptance conditions live in a
//! shared BDD algebra, together with an on-the-fly language-emptiness check
//! that produces an accepted lasso (prefix plus accepting cycle) as a
//! counter-example.
//!
//! ## Overview
//!
//! The crate is built from three tightly coupled pieces:
//!
//! - **The symbolic namespace** - [`BddAllocator`] hands out contiguous
//!   ranges of BDD variables from the underlying package, growing it only
//!   when the free list runs dry; [`BddDict`] maps named propositions and
//!   acceptance markers onto those variables and reference-counts them per
//!   client, so labels built by different automata stay compositionally
//!   meaningful.
//! - **Transition-based Alternating Automata** - [`Taa`] interns named
//!   locations; its observable states are *sets* of locations, and the
//!   successors of a state are joint expansions of one transition choice per
//!   member, with condition conjunction, acceptance disjunction, and
//!   on-the-fly merging of transitions that subsume each other.
//! - **The emptiness check** - [`EmptinessCheck`] runs Couvreur's algorithm
//!   (FM'99) over the abstract [`Automaton`] contract: a single depth-first
//!   search maintaining a stack of candidate SCC roots with accumulated
//!   acceptance, stopping as soon as an accepting SCC closes.
//!
//! ## Example
//!
//! Build a two-location automaton, check its language, and print the
//! accepted lasso:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use omega_check::{BddDict, EmptinessCheck, Formula, Taa};
//!
//! let dict = Rc::new(RefCell::new(BddDict::new()));
//! let mut aut = Taa::new(Rc::clone(&dict));
//!
//! let t = aut.create_transition("A", &["B"]);
//! aut.add_label(t, &Formula::ap("p"));
//! let t = aut.create_transition("B", &["B"]);
//! aut.add_label(t, &Formula::parse("~p").unwrap());
//! aut.add_acceptance(t, &Formula::ap("alpha"));
//!
//! let mut check = EmptinessCheck::new(&aut);
//! assert!(!check.check()); // the language is not empty
//!
//! let lasso = check.counter_example();
//! println!("{}", lasso.format(&aut));
//! ```
//!
//! ## Sharing the variable namespace
//!
//! Every automaton participating in a product must draw its variables from
//! the same [`BddDict`]; the dictionary is shared behind `Rc<RefCell<_>>`
//! and issues an opaque client identity per automaton. The handle is
//! deliberately not `Send`: the BDD package beneath it assumes exclusive,
//! single-threaded access.

pub mod alloc;
pub mod automaton;
pub mod bdd;
pub mod dict;
pub mod emptiness;
pub mod formula;
pub mod save;
pub mod taa;

pub use alloc::BddAllocator;
pub use automaton::{carried_acceptance, Automaton, AutomatonState, SuccIterator};
pub use bdd::{Bdd, VarId};
pub use dict::{BddDict, ClientId};
pub use emptiness::{CounterExample, EmptinessCheck};
pub use formula::{Formula, ParseFormulaError};
pub use save::{load_reachable, save_reachable, LoadError, RawRecord};
pub use taa::{StateSet, Taa, TaaSuccIterator, TransitionRef};
