//! Text dump of the reachable graph, and its reader
//!
//! The dumper emits one record per reachable transition:
//!
//! ```text
//! "source", "destination", label, {markers};
//! ```
//!
//! enumerated depth-first from the initial state with duplicates omitted.
//! Labels are sums of cubes over the registered proposition names, markers
//! are listed by their dictionary names, so a dump can be read back with
//! [`load_reachable`] into an automaton bisimilar to the dumped one under
//! state renaming: every dumped state becomes a location of the result.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::automaton::{carried_acceptance, Automaton, SuccIterator};
use crate::dict::BddDict;
use crate::formula::{self, Formula, ParseFormulaError};
use crate::taa::Taa;

/// One parsed dump record, before grounding in a dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub src: String,
    pub dst: String,
    pub label: Formula,
    pub acc: Vec<String>,
}

/// Write one record per reachable transition of `aut` to `out`
pub fn save_reachable<A: Automaton, W: Write>(aut: &A, out: &mut W) -> io::Result<()> {
    let dict = aut.dict();
    let all_acc = aut.all_acceptance_conditions();
    let init = aut.initial_state();
    let mut seen = HashSet::new();
    seen.insert(init.clone());
    let mut stack = vec![init];

    while let Some(state) = stack.pop() {
        let cur = aut.format_state(&state);
        let mut iter = aut.successors(&state);
        iter.first();
        while !iter.done() {
            let dst = iter.current_state();
            let carried = carried_acceptance(&iter.current_acceptance(), &all_acc);
            {
                let dict = dict.borrow();
                writeln!(
                    out,
                    "\"{}\", \"{}\", {}, {};",
                    cur,
                    aut.format_state(&dst),
                    dict.format_condition(&iter.current_label()),
                    dict.format_acceptance(&carried),
                )?;
            }
            if seen.insert(dst.clone()) {
                stack.push(dst);
            }
            iter.advance();
        }
    }
    Ok(())
}

/// Read a dump produced by [`save_reachable`] back into an automaton
///
/// Every dumped state becomes a location of the result; the source of the
/// first record (the dumped initial state) becomes the initial location.
pub fn load_reachable(dict: Rc<RefCell<BddDict>>, input: &str) -> Result<Taa, LoadError> {
    let records = formula::parse_dump(input).map_err(LoadError::Parse)?;
    let mut aut = Taa::new(dict);
    for record in records {
        let t = aut.create_transition(&record.src, &[record.dst.as_str()]);
        aut.add_label(t, &record.label);
        for marker in &record.acc {
            aut.add_acceptance(t, &Formula::ap(marker));
        }
    }
    Ok(aut)
}

/// Errors raised when reading a dump fails
#[derive(Debug)]
pub enum LoadError {
    /// The dump text does not parse
    Parse(ParseFormulaError),
    /// The dump could not be read
    Io(io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Parse(e) => write!(f, "{}", e),
            LoadError::Io(e) => write!(f, "Failed to read dump: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Parse(e) => Some(e),
            LoadError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<LoadError> for io::Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Parse(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            LoadError::Io(e) => e,
        }
    }
}
