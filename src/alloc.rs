//! Free-list allocator for BDD variable indices
//!
//! Symbolic dictionaries hand out BDD variables for propositions and
//! acceptance markers, and take them back when the last client unregisters.
//! The allocator keeps the released indices in an ordered free list so they
//! can be reused before the variable count of the package has to grow.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::bdd::{Bdd, BddManager, VarId};

/// Number of variables declared when a fresh package is initialised.
/// They start out on the free list like any released range.
const INITIAL_VARNUM: usize = 2;

/// A contiguous range of free variable indices `[base, base + len)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VarRange {
    base: usize,
    len: usize,
}

/// Allocator of contiguous variable ranges backed by one BDD package
///
/// The allocator owns the package it allocates from and is the only component
/// allowed to grow its variable count. The free list is kept sorted by base,
/// with no two entries overlapping or adjacent.
///
/// Allocation is best-fit: the smallest range that can hold the request wins,
/// ties going to the lowest base. This keeps fragmentation down when clients
/// register and unregister symbols of different widths.
#[derive(Debug)]
pub struct BddAllocator {
    manager: Arc<RwLock<BddManager>>,
    free_list: Vec<VarRange>,
}

impl BddAllocator {
    /// Initialise a fresh BDD package and place its initial variables on the
    /// free list
    pub fn new() -> Self {
        BddAllocator {
            manager: Arc::new(RwLock::new(BddManager::new(INITIAL_VARNUM))),
            free_list: vec![VarRange {
                base: 0,
                len: INITIAL_VARNUM,
            }],
        }
    }

    /// Current variable count of the underlying package
    pub fn varnum(&self) -> usize {
        self.manager.read().unwrap().varnum()
    }

    pub(crate) fn manager(&self) -> &Arc<RwLock<BddManager>> {
        &self.manager
    }

    /// Reserve `n` consecutive variables and return the first index
    ///
    /// Browses the free list for the smallest range of at least `n`
    /// variables. When nothing fits, the package grows: if the last free
    /// range touches the end of the variable space only the difference is
    /// declared and that range is absorbed into the allocation.
    pub fn allocate(&mut self, n: usize) -> VarId {
        assert!(n >= 1, "cannot allocate an empty variable range");

        let mut best: Option<usize> = None;
        for (i, range) in self.free_list.iter().enumerate() {
            if range.len < n {
                continue;
            }
            if range.len == n {
                best = Some(i);
                break;
            }
            if best.map_or(true, |b| range.len < self.free_list[b].len) {
                best = Some(i);
            }
        }

        if let Some(i) = best {
            let base = self.free_list[i].base;
            if self.free_list[i].len == n {
                self.free_list.remove(i);
            } else {
                // Trim from the low end so the remainder stays in place.
                self.free_list[i].base += n;
                self.free_list[i].len -= n;
            }
            return base;
        }

        // Not enough adjacent free variables; grow the package.
        let mut mgr = self.manager.write().unwrap();
        let varnum = mgr.varnum();
        if let Some(&last) = self.free_list.last() {
            if last.base + last.len == varnum {
                // The tail range is absorbed into the new allocation.
                debug!(need = n - last.len, varnum, "growing variable space");
                mgr.ext_varnum(n - last.len);
                self.free_list.pop();
                return last.base;
            }
        }
        debug!(need = n, varnum, "growing variable space");
        mgr.ext_varnum(n);
        varnum
    }

    /// Return the range `[base, base + n)` to the free list
    ///
    /// The range is coalesced with its neighbours where they touch.
    /// Releasing variables that overlap a range already on the free list is a
    /// contract violation.
    pub fn release(&mut self, base: VarId, n: usize) {
        let end = base + n;
        debug_assert!(
            end <= self.manager.read().unwrap().varnum(),
            "released range [{}, {}) was never allocated",
            base,
            end
        );
        debug_assert!(
            self.free_list
                .iter()
                .all(|r| end <= r.base || r.base + r.len <= base),
            "released range [{}, {}) overlaps the free list",
            base,
            end
        );

        for i in 0..self.free_list.len() {
            // Append to a range ...
            if self.free_list[i].base + self.free_list[i].len == base {
                self.free_list[i].len += n;
                // Maybe the next item on the list can be merged.
                if i + 1 < self.free_list.len() && self.free_list[i + 1].base == end {
                    self.free_list[i].len += self.free_list[i + 1].len;
                    self.free_list.remove(i + 1);
                }
                return;
            }
            // ... or prepend to a range ...
            if self.free_list[i].base == end {
                self.free_list[i].base = base;
                self.free_list[i].len += n;
                return;
            }
            // ... or insert a new range.
            if self.free_list[i].base > end {
                self.free_list.insert(i, VarRange { base, len: n });
                return;
            }
        }
        self.free_list.push(VarRange { base, len: n });
    }

    /// Constant TRUE of the underlying package
    pub fn bdd_true(&self) -> Bdd {
        Bdd::constant(&self.manager, true)
    }

    /// Constant FALSE of the underlying package
    pub fn bdd_false(&self) -> Bdd {
        Bdd::constant(&self.manager, false)
    }

    /// Positive literal of `var`
    pub fn ithvar(&self, var: VarId) -> Bdd {
        Bdd::ithvar(&self.manager, var)
    }

    /// Negative literal of `var`
    pub fn nithvar(&self, var: VarId) -> Bdd {
        Bdd::nithvar(&self.manager, var)
    }
}

impl Default for BddAllocator {
    fn default() -> Self {
        Self::new()
    }
}
