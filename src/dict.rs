//! Symbolic dictionary mapping named symbols to BDD variables
//!
//! All automata drawing their labels and acceptance values from the same
//! dictionary agree on which BDD variable encodes which proposition or
//! acceptance marker, so values produced by different automata remain
//! compositionally meaningful.
//!
//! Registrations are owned per client: a client is anything that obtained a
//! [`ClientId`] from the dictionary (typically an automaton). A variable is
//! handed back to the allocator once its last owner unregisters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::alloc::BddAllocator;
use crate::bdd::{Bdd, BddManager, VarId};

/// Opaque identity of a dictionary client
///
/// Issued by [`BddDict::new_client`]; the dictionary never stores a reference
/// back to the client, only this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

/// Which namespace a variable was registered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    Proposition,
    Acceptance,
}

#[derive(Debug)]
struct Binding {
    var: VarId,
    owners: HashSet<ClientId>,
}

/// Dictionary of named propositions and acceptance markers
///
/// Owns the variable allocator (and through it the BDD package). The
/// dictionary is shared between automata behind `Rc<RefCell<_>>`, which also
/// pins everything touching the package to a single thread.
#[derive(Debug)]
pub struct BddDict {
    alloc: BddAllocator,
    next_client: u64,
    props: HashMap<String, Binding>,
    accs: HashMap<String, Binding>,
    /// Reverse lookup for formatting, by variable index
    var_names: BTreeMap<VarId, (String, VarKind)>,
}

impl BddDict {
    pub fn new() -> Self {
        BddDict {
            alloc: BddAllocator::new(),
            next_client: 0,
            props: HashMap::new(),
            accs: HashMap::new(),
            var_names: BTreeMap::new(),
        }
    }

    /// Issue a fresh client identity
    pub fn new_client(&mut self) -> ClientId {
        let id = ClientId(self.next_client);
        self.next_client += 1;
        id
    }

    /// Register the proposition `name` on behalf of `client` and return its
    /// variable
    ///
    /// The variable is allocated on first registration; later calls only
    /// record the additional owner.
    pub fn register_proposition(&mut self, name: &str, client: ClientId) -> VarId {
        Self::register(
            &mut self.alloc,
            &mut self.var_names,
            &mut self.props,
            VarKind::Proposition,
            name,
            client,
        )
    }

    /// Register the acceptance marker `name` on behalf of `client` and return
    /// its variable
    pub fn register_acceptance_marker(&mut self, name: &str, client: ClientId) -> VarId {
        Self::register(
            &mut self.alloc,
            &mut self.var_names,
            &mut self.accs,
            VarKind::Acceptance,
            name,
            client,
        )
    }

    fn register(
        alloc: &mut BddAllocator,
        var_names: &mut BTreeMap<VarId, (String, VarKind)>,
        map: &mut HashMap<String, Binding>,
        kind: VarKind,
        name: &str,
        client: ClientId,
    ) -> VarId {
        if let Some(binding) = map.get_mut(name) {
            binding.owners.insert(client);
            return binding.var;
        }
        let var = alloc.allocate(1);
        var_names.insert(var, (name.to_string(), kind));
        let mut owners = HashSet::new();
        owners.insert(client);
        map.insert(name.to_string(), Binding { var, owners });
        var
    }

    /// Variable of the proposition `name`, if registered
    pub fn prop_map(&self, name: &str) -> Option<VarId> {
        self.props.get(name).map(|b| b.var)
    }

    /// Variable of the acceptance marker `name`, if registered
    pub fn acc_map(&self, name: &str) -> Option<VarId> {
        self.accs.get(name).map(|b| b.var)
    }

    /// Name of the symbol registered for `var`, if any
    pub fn var_name(&self, var: VarId) -> Option<&str> {
        self.var_names.get(&var).map(|(name, _)| name.as_str())
    }

    /// The registered acceptance markers, as `(name, var)` pairs in variable
    /// order
    pub fn acceptance_markers(&self) -> Vec<(&str, VarId)> {
        self.var_names
            .iter()
            .filter(|(_, (_, kind))| *kind == VarKind::Acceptance)
            .map(|(&var, (name, _))| (name.as_str(), var))
            .collect()
    }

    /// Drop every registration owned by `client`
    ///
    /// Variables whose last owner departs are released back to the allocator.
    pub fn unregister_all(&mut self, client: ClientId) {
        let alloc = &mut self.alloc;
        let var_names = &mut self.var_names;
        for map in [&mut self.props, &mut self.accs] {
            map.retain(|_, binding| {
                binding.owners.remove(&client);
                if binding.owners.is_empty() {
                    alloc.release(binding.var, 1);
                    var_names.remove(&binding.var);
                    false
                } else {
                    true
                }
            });
        }
    }

    /// Constant TRUE
    pub fn bdd_true(&self) -> Bdd {
        self.alloc.bdd_true()
    }

    /// Constant FALSE
    pub fn bdd_false(&self) -> Bdd {
        self.alloc.bdd_false()
    }

    /// Positive literal of `var`
    pub fn ithvar(&self, var: VarId) -> Bdd {
        self.alloc.ithvar(var)
    }

    /// Negative literal of `var`
    pub fn nithvar(&self, var: VarId) -> Bdd {
        self.alloc.nithvar(var)
    }

    pub(crate) fn manager(&self) -> &Arc<RwLock<BddManager>> {
        self.alloc.manager()
    }

    /// Render a label as a sum of cubes, e.g. `a * ~b + c`
    ///
    /// Unregistered variables (there should be none in a well-formed label)
    /// print as `v<index>`.
    pub fn format_condition(&self, label: &Bdd) -> String {
        if label.is_true() {
            return "1".to_string();
        }
        if label.is_false() {
            return "0".to_string();
        }
        let cubes = label.satisfying_cubes();
        let mut terms = Vec::with_capacity(cubes.len());
        for cube in cubes {
            if cube.is_empty() {
                terms.push("1".to_string());
                continue;
            }
            let literals: Vec<String> = cube
                .iter()
                .map(|(&var, &polarity)| {
                    let name = self
                        .var_name(var)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("v{}", var));
                    if polarity {
                        name
                    } else {
                        format!("~{}", name)
                    }
                })
                .collect();
            terms.push(literals.join(" * "));
        }
        terms.join(" + ")
    }

    /// Render an acceptance value as the set of markers it carries,
    /// e.g. `{alpha,beta}`
    pub fn format_acceptance(&self, acc: &Bdd) -> String {
        let mut names = Vec::new();
        for (name, var) in self.acceptance_markers() {
            if !acc.and(&self.ithvar(var)).is_false() {
                names.push(name);
            }
        }
        format!("{{{}}}", names.join(","))
    }
}

impl Default for BddDict {
    fn default() -> Self {
        Self::new()
    }
}
