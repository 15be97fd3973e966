//! The design context: sole owner of the netlist, interner, binding store,
//! and device catalog.
//!
//! Cells and nets cross-reference each other cyclically, so neither side
//! holds pointers: every link is an interned name resolved through the
//! context's maps. The three resource bindings (bel↔cell, wire↔net,
//! pip↔net) each have two sides — the store's map and a field on the bound
//! entity — and the `bind_*`/`unbind_*` methods are the only way to move
//! them, keeping both sides synchronised.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::ids::{BelId, PipId, WireId};
use crate::netlist::{CellInfo, NetInfo, PortInfo, PortRef, PortType, Strength, WireAssignment};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use weft_common::{Delay, Frequency, Ident, Interner};

/// The state of one place-and-route invocation.
pub struct Context {
    /// The design's string table.
    pub interner: Interner,
    /// Cells by name, in creation order.
    pub cells: IndexMap<Ident, CellInfo>,
    /// Nets by name, in creation order.
    pub nets: IndexMap<Ident, NetInfo>,
    /// Emit per-cell progress while placing.
    pub verbose: bool,
    /// Downgrade recoverable placement errors to warnings.
    pub force: bool,
    /// Target clock frequency; `None` optimises for maximum frequency.
    pub target_freq: Option<Frequency>,

    pub(crate) catalog: Box<dyn Catalog>,
    seed: u64,
    rng: StdRng,
    pub(crate) bound_bels: HashMap<BelId, (Ident, Strength)>,
    pub(crate) bound_wires: HashMap<WireId, (Ident, Strength)>,
    pub(crate) bound_pips: HashMap<PipId, (Ident, Strength)>,
}

impl Context {
    /// Creates a context for one design against one device catalog.
    pub fn new(interner: Interner, catalog: Box<dyn Catalog>, seed: u64) -> Self {
        Self {
            interner,
            cells: IndexMap::new(),
            nets: IndexMap::new(),
            verbose: false,
            force: false,
            target_freq: None,
            catalog,
            seed,
            rng: StdRng::seed_from_u64(seed),
            bound_bels: HashMap::new(),
            bound_wires: HashMap::new(),
            bound_pips: HashMap::new(),
        }
    }

    /// The device catalog this design targets.
    pub fn catalog(&self) -> &dyn Catalog {
        &*self.catalog
    }

    /// The seed this context's PRNG was initialised with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The context PRNG, the only sanctioned source of randomness.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Interns a string.
    pub fn id(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    /// Resolves an identifier back to its string.
    pub fn name(&self, id: Ident) -> &str {
        self.interner.resolve(id)
    }

    // --- Netlist construction ---

    /// Creates an empty cell. Panics if the name is taken.
    pub fn create_cell(&mut self, name: &str, cell_type: &str) -> Ident {
        let name = self.id(name);
        let ty = self.id(cell_type);
        let prev = self.cells.insert(name, CellInfo::new(name, ty));
        assert!(prev.is_none(), "cell name reused");
        name
    }

    /// Creates an empty, undriven net. Panics if the name is taken.
    pub fn create_net(&mut self, name: &str) -> Ident {
        let name = self.id(name);
        let prev = self.nets.insert(name, NetInfo::new(name));
        assert!(prev.is_none(), "net name reused");
        name
    }

    /// Adds a port to a cell.
    pub fn add_port(&mut self, cell: Ident, port: &str, dir: PortType) -> Ident {
        let port = self.id(port);
        let info = PortInfo {
            name: port,
            net: None,
            dir,
        };
        let prev = self.cells[&cell].ports.insert(port, info);
        assert!(prev.is_none(), "port name reused on cell");
        port
    }

    /// Connects a cell port to a net, registering the endpoint as the net's
    /// driver (output ports) or as a user (input ports).
    pub fn connect_port(&mut self, net: Ident, cell: Ident, port: Ident) {
        let dir = {
            let info = &mut self.cells[&cell].ports[&port];
            assert!(info.net.is_none(), "port is already connected");
            info.net = Some(net);
            info.dir
        };
        let ni = &mut self.nets[&net];
        match dir {
            PortType::Out => {
                assert!(!ni.is_driven(), "net already has a driver");
                ni.driver = PortRef::new(cell, port);
            }
            PortType::In | PortType::InOut => ni.users.push(PortRef::new(cell, port)),
        }
    }

    /// Disconnects a cell port from its net, removing the matching driver or
    /// user entry.
    pub fn disconnect_port(&mut self, cell: Ident, port: Ident) {
        let net = {
            let info = &mut self.cells[&cell].ports[&port];
            info.net.take()
        };
        if let Some(net) = net {
            let ni = &mut self.nets[&net];
            if ni.driver.is(cell, port) {
                ni.driver = PortRef::unconnected();
            }
            ni.users.retain(|u| !u.is(cell, port));
        }
    }

    // --- Binding store: bels ---

    /// The cell bound to a bel, if any.
    pub fn bound_bel_cell(&self, bel: BelId) -> Option<Ident> {
        self.bound_bels.get(&bel).map(|&(cell, _)| cell)
    }

    /// Binds a cell to a bel. A binding of strictly lower strength is
    /// evicted; equal or greater strength fails with `AlreadyBound`.
    pub fn bind_bel(&mut self, bel: BelId, cell: Ident, strength: Strength) -> Result<()> {
        if let Some(&(_, old_strength)) = self.bound_bels.get(&bel) {
            if old_strength >= strength {
                return Err(Error::AlreadyBound {
                    resource: format!("bel '{}'", self.name(self.catalog.bel_name(bel))),
                });
            }
        }
        if self.cells[&cell].bel.is_some() {
            return Err(Error::AlreadyBound {
                resource: format!("cell '{}'", self.name(cell)),
            });
        }
        if let Some((old_cell, _)) = self.bound_bels.remove(&bel) {
            let old = &mut self.cells[&old_cell];
            old.bel = None;
            old.bel_strength = Strength::None;
        }
        self.bound_bels.insert(bel, (cell, strength));
        let ci = &mut self.cells[&cell];
        ci.bel = Some(bel);
        ci.bel_strength = strength;
        Ok(())
    }

    /// Releases a bel, clearing the bound cell's placement.
    pub fn unbind_bel(&mut self, bel: BelId) -> Result<()> {
        match self.bound_bels.remove(&bel) {
            Some((cell, _)) => {
                let ci = &mut self.cells[&cell];
                ci.bel = None;
                ci.bel_strength = Strength::None;
                Ok(())
            }
            None => Err(Error::NotBound {
                resource: format!("bel '{}'", self.name(self.catalog.bel_name(bel))),
            }),
        }
    }

    /// Whether a bel is free: unbound, and no bound resource excludes it.
    pub fn check_bel_avail(&self, bel: BelId) -> bool {
        if self.bound_bels.contains_key(&bel) {
            return false;
        }
        self.catalog
            .excluded_bels(bel)
            .iter()
            .all(|b| !self.bound_bels.contains_key(b))
    }

    /// If unbinding exactly one cell would free `bel`, returns that cell.
    pub fn conflicting_bel_cell(&self, bel: BelId) -> Option<Ident> {
        if let Some(&(cell, _)) = self.bound_bels.get(&bel) {
            return Some(cell);
        }
        let mut blocker = None;
        for b in self.catalog.excluded_bels(bel) {
            if let Some(&(cell, _)) = self.bound_bels.get(&b) {
                match blocker {
                    None => blocker = Some(cell),
                    Some(c) if c == cell => {}
                    Some(_) => return None,
                }
            }
        }
        blocker
    }

    // --- Binding store: wires and pips ---

    /// The net bound to a wire, if any.
    pub fn bound_wire_net(&self, wire: WireId) -> Option<Ident> {
        self.bound_wires.get(&wire).map(|&(net, _)| net)
    }

    /// The net bound to a pip, if any.
    pub fn bound_pip_net(&self, pip: PipId) -> Option<Ident> {
        self.bound_pips.get(&pip).map(|&(net, _)| net)
    }

    /// Binds a wire to a net as a bel-pin-driven root wire.
    pub fn bind_wire(&mut self, wire: WireId, net: Ident, strength: Strength) -> Result<()> {
        self.claim_wire(wire, net, strength)?;
        self.nets[&net]
            .wires
            .insert(wire, WireAssignment { pip: None, strength });
        Ok(())
    }

    /// Binds a pip to a net, recording the pip as the driver of its
    /// destination wire.
    pub fn bind_pip(&mut self, pip: PipId, net: Ident, strength: Strength) -> Result<()> {
        if let Some(&(_, old_strength)) = self.bound_pips.get(&pip) {
            if old_strength >= strength {
                return Err(Error::AlreadyBound {
                    resource: self.describe_pip(pip),
                });
            }
            self.unbind_pip(pip)?;
        }
        let dst = self.catalog.pip_dst(pip);
        self.claim_wire(dst, net, strength)?;
        self.bound_pips.insert(pip, (net, strength));
        self.nets[&net].wires.insert(
            dst,
            WireAssignment {
                pip: Some(pip),
                strength,
            },
        );
        Ok(())
    }

    /// Releases a wire from its net. If a pip was recorded as the wire's
    /// driver, the pip is released with it.
    pub fn unbind_wire(&mut self, wire: WireId) -> Result<()> {
        let Some((net, _)) = self.bound_wires.remove(&wire) else {
            return Err(Error::NotBound {
                resource: format!("wire '{}'", self.name(self.catalog.wire_name(wire))),
            });
        };
        if let Some(assign) = self.nets[&net].wires.swap_remove(&wire) {
            if let Some(pip) = assign.pip {
                self.bound_pips.remove(&pip);
            }
        }
        Ok(())
    }

    /// Releases a pip and the destination wire it was driving.
    pub fn unbind_pip(&mut self, pip: PipId) -> Result<()> {
        if !self.bound_pips.contains_key(&pip) {
            return Err(Error::NotBound {
                resource: self.describe_pip(pip),
            });
        }
        self.unbind_wire(self.catalog.pip_dst(pip))
    }

    /// Whether a wire is free.
    pub fn check_wire_avail(&self, wire: WireId) -> bool {
        !self.bound_wires.contains_key(&wire)
    }

    /// Whether a pip is free. A pip whose destination wire is taken is not
    /// available even when the pip itself is unbound.
    pub fn check_pip_avail(&self, pip: PipId) -> bool {
        !self.bound_pips.contains_key(&pip) && self.check_wire_avail(self.catalog.pip_dst(pip))
    }

    fn claim_wire(&mut self, wire: WireId, net: Ident, strength: Strength) -> Result<()> {
        if let Some(&(_, old_strength)) = self.bound_wires.get(&wire) {
            if old_strength >= strength {
                return Err(Error::AlreadyBound {
                    resource: format!("wire '{}'", self.name(self.catalog.wire_name(wire))),
                });
            }
            self.unbind_wire(wire)?;
        }
        self.bound_wires.insert(wire, (net, strength));
        Ok(())
    }

    fn describe_pip(&self, pip: PipId) -> String {
        let src = self.catalog.pip_src(pip);
        let dst = self.catalog.pip_dst(pip);
        format!(
            "pip '{}' -> '{}'",
            self.name(self.catalog.wire_name(src)),
            self.name(self.catalog.wire_name(dst))
        )
    }

    // --- Net geometry and timing helpers ---

    /// The wire driven by a net's source bel pin, honouring the driving
    /// cell's logical-to-physical pin remap.
    pub fn net_source_wire(&self, net: &NetInfo) -> Option<WireId> {
        let cell = self.cells.get(&net.driver.cell?)?;
        let bel = cell.bel?;
        let pin = cell.pin_for_port(net.driver.port);
        self.catalog.bel_pin_wire(bel, pin)
    }

    /// The wire feeding one sink of a net.
    pub fn net_sink_wire(&self, net: &NetInfo, user: &PortRef) -> Option<WireId> {
        let cell = self.cells.get(&user.cell?)?;
        let bel = cell.bel?;
        let pin = cell.pin_for_port(user.port);
        self.catalog.bel_pin_wire(bel, pin)
    }

    /// The routed delay from a net's source to one sink, walking the bound
    /// pips backwards from the sink. Falls back to the catalog's prediction
    /// when no complete bound path exists.
    pub fn net_route_delay(&self, net: &NetInfo, user: &PortRef) -> Delay {
        let Some(src) = self.net_source_wire(net) else {
            return Delay::ZERO;
        };
        let Some(dst) = self.net_sink_wire(net, user) else {
            return self.catalog.predict_delay(self, net, user);
        };

        let mut cursor = dst;
        let mut delay = Delay::ZERO;
        while cursor != src {
            let Some(assign) = net.wires.get(&cursor) else {
                break;
            };
            let Some(pip) = assign.pip else { break };
            delay += self.catalog.pip_delay(pip).max_delay();
            delay += self.catalog.wire_delay(cursor).max_delay();
            cursor = self.catalog.pip_src(pip);
        }

        if cursor == src {
            delay + self.catalog.wire_delay(src).max_delay()
        } else {
            self.catalog.predict_delay(self, net, user)
        }
    }
}
