//! Netlist entities: cells, nets, ports, and binding strengths.
//!
//! Cells and nets reference each other by interned name rather than by
//! pointer; the [`Context`](crate::context::Context) owns both maps, so every
//! cross-link is a `(map, Ident)` pair resolved through it. All maps that the
//! engine iterates use insertion order, which keeps placement deterministic.

use crate::ids::{BelId, PipId, WireId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_common::{Delay, Ident};

/// Who placed a binding, and therefore who may overwrite it.
///
/// A bind may only displace a binding of strictly lower strength; equal
/// strength never displaces.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Strength {
    /// No binding.
    #[default]
    None = 0,
    /// Provisional binding, freely replaceable.
    Weak = 1,
    /// Firm binding made by an optimisation pass.
    Strong = 2,
    /// Binding made by the placer.
    Placer = 3,
    /// Binding pinned by the user; nothing overrides it.
    User = 4,
}

impl Strength {
    /// Returns the checksum code of this strength.
    pub fn checksum(self) -> u32 {
        self as u32
    }
}

/// Direction of a cell port.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortType {
    /// The port consumes a signal.
    In,
    /// The port drives a signal.
    Out,
    /// Bidirectional port.
    InOut,
}

impl PortType {
    /// Returns the checksum code of this direction.
    pub fn checksum(self) -> u32 {
        match self {
            PortType::In => 0,
            PortType::Out => 1,
            PortType::InOut => 2,
        }
    }
}

/// One endpoint of a net: a port on a cell, plus the routing delay budget
/// the timing analyser has granted that endpoint.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortRef {
    /// Name of the cell, or `None` for a dangling endpoint.
    pub cell: Option<Ident>,
    /// Port name on that cell.
    pub port: Ident,
    /// Routing delay budget for this endpoint; written by the timing analyser.
    pub budget: Delay,
}

impl PortRef {
    /// An endpoint attached to nothing.
    pub fn unconnected() -> Self {
        Self {
            cell: None,
            port: Ident::NULL,
            budget: Delay::ZERO,
        }
    }

    /// An endpoint on `cell`/`port` with a zero budget.
    pub fn new(cell: Ident, port: Ident) -> Self {
        Self {
            cell: Some(cell),
            port,
            budget: Delay::ZERO,
        }
    }

    /// Returns `true` if this endpoint references `cell`/`port`.
    pub fn is(&self, cell: Ident, port: Ident) -> bool {
        self.cell == Some(cell) && self.port == port
    }
}

/// A port on a cell, seen from the cell's side.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PortInfo {
    /// Port name.
    pub name: Ident,
    /// Net attached to this port, if any.
    pub net: Option<Ident>,
    /// Direction of the port.
    pub dir: PortType,
}

/// How a wire came to carry a net: the pip driving it (or `None` when a bel
/// pin drives it directly) and the strength of the binding.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct WireAssignment {
    /// The pip whose destination is this wire, if any.
    pub pip: Option<PipId>,
    /// Binding strength.
    pub strength: Strength,
}

/// A logical signal: one driver, any number of users, and the set of wires
/// currently carrying it.
#[derive(Clone, Debug)]
pub struct NetInfo {
    /// Net name, unique within the design.
    pub name: Ident,
    /// Driving endpoint; `cell == None` means the net is undriven.
    pub driver: PortRef,
    /// Consuming endpoints, in declared order.
    pub users: Vec<PortRef>,
    /// Free-form attributes.
    pub attrs: IndexMap<Ident, String>,
    /// Parameters.
    pub params: IndexMap<Ident, String>,
    /// Wires carrying this net, with the pip (if any) driving each.
    /// Maintained by the binding store; do not edit directly.
    pub wires: IndexMap<WireId, WireAssignment>,
}

impl NetInfo {
    /// Creates an empty, undriven net.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            driver: PortRef::unconnected(),
            users: Vec::new(),
            attrs: IndexMap::new(),
            params: IndexMap::new(),
            wires: IndexMap::new(),
        }
    }

    /// Returns `true` when the net has a driving cell.
    pub fn is_driven(&self) -> bool {
        self.driver.cell.is_some()
    }
}

/// An instance in the netlist: a typed cell with ports, attributes, and an
/// optional bel binding.
#[derive(Clone, Debug)]
pub struct CellInfo {
    /// Cell name, unique within the design.
    pub name: Ident,
    /// Cell type, matched against bel types during placement.
    pub cell_type: Ident,
    /// Ports by name, in declared order.
    pub ports: IndexMap<Ident, PortInfo>,
    /// Free-form attributes. The placer back-annotates `BEL` here.
    pub attrs: IndexMap<Ident, String>,
    /// Parameters.
    pub params: IndexMap<Ident, String>,
    /// The bel this cell is placed on, if any.
    /// Maintained by the binding store; do not edit directly.
    pub bel: Option<BelId>,
    /// Strength of the bel binding.
    pub bel_strength: Strength,
    /// Optional remap of logical port names to physical bel pin names.
    pub pins: IndexMap<Ident, Ident>,
}

impl CellInfo {
    /// Creates an unplaced cell with no ports.
    pub fn new(name: Ident, cell_type: Ident) -> Self {
        Self {
            name,
            cell_type,
            ports: IndexMap::new(),
            attrs: IndexMap::new(),
            params: IndexMap::new(),
            bel: None,
            bel_strength: Strength::None,
            pins: IndexMap::new(),
        }
    }

    /// Resolves a logical port name to the physical bel pin it maps to.
    pub fn pin_for_port(&self, port: Ident) -> Ident {
        self.pins.get(&port).copied().unwrap_or(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::Interner;

    #[test]
    fn strength_is_totally_ordered() {
        assert!(Strength::None < Strength::Weak);
        assert!(Strength::Weak < Strength::Strong);
        assert!(Strength::Strong < Strength::Placer);
        assert!(Strength::Placer < Strength::User);
    }

    #[test]
    fn strength_checksum_codes() {
        assert_eq!(Strength::None.checksum(), 0);
        assert_eq!(Strength::User.checksum(), 4);
    }

    #[test]
    fn port_type_checksum_codes() {
        assert_eq!(PortType::In.checksum(), 0);
        assert_eq!(PortType::Out.checksum(), 1);
        assert_eq!(PortType::InOut.checksum(), 2);
    }

    #[test]
    fn unconnected_port_ref() {
        let pr = PortRef::unconnected();
        assert!(pr.cell.is_none());
        assert!(pr.port.is_null());
        assert_eq!(pr.budget, Delay::ZERO);
    }

    #[test]
    fn port_ref_identity() {
        let interner = Interner::new();
        let cell = interner.get_or_intern("ff0");
        let d = interner.get_or_intern("D");
        let q = interner.get_or_intern("Q");
        let pr = PortRef::new(cell, d);
        assert!(pr.is(cell, d));
        assert!(!pr.is(cell, q));
    }

    #[test]
    fn new_net_is_undriven() {
        let interner = Interner::new();
        let net = NetInfo::new(interner.get_or_intern("n0"));
        assert!(!net.is_driven());
        assert!(net.users.is_empty());
        assert!(net.wires.is_empty());
    }

    #[test]
    fn new_cell_is_unplaced() {
        let interner = Interner::new();
        let cell = CellInfo::new(interner.get_or_intern("lut0"), interner.get_or_intern("LUT"));
        assert!(cell.bel.is_none());
        assert_eq!(cell.bel_strength, Strength::None);
    }

    #[test]
    fn pin_remap_falls_back_to_port_name() {
        let interner = Interner::new();
        let mut cell =
            CellInfo::new(interner.get_or_intern("ff0"), interner.get_or_intern("FF"));
        let d = interner.get_or_intern("D");
        let din = interner.get_or_intern("DIN");
        let clk = interner.get_or_intern("CLK");
        cell.pins.insert(d, din);
        assert_eq!(cell.pin_for_port(d), din);
        assert_eq!(cell.pin_for_port(clk), clk);
    }
}
