//! The device catalog interface.
//!
//! A [`Catalog`] describes one target chip: its bels, routing wires, pips,
//! group structure, and delay model. The engine holds exactly one catalog per
//! design context, fixed for the context's lifetime; all catalog methods are
//! pure with respect to catalog state, and anything that depends on current
//! bindings receives the [`Context`] to consult.

pub mod grid;

pub use grid::GridChip;

use crate::context::Context;
use crate::ids::{BelId, DecalId, GroupId, PipId, WireId};
use crate::netlist::{CellInfo, NetInfo, PortRef};
use weft_common::{Delay, DelayInfo, Ident};

/// The physical (x, y, z) location of a bel: tile coordinates plus the
/// bel's index within its tile.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BelLocation {
    /// Tile column.
    pub x: u32,
    /// Tile row.
    pub y: u32,
    /// Index within the tile.
    pub z: u32,
}

/// A catalog of the programmable resources on one device.
///
/// Required methods cover identification, bels, and the routing graph; the
/// defaulted methods are optional capabilities (grouping, decals, placement
/// design rules) that simple devices can leave alone.
pub trait Catalog {
    /// Canonical family name (e.g. `"grid"`).
    fn family(&self) -> &str;

    /// Device name within the family.
    fn device(&self) -> &str;

    // --- Bels ---

    /// All bels, in declaration order. The placer's type cursor walks this
    /// sequence, so the order must be stable for the catalog's lifetime.
    fn bels(&self) -> &[BelId];

    /// The bels in the tile at `(x, y)`.
    fn bels_by_tile(&self, x: u32, y: u32) -> Vec<BelId>;

    /// The type of a bel, as an interned type name.
    fn bel_type(&self, bel: BelId) -> Ident;

    /// Whether any bel of the given type exists on this device.
    fn has_bel_type(&self, ty: Ident) -> bool;

    /// The full hierarchical name of a bel (e.g. `"X3Y7/LUT_A"`).
    fn bel_name(&self, bel: BelId) -> Ident;

    /// Looks a bel up by its full name.
    fn bel_by_name(&self, name: Ident) -> Option<BelId>;

    /// The physical location of a bel.
    fn bel_location(&self, bel: BelId) -> BelLocation;

    /// The pin names of a bel.
    fn bel_pins(&self, bel: BelId) -> Vec<Ident>;

    /// The wire a bel pin connects to.
    fn bel_pin_wire(&self, bel: BelId, pin: Ident) -> Option<WireId>;

    /// Whether the bel is a global buffer (drives a dedicated clock network).
    fn bel_global_buf(&self, _bel: BelId) -> bool {
        false
    }

    /// The floating-point centre of a bel, for wirelength estimation.
    fn estimate_position(&self, bel: BelId) -> (f32, f32);

    /// Bels that cannot be used while `bel` is bound (stacked or overlapping
    /// resources). The default device has no exclusions.
    fn excluded_bels(&self, _bel: BelId) -> Vec<BelId> {
        Vec::new()
    }

    // --- Routing graph ---

    /// All wires, in declaration order.
    fn wires(&self) -> &[WireId];

    /// The name of a wire.
    fn wire_name(&self, wire: WireId) -> Ident;

    /// All pips, in declaration order.
    fn pips(&self) -> &[PipId];

    /// The wire a pip is driven from.
    fn pip_src(&self, pip: PipId) -> WireId;

    /// The wire a pip drives.
    fn pip_dst(&self, pip: PipId) -> WireId;

    /// Pips whose destination is `wire`.
    fn pips_uphill(&self, wire: WireId) -> Vec<PipId>;

    /// Pips whose source is `wire`.
    fn pips_downhill(&self, wire: WireId) -> Vec<PipId>;

    // --- Delay model ---

    /// Propagation delay along a wire.
    fn wire_delay(&self, wire: WireId) -> DelayInfo;

    /// Propagation delay through a pip.
    fn pip_delay(&self, pip: PipId) -> DelayInfo;

    /// A low upper bound on the routed delay between two wires on an
    /// otherwise unused chip.
    fn estimate_delay(&self, src: WireId, dst: WireId) -> Delay;

    /// Predicted routed delay for one sink of a net, used before and during
    /// routing when no bound path exists yet.
    fn predict_delay(&self, ctx: &Context, net: &NetInfo, sink: &PortRef) -> Delay;

    /// The tolerance below which two delays compare equal.
    fn delay_epsilon(&self) -> Delay;

    /// The delay penalty a router should assume when ripping up a bound path.
    fn ripup_delay_penalty(&self) -> Delay;

    // --- Cell-level queries ---

    /// Combinational delay through a cell from one port to another, if such
    /// an arc exists.
    fn cell_delay(&self, cell: &CellInfo, from: Ident, to: Ident) -> Option<DelayInfo>;

    /// The clock port a given port is registered against, if any.
    fn port_clock(&self, _cell: &CellInfo, _port: Ident) -> Option<Ident> {
        None
    }

    /// Whether a port is a clock input.
    fn is_clock_port(&self, _cell: &CellInfo, _port: Ident) -> bool {
        false
    }

    /// Architecture clamp on a sink's delay budget. The default leaves the
    /// assigned budget alone.
    fn budget_override(&self, _net: &NetInfo, _sink: &PortRef, budget: Delay) -> Delay {
        budget
    }

    // --- Placement design rules ---

    /// The single architecture-level design-rule check the placer consults.
    /// Must be deterministic and side-effect-free; may inspect current
    /// bindings through `ctx` (e.g. clock limits in a region).
    fn is_valid_bel_for_cell(&self, _ctx: &Context, _cell: &CellInfo, _bel: BelId) -> bool {
        true
    }

    /// Whether the current set of cells bound at and around `bel` is legal.
    fn is_bel_location_valid(&self, _ctx: &Context, _bel: BelId) -> bool {
        true
    }

    // --- Groups and decals ---

    /// All resource groups on the device.
    fn groups(&self) -> Vec<GroupId> {
        Vec::new()
    }

    /// The bels belonging to a group.
    fn group_bels(&self, _group: GroupId) -> Vec<BelId> {
        Vec::new()
    }

    /// The decal drawn for a bel, if the device ships graphical metadata.
    fn bel_decal(&self, _bel: BelId) -> Option<DecalId> {
        None
    }

    // --- Checksums ---

    /// Stable digest of a bel handle, for the design checksum.
    fn bel_checksum(&self, bel: BelId) -> u32;

    /// Stable digest of a wire handle.
    fn wire_checksum(&self, wire: WireId) -> u32;

    /// Stable digest of a pip handle.
    fn pip_checksum(&self, pip: PipId) -> u32;
}
