//! Core placement engine for the weft FPGA toolchain.
//!
//! This crate owns the shared design state of a place-and-route invocation —
//! the netlist, the bel/wire/pip binding store, and the integrity
//! checker/checksum — together with the placers that operate on it. The
//! device itself is abstracted behind the [`Catalog`] trait; one catalog
//! instance is fixed per [`Context`] for its lifetime.
//!
//! # Pipeline
//!
//! 1. The host loads a netlist into the [`Context`]
//! 2. **Constraints** — [`place_constraints`] legalises user `BEL` pin-downs
//! 3. **Placement** — [`place_design_heuristic`] (or the plain
//!    [`place_design`] fallback) binds every remaining cell to a bel
//! 4. [`Context::check`] verifies the cross-link invariants after each phase
//! 5. The bound state is handed to the router
//!
//! # Usage
//!
//! ```
//! use weft_common::Interner;
//! use weft_place::catalog::GridChip;
//! use weft_place::{place_design_heuristic, Context, PortType};
//!
//! let interner = Interner::new();
//! let chip = GridChip::new(&interner, 4, 4);
//! let mut ctx = Context::new(interner, Box::new(chip), 42);
//!
//! let lut = ctx.create_cell("lut0", "LUT");
//! let port = ctx.add_port(lut, "O", PortType::Out);
//! let net = ctx.create_net("n0");
//! ctx.connect_port(net, lut, port);
//!
//! assert!(place_design_heuristic(&mut ctx).unwrap());
//! assert!(ctx.cells.values().all(|c| c.bel.is_some()));
//! ctx.check().unwrap();
//! ```

#![warn(missing_docs)]

pub mod budget;
pub mod catalog;
pub mod context;
pub mod error;
pub mod ids;
pub mod netlist;
pub mod placement;
mod verify;

pub use budget::assign_budgets;
pub use catalog::{BelLocation, Catalog};
pub use context::Context;
pub use error::{Error, Result};
pub use ids::{BelId, DecalId, GroupId, PipId, WireId};
pub use netlist::{CellInfo, NetInfo, PortInfo, PortRef, PortType, Strength, WireAssignment};
pub use placement::{
    estimate_total_wirelength, place_constraints, place_design, place_design_heuristic,
    IMPROVEMENT_PASSES,
};
