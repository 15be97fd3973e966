//! User placement constraints.
//!
//! A cell carrying a `BEL` attribute is pinned: the named bel is resolved,
//! its type checked against the cell's, and the cell bound at
//! `Strength::User` so no later pass can move it.

use crate::catalog::Catalog;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::netlist::Strength;
use log::info;

/// Binds every constrained, still-unplaced cell to its requested bel.
/// Returns the number of cells placed.
pub(crate) fn run(ctx: &mut Context) -> Result<usize> {
    let bel_attr = ctx.id("BEL");
    let cell_names: Vec<_> = ctx.cells.keys().copied().collect();
    let mut placed = 0usize;

    for name in cell_names {
        if ctx.cells[&name].bel.is_some() {
            continue;
        }
        let Some(loc_name) = ctx.cells[&name].attrs.get(&bel_attr).cloned() else {
            continue;
        };

        let loc_id = ctx.id(&loc_name);
        let Some(bel) = ctx.catalog().bel_by_name(loc_id) else {
            return Err(Error::UnknownBel {
                bel: loc_name,
                cell: ctx.name(name).to_string(),
            });
        };

        let bel_type = ctx.catalog().bel_type(bel);
        let cell_type = ctx.cells[&name].cell_type;
        if bel_type != cell_type {
            return Err(Error::TypeMismatch {
                bel: loc_name,
                bel_type: ctx.name(bel_type).to_string(),
                cell: ctx.name(name).to_string(),
                cell_type: ctx.name(cell_type).to_string(),
            });
        }

        ctx.bind_bel(bel, name, Strength::User)?;
        placed += 1;
        if ctx.verbose {
            info!("constrained '{}' to '{}'", ctx.name(name), loc_name);
        }
    }

    info!("place_constraints placed {placed}");
    Ok(placed)
}
