//! Greedy seeding and iterative wirelength improvement.
//!
//! Seeding walks one cursor per cell type over the catalog's bels in
//! declaration order, so every unconstrained cell holds some legal bel
//! before any cost-driven step runs. The cursor never backtracks: a bel
//! skipped for a transient validity rejection is not revisited within that
//! type batch.
//!
//! Improvement then re-places each seeded cell onto the candidate bel
//! minimising the L1 distance to its placed neighbours. Candidates compare
//! with `<=`, so the last equal-cost bel in declaration order wins; this is
//! observable in outputs and kept stable for reproducibility.

use super::IMPROVEMENT_PASSES;
use crate::catalog::Catalog;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::ids::BelId;
use crate::netlist::{PortType, Strength};
use log::info;
use weft_common::Ident;

/// Nets with this many users or more contribute only through their driver
/// when scoring a candidate bel.
const FANOUT_DAMPING_LIMIT: usize = 5;

/// Phase A: gives every unplaced cell the next free bel of its type, in
/// catalog declaration order. Returns the seeded cells in placement order.
pub(crate) fn seed_by_type(ctx: &mut Context) -> Result<Vec<Ident>> {
    let cell_names: Vec<_> = ctx.cells.keys().copied().collect();
    let total = cell_names.len();

    // Distinct types among unplaced cells, in first-seen order.
    let mut types_used: Vec<Ident> = Vec::new();
    for &name in &cell_names {
        let cell = &ctx.cells[&name];
        if cell.bel.is_some() || types_used.contains(&cell.cell_type) {
            continue;
        }
        if !ctx.catalog().has_bel_type(cell.cell_type) {
            return Err(Error::UnknownBelType {
                cell_type: ctx.name(cell.cell_type).to_string(),
            });
        }
        types_used.push(cell.cell_type);
    }

    let bels = ctx.catalog().bels().to_vec();
    let mut placed = ctx.cells.values().filter(|c| c.bel.is_some()).count();
    let mut autoplaced = Vec::new();

    for ty in types_used {
        let mut cursor = 0usize;
        for &name in &cell_names {
            if ctx.cells[&name].bel.is_some() || ctx.cells[&name].cell_type != ty {
                continue;
            }
            while cursor < bels.len() {
                let bel = bels[cursor];
                let usable = ctx.catalog().bel_type(bel) == ty
                    && ctx.check_bel_avail(bel)
                    && ctx
                        .catalog()
                        .is_valid_bel_for_cell(ctx, &ctx.cells[&name], bel);
                if usable {
                    break;
                }
                cursor += 1;
            }
            if cursor == bels.len() {
                return Err(Error::ResourceExhausted {
                    cell_type: ctx.name(ty).to_string(),
                });
            }
            let bel = bels[cursor];
            cursor += 1;
            ctx.bind_bel(bel, name, Strength::Placer)?;
            annotate(ctx, name, bel);
            autoplaced.push(name);
            placed += 1;
            if ctx.verbose {
                info!("placed {placed}/{total}");
            }
        }
    }

    info!("seeded {} cells", autoplaced.len());
    Ok(autoplaced)
}

/// Phase B: runs [`IMPROVEMENT_PASSES`] re-placement passes over the seeded
/// cells in their original placement order.
pub(crate) fn improve(ctx: &mut Context, placed: &[Ident]) -> Result<()> {
    for pass in 0..IMPROVEMENT_PASSES {
        improve_pass(ctx, placed)?;
        if ctx.verbose {
            info!(
                "pass {}/{}: wirelength {:.1}",
                pass + 1,
                IMPROVEMENT_PASSES,
                estimate_total_wirelength(ctx)
            );
        }
    }
    info!(
        "placement wirelength {:.1}",
        estimate_total_wirelength(ctx)
    );
    Ok(())
}

/// One re-placement pass over the given cells.
pub(crate) fn improve_pass(ctx: &mut Context, placed: &[Ident]) -> Result<()> {
    let total = placed.len();
    for (done, &name) in placed.iter().enumerate() {
        place_cell(ctx, name)?;
        if ctx.verbose {
            info!("replaced {}/{total}", done + 1);
        }
    }
    Ok(())
}

/// Re-places one cell onto the legal bel with the lowest neighbour cost.
fn place_cell(ctx: &mut Context, name: Ident) -> Result<()> {
    if let Some(bel) = ctx.cells[&name].bel {
        ctx.unbind_bel(bel)?;
    }

    let target_type = ctx.cells[&name].cell_type;
    let mut best: Option<(f32, BelId)> = None;
    for &bel in ctx.catalog().bels() {
        if ctx.catalog().bel_type(bel) != target_type || !ctx.check_bel_avail(bel) {
            continue;
        }
        if !ctx
            .catalog()
            .is_valid_bel_for_cell(ctx, &ctx.cells[&name], bel)
        {
            continue;
        }
        let cost = wirelength_cost(ctx, name, bel);
        if best.map_or(true, |(best_cost, _)| cost <= best_cost) {
            best = Some((cost, bel));
        }
    }

    let Some((_, bel)) = best else {
        return Err(Error::PlacementFailure {
            cell: ctx.name(name).to_string(),
            cell_type: ctx.name(target_type).to_string(),
        });
    };
    ctx.bind_bel(bel, name, Strength::Placer)?;
    annotate(ctx, name, bel);
    Ok(())
}

/// The L1 star cost of putting `name` on `bel`: summed Manhattan distance to
/// the placed driver of every input net, and to the placed users of every
/// low-fanout output net.
pub(crate) fn wirelength_cost(ctx: &Context, name: Ident, bel: BelId) -> f32 {
    let (bel_x, bel_y) = ctx.catalog().estimate_position(bel);
    let placed_bel = |cell: Option<Ident>| {
        cell.and_then(|c| ctx.cells.get(&c)).and_then(|c| c.bel)
    };

    let mut cost = 0.0f32;
    for port in ctx.cells[&name].ports.values() {
        let Some(net) = port.net else { continue };
        let ni = &ctx.nets[&net];
        match port.dir {
            PortType::In | PortType::InOut => {
                if let Some(drv_bel) = placed_bel(ni.driver.cell) {
                    let (x, y) = ctx.catalog().estimate_position(drv_bel);
                    cost += (bel_x - x).abs() + (bel_y - y).abs();
                }
            }
            PortType::Out => {
                if ni.users.len() < FANOUT_DAMPING_LIMIT {
                    for user in &ni.users {
                        if let Some(user_bel) = placed_bel(user.cell) {
                            let (x, y) = ctx.catalog().estimate_position(user_bel);
                            cost += (bel_x - x).abs() + (bel_y - y).abs();
                        }
                    }
                }
            }
        }
    }
    cost
}

/// Total half-perimeter wirelength over every net's placed endpoints.
pub fn estimate_total_wirelength(ctx: &Context) -> f32 {
    let mut total = 0.0f32;
    for ni in ctx.nets.values() {
        let mut lo = (f32::INFINITY, f32::INFINITY);
        let mut hi = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        let mut any = false;
        for endpoint in std::iter::once(&ni.driver).chain(ni.users.iter()) {
            let Some(bel) = endpoint
                .cell
                .and_then(|c| ctx.cells.get(&c))
                .and_then(|c| c.bel)
            else {
                continue;
            };
            let (x, y) = ctx.catalog().estimate_position(bel);
            lo = (lo.0.min(x), lo.1.min(y));
            hi = (hi.0.max(x), hi.1.max(y));
            any = true;
        }
        if any {
            total += (hi.0 - lo.0) + (hi.1 - lo.1);
        }
    }
    total
}

fn annotate(ctx: &mut Context, name: Ident, bel: BelId) {
    let bel_attr = ctx.id("BEL");
    let bel_name = ctx.name(ctx.catalog().bel_name(bel)).to_string();
    ctx.cells[&name].attrs.insert(bel_attr, bel_name);
}
