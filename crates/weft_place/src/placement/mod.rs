//! Placement: assigning every cell in the netlist to a legal bel.
//!
//! Three operations are exposed. [`place_constraints`] legalises user
//! `BEL` pin-downs. [`place_design`] is the plain fallback placer:
//! constraints plus a greedy type-batched scan that hands each cell the next
//! free bel of its type. [`place_design_heuristic`] runs the same seeding and
//! then iteratively re-places each cell onto the bel minimising the L1
//! distance to its placed neighbours.
//!
//! All phases are deterministic given the catalog's declaration order and
//! the netlist's insertion order. Each returns `Ok(true)` on success; with
//! the context's `force` flag set, recoverable placement errors degrade to a
//! logged warning and `Ok(false)`.

mod constraints;
mod heuristic;

pub use heuristic::estimate_total_wirelength;

use crate::budget::assign_budgets;
use crate::context::Context;
use crate::error::Result;
use log::warn;

/// Number of improvement passes the heuristic placer runs after seeding.
pub const IMPROVEMENT_PASSES: usize = 3;

/// Places every cell carrying a user `BEL` constraint, at `Strength::User`.
///
/// Cells that are already placed are skipped, so this is safe to call both
/// standalone and as the first step of the full placers.
pub fn place_constraints(ctx: &mut Context) -> Result<bool> {
    run_phase(ctx, |ctx| constraints::run(ctx).map(|_| ()))
}

/// The fallback placer: user constraints, then greedy type-batched seeding.
///
/// Every unconstrained cell receives the next available bel of its type in
/// catalog declaration order. No cost function is involved; use
/// [`place_design_heuristic`] for wirelength-aware placement.
pub fn place_design(ctx: &mut Context) -> Result<bool> {
    assign_budgets(ctx);
    run_phase(ctx, |ctx| {
        constraints::run(ctx)?;
        heuristic::seed_by_type(ctx).map(|_| ())
    })
}

/// The heuristic placer: constraints, greedy seeding, then
/// [`IMPROVEMENT_PASSES`] passes of per-cell wirelength improvement.
pub fn place_design_heuristic(ctx: &mut Context) -> Result<bool> {
    assign_budgets(ctx);
    run_phase(ctx, |ctx| {
        constraints::run(ctx)?;
        let autoplaced = heuristic::seed_by_type(ctx)?;
        heuristic::improve(ctx, &autoplaced)
    })
}

fn run_phase(ctx: &mut Context, phase: impl FnOnce(&mut Context) -> Result<()>) -> Result<bool> {
    match phase(ctx) {
        Ok(()) => Ok(true),
        Err(err) if err.is_recoverable() && ctx.force => {
            warn!("{err} (continuing, force is set)");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, GridChip};
    use crate::error::Error;
    use crate::netlist::{PortType, Strength};
    use weft_common::{Ident, Interner};

    fn grid_ctx(w: u32, h: u32) -> Context {
        let interner = Interner::new();
        let chip = GridChip::new(&interner, w, h);
        Context::new(interner, Box::new(chip), 1)
    }

    /// Two LUTs and an FF chained through two nets.
    fn chain_design(ctx: &mut Context) -> Vec<Ident> {
        let lut0 = ctx.create_cell("lut0", "LUT");
        let lut1 = ctx.create_cell("lut1", "LUT");
        let ff0 = ctx.create_cell("ff0", "FF");

        let o0 = ctx.add_port(lut0, "O", PortType::Out);
        let i0 = ctx.add_port(lut1, "I0", PortType::In);
        let o1 = ctx.add_port(lut1, "O", PortType::Out);
        let d = ctx.add_port(ff0, "D", PortType::In);

        let n0 = ctx.create_net("n0");
        ctx.connect_port(n0, lut0, o0);
        ctx.connect_port(n0, lut1, i0);
        let n1 = ctx.create_net("n1");
        ctx.connect_port(n1, lut1, o1);
        ctx.connect_port(n1, ff0, d);

        vec![lut0, lut1, ff0]
    }

    fn assert_fully_placed(ctx: &Context) {
        for (_, cell) in &ctx.cells {
            let bel = cell.bel.expect("cell left unplaced");
            assert_eq!(ctx.catalog().bel_type(bel), cell.cell_type);
            assert_eq!(ctx.bound_bel_cell(bel), Some(cell.name));
            let bel_attr = ctx.interner.get("BEL").unwrap();
            let annotated = cell.attrs.get(&bel_attr).expect("missing BEL back-annotation");
            assert_eq!(
                ctx.interner.get(annotated).unwrap(),
                ctx.catalog().bel_name(bel)
            );
        }
    }

    #[test]
    fn single_lut_lands_on_first_matching_bel() {
        let mut ctx = grid_ctx(2, 2);
        let lut = ctx.create_cell("lut0", "LUT");
        let o = ctx.add_port(lut, "O", PortType::Out);
        let n = ctx.create_net("n0");
        ctx.connect_port(n, lut, o);

        assert!(place_design(&mut ctx).unwrap());
        let bel = ctx.cells[&lut].bel.unwrap();
        assert_eq!(ctx.name(ctx.catalog().bel_name(bel)), "X0Y0/LUT_A");
        ctx.check().unwrap();

        // Checksum is stable across invocations on identical state.
        let first = ctx.checksum();
        assert_eq!(first, ctx.checksum());
    }

    #[test]
    fn isolated_cell_drifts_to_last_equal_cost_bel() {
        // With no placed neighbours every candidate costs zero, and the
        // improvement scan keeps the last equal-cost bel it sees.
        let mut ctx = grid_ctx(2, 2);
        let lut = ctx.create_cell("lut0", "LUT");

        assert!(place_design_heuristic(&mut ctx).unwrap());
        let bel = ctx.cells[&lut].bel.unwrap();
        assert_eq!(ctx.name(ctx.catalog().bel_name(bel)), "X1Y1/LUT_B");
    }

    #[test]
    fn heuristic_places_whole_design() {
        let mut ctx = grid_ctx(3, 3);
        chain_design(&mut ctx);
        assert!(place_design_heuristic(&mut ctx).unwrap());
        assert_fully_placed(&ctx);
        ctx.check().unwrap();
    }

    #[test]
    fn fallback_placer_places_whole_design() {
        let mut ctx = grid_ctx(3, 3);
        chain_design(&mut ctx);
        assert!(place_design(&mut ctx).unwrap());
        assert_fully_placed(&ctx);
        ctx.check().unwrap();
    }

    #[test]
    fn placed_bels_are_distinct() {
        let mut ctx = grid_ctx(2, 2);
        for i in 0..8 {
            ctx.create_cell(&format!("lut{i}"), "LUT");
        }
        assert!(place_design_heuristic(&mut ctx).unwrap());
        let mut seen = std::collections::HashSet::new();
        for (_, cell) in &ctx.cells {
            assert!(seen.insert(cell.bel.unwrap()));
        }
    }

    #[test]
    fn user_constraint_is_honoured_and_unmovable() {
        let mut ctx = grid_ctx(8, 8);
        chain_design(&mut ctx);
        let lut1 = ctx.id("lut1");
        let bel_attr = ctx.id("BEL");
        ctx.cells[&lut1].attrs.insert(bel_attr, "X3Y7/LUT_A".to_string());

        assert!(place_design_heuristic(&mut ctx).unwrap());

        let pinned = ctx.catalog().bel_by_name(ctx.id("X3Y7/LUT_A")).unwrap();
        assert_eq!(ctx.cells[&lut1].bel, Some(pinned));
        assert_eq!(ctx.cells[&lut1].bel_strength, Strength::User);
        ctx.check().unwrap();
    }

    #[test]
    fn unknown_bel_constraint_fails() {
        let mut ctx = grid_ctx(2, 2);
        let lut = ctx.create_cell("lut0", "LUT");
        let bel_attr = ctx.id("BEL");
        ctx.cells[&lut].attrs.insert(bel_attr, "X9Y9/LUT_A".to_string());

        let err = place_constraints(&mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownBel { .. }));
        assert!(ctx.cells[&lut].bel.is_none());
    }

    #[test]
    fn type_mismatch_constraint_fails_without_mutation() {
        let mut ctx = grid_ctx(2, 2);
        let ff = ctx.create_cell("ff0", "FF");
        let bel_attr = ctx.id("BEL");
        ctx.cells[&ff].attrs.insert(bel_attr, "X0Y0/LUT_A".to_string());
        let before = ctx.checksum();

        let err = place_constraints(&mut ctx).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
        assert!(ctx.cells[&ff].bel.is_none());
        let bel = ctx.catalog().bel_by_name(ctx.id("X0Y0/LUT_A")).unwrap();
        assert_eq!(ctx.bound_bel_cell(bel), None);
        assert_eq!(ctx.checksum(), before);
    }

    #[test]
    fn overflow_reports_resource_exhausted() {
        // A 1x1 grid has exactly two LUT bels; the third LUT cannot fit.
        let mut ctx = grid_ctx(1, 1);
        for i in 0..3 {
            ctx.create_cell(&format!("lut{i}"), "LUT");
        }
        let err = place_design_heuristic(&mut ctx).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { .. }));

        // The first two cells keep their bels.
        let lut0 = ctx.id("lut0");
        let lut1 = ctx.id("lut1");
        let lut2 = ctx.id("lut2");
        assert!(ctx.cells[&lut0].bel.is_some());
        assert!(ctx.cells[&lut1].bel.is_some());
        assert!(ctx.cells[&lut2].bel.is_none());
    }

    #[test]
    fn unknown_cell_type_fails() {
        let mut ctx = grid_ctx(2, 2);
        ctx.create_cell("mult0", "DSP48");
        let err = place_design_heuristic(&mut ctx).unwrap_err();
        assert!(matches!(err, Error::UnknownBelType { .. }));
    }

    #[test]
    fn force_downgrades_placement_errors() {
        let mut ctx = grid_ctx(1, 1);
        ctx.force = true;
        for i in 0..3 {
            ctx.create_cell(&format!("lut{i}"), "LUT");
        }
        assert!(!place_design_heuristic(&mut ctx).unwrap());
    }

    #[test]
    fn force_does_not_mask_binding_bugs() {
        let mut ctx = grid_ctx(1, 1);
        ctx.force = true;
        let bel = ctx.catalog().bels()[0];
        assert!(matches!(ctx.unbind_bel(bel), Err(Error::NotBound { .. })));
    }

    #[test]
    fn determinism_two_identical_runs() {
        let run = || {
            let mut ctx = grid_ctx(4, 4);
            chain_design(&mut ctx);
            for i in 0..6 {
                ctx.create_cell(&format!("ff{}", i + 1), "FF");
            }
            assert!(place_design_heuristic(&mut ctx).unwrap());
            let bels: Vec<_> = ctx
                .cells
                .values()
                .map(|c| c.bel.unwrap().as_raw())
                .collect();
            (bels, ctx.checksum())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn extra_improvement_pass_never_worsens_wirelength() {
        let mut ctx = grid_ctx(4, 4);
        let cells = chain_design(&mut ctx);
        assert!(place_design_heuristic(&mut ctx).unwrap());
        let after_three = estimate_total_wirelength(&ctx);

        heuristic::improve_pass(&mut ctx, &cells).unwrap();
        let after_four = estimate_total_wirelength(&ctx);
        assert!(after_four <= after_three);
        ctx.check().unwrap();
    }

    #[test]
    fn valid_bel_check_holds_after_placement() {
        let mut ctx = grid_ctx(3, 3);
        chain_design(&mut ctx);
        assert!(place_design_heuristic(&mut ctx).unwrap());
        let names: Vec<_> = ctx.cells.keys().copied().collect();
        for name in names {
            let cell = ctx.cells[&name].clone();
            let bel = cell.bel.unwrap();
            assert!(ctx.catalog().is_valid_bel_for_cell(&ctx, &cell, bel));
        }
    }
}
