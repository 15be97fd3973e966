//! Per-sink delay budget assignment.
//!
//! Before placement every sink endpoint receives a routing delay budget.
//! With a user target frequency the budget is one clock period; without one
//! it is a large sentinel and the flow optimises for the highest achievable
//! frequency. The catalog gets a final say through
//! [`Catalog::budget_override`](crate::catalog::Catalog::budget_override)
//! (dedicated clock networks, for example, clamp their sinks to zero).

use crate::catalog::Catalog;
use crate::context::Context;
use log::info;
use weft_common::Delay;

/// Budget used when no target frequency is set: 1 ms, far beyond any real
/// routing delay, so unconstrained sinks never fail their budget.
pub const UNCONSTRAINED_BUDGET: Delay = Delay::from_ps(1_000_000_000);

/// Initialises the delay budget of every sink in the design.
pub fn assign_budgets(ctx: &mut Context) {
    let base = match ctx.target_freq {
        Some(freq) => freq.period(),
        None => UNCONSTRAINED_BUDGET,
    };

    let net_names: Vec<_> = ctx.nets.keys().copied().collect();
    let mut sinks = 0usize;
    for name in net_names {
        for idx in 0..ctx.nets[&name].users.len() {
            let clamped = {
                let net = &ctx.nets[&name];
                ctx.catalog().budget_override(net, &net.users[idx], base)
            };
            ctx.nets[&name].users[idx].budget = clamped;
            sinks += 1;
        }
    }

    match ctx.target_freq {
        Some(freq) => info!("assigned {base} budget to {sinks} sinks for {freq}"),
        None => info!("assigned unconstrained budgets to {sinks} sinks"),
    }
}
