//! Design-state integrity checking and checksumming.
//!
//! [`Context::check`] asserts every cross-link invariant between cells, nets,
//! and the binding store. [`Context::checksum`] digests the whole design
//! state into a stable `u32`: stable across map iteration order (unordered
//! containers reduce by wrapping sum) and across runs (all inputs are
//! interned indices, handle digests, and byte values). The test suite
//! compares checksums between runs to catch unintended state drift.

use crate::catalog::Catalog;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::netlist::PortType;
use indexmap::IndexMap;
use std::collections::HashSet;
use weft_common::{Digest, Ident};

/// Digest code for an absent bel or pip handle.
const NULL_HANDLE_CHECKSUM: u32 = u32::MAX;

impl Context {
    /// Verifies every cross-link invariant of the design state.
    ///
    /// Returns `InvariantFailure` naming the first offending entity. Call
    /// after each flow phase; a failure here is an engine bug, never a
    /// user-input problem.
    pub fn check(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvariantFailure(msg));

        // Bindings may only hold handles issued by this catalog.
        let issued_wires: HashSet<_> = self.catalog.wires().iter().copied().collect();
        let issued_pips: HashSet<_> = self.catalog.pips().iter().copied().collect();
        let issued_bels: HashSet<_> = self.catalog.bels().iter().copied().collect();

        for (&key, ni) in &self.nets {
            if key != ni.name {
                return fail(format!(
                    "net map key '{}' does not match net name '{}'",
                    self.name(key),
                    self.name(ni.name)
                ));
            }
            for (&wire, assign) in &ni.wires {
                if !issued_wires.contains(&wire) {
                    return fail(format!(
                        "net '{}' holds a wire handle not issued by this catalog",
                        self.name(key)
                    ));
                }
                if self.bound_wire_net(wire) != Some(key) {
                    return fail(format!(
                        "wire '{}' listed by net '{}' is not bound to it",
                        self.name(self.catalog.wire_name(wire)),
                        self.name(key)
                    ));
                }
                if let Some(pip) = assign.pip {
                    if !issued_pips.contains(&pip) {
                        return fail(format!(
                            "net '{}' holds a pip handle not issued by this catalog",
                            self.name(key)
                        ));
                    }
                    if self.catalog.pip_dst(pip) != wire {
                        return fail(format!(
                            "wire '{}' of net '{}' records a driving pip with a \
                             different destination",
                            self.name(self.catalog.wire_name(wire)),
                            self.name(key)
                        ));
                    }
                    if self.bound_pip_net(pip) != Some(key) {
                        return fail(format!(
                            "pip driving wire '{}' of net '{}' is not bound to that net",
                            self.name(self.catalog.wire_name(wire)),
                            self.name(key)
                        ));
                    }
                }
            }
        }

        // Every store-side wire binding must be mirrored in its net.
        for (&wire, &(net, _)) in &self.bound_wires {
            let Some(ni) = self.nets.get(&net) else {
                return fail(format!(
                    "wire '{}' is bound to nonexistent net '{}'",
                    self.name(self.catalog.wire_name(wire)),
                    self.name(net)
                ));
            };
            if !ni.wires.contains_key(&wire) {
                return fail(format!(
                    "wire '{}' is bound to net '{}' but missing from its wire list",
                    self.name(self.catalog.wire_name(wire)),
                    self.name(net)
                ));
            }
        }

        for (&key, ci) in &self.cells {
            if key != ci.name {
                return fail(format!(
                    "cell map key '{}' does not match cell name '{}'",
                    self.name(key),
                    self.name(ci.name)
                ));
            }
            if let Some(bel) = ci.bel {
                if !issued_bels.contains(&bel) {
                    return fail(format!(
                        "cell '{}' holds a bel handle not issued by this catalog",
                        self.name(key)
                    ));
                }
                if self.bound_bel_cell(bel) != Some(key) {
                    return fail(format!(
                        "cell '{}' claims bel '{}' but the binding store disagrees",
                        self.name(key),
                        self.name(self.catalog.bel_name(bel))
                    ));
                }
            }
            for (&pname, pi) in &ci.ports {
                if pname != pi.name {
                    return fail(format!(
                        "port map key '{}' on cell '{}' does not match port name",
                        self.name(pname),
                        self.name(key)
                    ));
                }
                let Some(net) = pi.net else { continue };
                let Some(ni) = self.nets.get(&net) else {
                    return fail(format!(
                        "port '{}' of cell '{}' references nonexistent net '{}'",
                        self.name(pname),
                        self.name(key),
                        self.name(net)
                    ));
                };
                match pi.dir {
                    PortType::Out => {
                        if !ni.driver.is(key, pname) {
                            return fail(format!(
                                "output port '{}' of cell '{}' is not the driver of \
                                 net '{}'",
                                self.name(pname),
                                self.name(key),
                                self.name(net)
                            ));
                        }
                    }
                    PortType::In => {
                        let count = ni.users.iter().filter(|u| u.is(key, pname)).count();
                        if count != 1 {
                            return fail(format!(
                                "input port '{}' of cell '{}' appears {} times among \
                                 the users of net '{}'",
                                self.name(pname),
                                self.name(key),
                                count,
                                self.name(net)
                            ));
                        }
                    }
                    PortType::InOut => {}
                }
            }
        }

        // Store-side bel bindings must point back at placed cells.
        for (&bel, &(cell, _)) in &self.bound_bels {
            let Some(ci) = self.cells.get(&cell) else {
                return fail(format!(
                    "bel '{}' is bound to nonexistent cell '{}'",
                    self.name(self.catalog.bel_name(bel)),
                    self.name(cell)
                ));
            };
            if ci.bel != Some(bel) {
                return fail(format!(
                    "bel '{}' is bound to cell '{}' but the cell is placed elsewhere",
                    self.name(self.catalog.bel_name(bel)),
                    self.name(cell)
                ));
            }
        }

        Ok(())
    }

    /// Digests the entire design state into a stable 32-bit checksum.
    pub fn checksum(&self) -> u32 {
        let mut nets_sum = 0u32;
        for (&key, ni) in &self.nets {
            let mut x = Digest::new().mix(key.as_raw()).mix(ni.name.as_raw());
            if let Some(cell) = ni.driver.cell {
                x = x.mix(cell.as_raw());
            }
            x = x.mix(ni.driver.port.as_raw());
            x = x.mix(ni.driver.budget.checksum());

            for user in &ni.users {
                if let Some(cell) = user.cell {
                    x = x.mix(cell.as_raw());
                }
                x = x.mix(user.port.as_raw());
                x = x.mix(user.budget.checksum());
            }

            x = x.mix(string_map_checksum(&ni.attrs));
            x = x.mix(string_map_checksum(&ni.params));

            let mut wire_sum = 0u32;
            for (&wire, assign) in &ni.wires {
                let wx = Digest::new()
                    .mix(self.catalog.wire_checksum(wire))
                    .mix(
                        assign
                            .pip
                            .map(|p| self.catalog.pip_checksum(p))
                            .unwrap_or(NULL_HANDLE_CHECKSUM),
                    )
                    .mix(assign.strength.checksum());
                wire_sum = wire_sum.wrapping_add(wx.value());
            }
            x = x.mix(wire_sum);

            nets_sum = nets_sum.wrapping_add(x.value());
        }
        let mut cksum = Digest::root().mix(nets_sum);

        let mut cells_sum = 0u32;
        for (&key, ci) in &self.cells {
            let mut x = Digest::new()
                .mix(key.as_raw())
                .mix(ci.name.as_raw())
                .mix(ci.cell_type.as_raw());

            let mut port_sum = 0u32;
            for (&pname, pi) in &ci.ports {
                let mut px = Digest::new().mix(pname.as_raw()).mix(pi.name.as_raw());
                if let Some(net) = pi.net {
                    px = px.mix(net.as_raw());
                }
                px = px.mix(pi.dir.checksum());
                port_sum = port_sum.wrapping_add(px.value());
            }
            x = x.mix(port_sum);

            x = x.mix(string_map_checksum(&ci.attrs));
            x = x.mix(string_map_checksum(&ci.params));

            x = x.mix(
                ci.bel
                    .map(|b| self.catalog.bel_checksum(b))
                    .unwrap_or(NULL_HANDLE_CHECKSUM),
            );
            x = x.mix(ci.bel_strength.checksum());

            let mut pin_sum = 0u32;
            for (&logical, &physical) in &ci.pins {
                let px = Digest::new().mix(logical.as_raw()).mix(physical.as_raw());
                pin_sum = pin_sum.wrapping_add(px.value());
            }
            x = x.mix(pin_sum);

            cells_sum = cells_sum.wrapping_add(x.value());
        }
        cksum = cksum.mix(cells_sum);

        cksum.value()
    }
}

fn string_map_checksum(map: &IndexMap<Ident, String>) -> u32 {
    let mut sum = 0u32;
    for (&key, value) in map {
        let mut x = Digest::new().mix(key.as_raw());
        for byte in value.bytes() {
            x = x.mix(byte as u32);
        }
        sum = sum.wrapping_add(x.value());
    }
    sum
}
