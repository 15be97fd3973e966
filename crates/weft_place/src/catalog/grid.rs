//! A synthetic grid device.
//!
//! `GridChip` models a W×H tile grid where every tile carries two 4-input
//! LUT bels and two FF bels, a per-pin wire for every bel pin, and one span
//! wire per tile that fans out to the pins and to the neighbouring tiles'
//! spans. It is deliberately small: enough routing graph to exercise the
//! binding store, the delay walk, and both placers, while staying readable.

use super::{BelLocation, Catalog};
use crate::context::Context;
use crate::ids::{BelId, GroupId, PipId, WireId};
use crate::netlist::{CellInfo, NetInfo, PortRef};
use std::collections::HashMap;
use weft_common::{Delay, DelayInfo, Ident, Interner};

/// Delay of a pin stub wire.
const PIN_WIRE_DELAY_PS: i64 = 50;
/// Delay of a tile span wire.
const SPAN_WIRE_DELAY_PS: i64 = 150;
/// Delay through any pip.
const PIP_DELAY_PS: i64 = 100;
/// Combinational delay through a LUT.
const LUT_DELAY_PS: i64 = 400;
/// Base cost added to every delay estimate.
const ESTIMATE_BASE_PS: i64 = 250;
/// Estimated cost per tile of Manhattan distance.
const ESTIMATE_PER_TILE_PS: i64 = 150;

struct BelData {
    name: Ident,
    ty: Ident,
    x: u32,
    y: u32,
    z: u32,
    pins: Vec<(Ident, WireId)>,
}

struct WireData {
    name: Ident,
    x: u32,
    y: u32,
    uphill: Vec<PipId>,
    downhill: Vec<PipId>,
}

struct PipData {
    src: WireId,
    dst: WireId,
}

/// A synthetic W×H grid device.
pub struct GridChip {
    device: String,
    width: u32,
    height: u32,
    bels: Vec<BelData>,
    bel_ids: Vec<BelId>,
    wires: Vec<WireData>,
    wire_ids: Vec<WireId>,
    pips: Vec<PipData>,
    pip_ids: Vec<PipId>,
    bel_lookup: HashMap<Ident, BelId>,
    type_lut: Ident,
    type_ff: Ident,
    pin_clk: Ident,
    pin_out: Ident,
    pin_q: Ident,
}

impl GridChip {
    /// Builds a grid device, interning all resource names into the design's
    /// interner.
    pub fn new(interner: &Interner, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1x1");

        let type_lut = interner.get_or_intern("LUT");
        let type_ff = interner.get_or_intern("FF");
        let lut_pins: Vec<Ident> = ["I0", "I1", "I2", "I3", "O"]
            .iter()
            .map(|p| interner.get_or_intern(p))
            .collect();
        let ff_pins: Vec<Ident> = ["D", "CLK", "Q"]
            .iter()
            .map(|p| interner.get_or_intern(p))
            .collect();
        let pin_clk = ff_pins[1];
        let pin_out = lut_pins[4];
        let pin_q = ff_pins[2];

        let mut chip = Self {
            device: format!("grid{width}x{height}"),
            width,
            height,
            bels: Vec::new(),
            bel_ids: Vec::new(),
            wires: Vec::new(),
            wire_ids: Vec::new(),
            pips: Vec::new(),
            pip_ids: Vec::new(),
            bel_lookup: HashMap::new(),
            type_lut,
            type_ff,
            pin_clk,
            pin_out,
            pin_q,
        };

        let mut spans = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let span = chip.add_wire(interner, &format!("X{x}Y{y}/SPAN"), x, y);
                spans.push(span);

                for (z, (suffix, ty, pins)) in [
                    ("LUT_A", type_lut, &lut_pins),
                    ("LUT_B", type_lut, &lut_pins),
                    ("FF_A", type_ff, &ff_pins),
                    ("FF_B", type_ff, &ff_pins),
                ]
                .into_iter()
                .enumerate()
                {
                    chip.add_bel(interner, x, y, z as u32, suffix, ty, pins, span);
                }
            }
        }

        // Bidirectional span-to-span pips between orthogonal neighbours.
        for y in 0..height {
            for x in 0..width {
                let here = spans[(y * width + x) as usize];
                if x + 1 < width {
                    let right = spans[(y * width + x + 1) as usize];
                    chip.add_pip(here, right);
                    chip.add_pip(right, here);
                }
                if y + 1 < height {
                    let up = spans[((y + 1) * width + x) as usize];
                    chip.add_pip(here, up);
                    chip.add_pip(up, here);
                }
            }
        }

        chip
    }

    /// Grid dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn add_wire(&mut self, interner: &Interner, name: &str, x: u32, y: u32) -> WireId {
        let id = WireId::from_raw(self.wires.len() as u32);
        self.wires.push(WireData {
            name: interner.get_or_intern(name),
            x,
            y,
            uphill: Vec::new(),
            downhill: Vec::new(),
        });
        self.wire_ids.push(id);
        id
    }

    fn add_pip(&mut self, src: WireId, dst: WireId) -> PipId {
        let id = PipId::from_raw(self.pips.len() as u32);
        self.pips.push(PipData { src, dst });
        self.pip_ids.push(id);
        self.wires[src.index()].downhill.push(id);
        self.wires[dst.index()].uphill.push(id);
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn add_bel(
        &mut self,
        interner: &Interner,
        x: u32,
        y: u32,
        z: u32,
        suffix: &str,
        ty: Ident,
        pins: &[Ident],
        span: WireId,
    ) {
        let bel_name = format!("X{x}Y{y}/{suffix}");
        let mut pin_wires = Vec::with_capacity(pins.len());
        for &pin in pins {
            let wire = self.add_wire(
                interner,
                &format!("{bel_name}.{}", interner.resolve(pin)),
                x,
                y,
            );
            // Outputs drive the span; the span drives inputs.
            if pin == self.pin_out || pin == self.pin_q {
                self.add_pip(wire, span);
            } else {
                self.add_pip(span, wire);
            }
            pin_wires.push((pin, wire));
        }

        let id = BelId::from_raw(self.bels.len() as u32);
        let name = interner.get_or_intern(&bel_name);
        self.bels.push(BelData {
            name,
            ty,
            x,
            y,
            z,
            pins: pin_wires,
        });
        self.bel_ids.push(id);
        self.bel_lookup.insert(name, id);
    }

    fn bel(&self, bel: BelId) -> &BelData {
        &self.bels[bel.index()]
    }

    fn wire(&self, wire: WireId) -> &WireData {
        &self.wires[wire.index()]
    }
}

impl Catalog for GridChip {
    fn family(&self) -> &str {
        "grid"
    }

    fn device(&self) -> &str {
        &self.device
    }

    fn bels(&self) -> &[BelId] {
        &self.bel_ids
    }

    fn bels_by_tile(&self, x: u32, y: u32) -> Vec<BelId> {
        self.bel_ids
            .iter()
            .copied()
            .filter(|&b| {
                let b = self.bel(b);
                b.x == x && b.y == y
            })
            .collect()
    }

    fn bel_type(&self, bel: BelId) -> Ident {
        self.bel(bel).ty
    }

    fn has_bel_type(&self, ty: Ident) -> bool {
        ty == self.type_lut || ty == self.type_ff
    }

    fn bel_name(&self, bel: BelId) -> Ident {
        self.bel(bel).name
    }

    fn bel_by_name(&self, name: Ident) -> Option<BelId> {
        self.bel_lookup.get(&name).copied()
    }

    fn bel_location(&self, bel: BelId) -> BelLocation {
        let b = self.bel(bel);
        BelLocation {
            x: b.x,
            y: b.y,
            z: b.z,
        }
    }

    fn bel_pins(&self, bel: BelId) -> Vec<Ident> {
        self.bel(bel).pins.iter().map(|&(pin, _)| pin).collect()
    }

    fn bel_pin_wire(&self, bel: BelId, pin: Ident) -> Option<WireId> {
        self.bel(bel)
            .pins
            .iter()
            .find(|&&(p, _)| p == pin)
            .map(|&(_, wire)| wire)
    }

    fn estimate_position(&self, bel: BelId) -> (f32, f32) {
        let b = self.bel(bel);
        (b.x as f32 + 0.5, b.y as f32 + 0.5)
    }

    fn wires(&self) -> &[WireId] {
        &self.wire_ids
    }

    fn wire_name(&self, wire: WireId) -> Ident {
        self.wire(wire).name
    }

    fn pips(&self) -> &[PipId] {
        &self.pip_ids
    }

    fn pip_src(&self, pip: PipId) -> WireId {
        self.pips[pip.index()].src
    }

    fn pip_dst(&self, pip: PipId) -> WireId {
        self.pips[pip.index()].dst
    }

    fn pips_uphill(&self, wire: WireId) -> Vec<PipId> {
        self.wire(wire).uphill.clone()
    }

    fn pips_downhill(&self, wire: WireId) -> Vec<PipId> {
        self.wire(wire).downhill.clone()
    }

    fn wire_delay(&self, wire: WireId) -> DelayInfo {
        let w = self.wire(wire);
        // Span wires fan out to many pips; pin stubs touch exactly one.
        let ps = if w.uphill.len() + w.downhill.len() > 1 {
            SPAN_WIRE_DELAY_PS
        } else {
            PIN_WIRE_DELAY_PS
        };
        DelayInfo::uniform(Delay::from_ps(ps))
    }

    fn pip_delay(&self, _pip: PipId) -> DelayInfo {
        DelayInfo::uniform(Delay::from_ps(PIP_DELAY_PS))
    }

    fn estimate_delay(&self, src: WireId, dst: WireId) -> Delay {
        let (s, d) = (self.wire(src), self.wire(dst));
        let dist = s.x.abs_diff(d.x) + s.y.abs_diff(d.y);
        Delay::from_ps(ESTIMATE_BASE_PS + ESTIMATE_PER_TILE_PS * dist as i64)
    }

    fn predict_delay(&self, ctx: &Context, net: &NetInfo, sink: &PortRef) -> Delay {
        let bel_of = |cell: Option<Ident>| {
            cell.and_then(|name| ctx.cells.get(&name)).and_then(|c| c.bel)
        };
        match (bel_of(net.driver.cell), bel_of(sink.cell)) {
            (Some(src), Some(dst)) => {
                let (sx, sy) = self.estimate_position(src);
                let (dx, dy) = self.estimate_position(dst);
                let dist = (sx - dx).abs() + (sy - dy).abs();
                Delay::from_ps(ESTIMATE_BASE_PS + (ESTIMATE_PER_TILE_PS as f32 * dist) as i64)
            }
            _ => Delay::ZERO,
        }
    }

    fn delay_epsilon(&self) -> Delay {
        Delay::from_ps(10)
    }

    fn ripup_delay_penalty(&self) -> Delay {
        Delay::from_ps(200)
    }

    fn cell_delay(&self, cell: &CellInfo, _from: Ident, to: Ident) -> Option<DelayInfo> {
        // LUTs have one combinational arc per input; FF outputs are
        // registered and expose no combinational arc.
        if cell.cell_type == self.type_lut && to == self.pin_out {
            Some(DelayInfo::uniform(Delay::from_ps(LUT_DELAY_PS)))
        } else {
            None
        }
    }

    fn port_clock(&self, cell: &CellInfo, port: Ident) -> Option<Ident> {
        if cell.cell_type == self.type_ff && port != self.pin_clk {
            Some(self.pin_clk)
        } else {
            None
        }
    }

    fn is_clock_port(&self, cell: &CellInfo, port: Ident) -> bool {
        cell.cell_type == self.type_ff && port == self.pin_clk
    }

    fn groups(&self) -> Vec<GroupId> {
        (0..self.width * self.height).map(GroupId::from_raw).collect()
    }

    fn group_bels(&self, group: GroupId) -> Vec<BelId> {
        let x = group.as_raw() % self.width;
        let y = group.as_raw() / self.width;
        self.bels_by_tile(x, y)
    }

    fn bel_checksum(&self, bel: BelId) -> u32 {
        bel.as_raw()
    }

    fn wire_checksum(&self, wire: WireId) -> u32 {
        wire.as_raw()
    }

    fn pip_checksum(&self, pip: PipId) -> u32 {
        pip.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chip2x2() -> (Interner, GridChip) {
        let interner = Interner::new();
        let chip = GridChip::new(&interner, 2, 2);
        (interner, chip)
    }

    #[test]
    fn resource_counts() {
        let (_interner, chip) = chip2x2();
        assert_eq!(chip.dimensions(), (2, 2));
        assert_eq!(chip.family(), "grid");
        assert_eq!(chip.device(), "grid2x2");
        // 4 bels per tile.
        assert_eq!(chip.bels().len(), 16);
        // 1 span + 5 LUT pins x2 + 3 FF pins x2 per tile.
        assert_eq!(chip.wires().len(), 4 * 17);
        // 16 pin pips per tile plus 4 bidirectional neighbour edges.
        assert_eq!(chip.pips().len(), 4 * 16 + 8);
    }

    #[test]
    fn declaration_order_starts_at_origin() {
        let (interner, chip) = chip2x2();
        let first = chip.bels()[0];
        assert_eq!(interner.resolve(chip.bel_name(first)), "X0Y0/LUT_A");
        assert_eq!(chip.bel_type(first), interner.get_or_intern("LUT"));
    }

    #[test]
    fn bel_lookup_by_name() {
        let (interner, chip) = chip2x2();
        let name = interner.get_or_intern("X1Y1/FF_B");
        let bel = chip.bel_by_name(name).unwrap();
        let loc = chip.bel_location(bel);
        assert_eq!((loc.x, loc.y, loc.z), (1, 1, 3));
        assert!(chip.bel_by_name(interner.get_or_intern("X9Y9/LUT_A")).is_none());
    }

    #[test]
    fn bels_by_tile_groups_four() {
        let (_interner, chip) = chip2x2();
        let tile = chip.bels_by_tile(1, 0);
        assert_eq!(tile.len(), 4);
        for bel in tile {
            let loc = chip.bel_location(bel);
            assert_eq!((loc.x, loc.y), (1, 0));
        }
    }

    #[test]
    fn bel_pin_wires_resolve() {
        let (interner, chip) = chip2x2();
        let bel = chip.bel_by_name(interner.get_or_intern("X0Y0/LUT_A")).unwrap();
        let pins = chip.bel_pins(bel);
        assert_eq!(pins.len(), 5);
        let o = interner.get_or_intern("O");
        let wire = chip.bel_pin_wire(bel, o).unwrap();
        assert_eq!(interner.resolve(chip.wire_name(wire)), "X0Y0/LUT_A.O");
        assert!(chip.bel_pin_wire(bel, interner.get_or_intern("D")).is_none());
    }

    #[test]
    fn pip_endpoints_are_consistent() {
        let (_interner, chip) = chip2x2();
        for &pip in chip.pips() {
            let src = chip.pip_src(pip);
            let dst = chip.pip_dst(pip);
            assert!(chip.pips_downhill(src).contains(&pip));
            assert!(chip.pips_uphill(dst).contains(&pip));
        }
    }

    #[test]
    fn output_pins_drive_the_span() {
        let (interner, chip) = chip2x2();
        let bel = chip.bel_by_name(interner.get_or_intern("X0Y0/FF_A")).unwrap();
        let q = chip.bel_pin_wire(bel, interner.get_or_intern("Q")).unwrap();
        let d = chip.bel_pin_wire(bel, interner.get_or_intern("D")).unwrap();
        assert_eq!(chip.pips_downhill(q).len(), 1);
        assert!(chip.pips_uphill(q).is_empty());
        assert_eq!(chip.pips_uphill(d).len(), 1);
        assert!(chip.pips_downhill(d).is_empty());
    }

    #[test]
    fn estimate_grows_with_distance() {
        let interner = Interner::new();
        let chip = GridChip::new(&interner, 4, 4);
        let near = chip.bel_by_name(interner.get_or_intern("X0Y0/LUT_A")).unwrap();
        let far = chip.bel_by_name(interner.get_or_intern("X3Y3/LUT_A")).unwrap();
        let o = interner.get_or_intern("O");
        let i0 = interner.get_or_intern("I0");
        let w_near = chip.bel_pin_wire(near, o).unwrap();
        let w_far = chip.bel_pin_wire(far, i0).unwrap();
        let same_tile = chip.estimate_delay(w_near, chip.bel_pin_wire(near, i0).unwrap());
        let across = chip.estimate_delay(w_near, w_far);
        assert!(across > same_tile);
        assert_eq!(across, Delay::from_ps(250 + 150 * 6));
    }

    #[test]
    fn positions_are_tile_centres() {
        let (interner, chip) = chip2x2();
        let bel = chip.bel_by_name(interner.get_or_intern("X1Y0/LUT_B")).unwrap();
        assert_eq!(chip.estimate_position(bel), (1.5, 0.5));
    }

    #[test]
    fn clock_ports_on_ffs_only() {
        let (interner, chip) = chip2x2();
        let clk = interner.get_or_intern("CLK");
        let d = interner.get_or_intern("D");
        let ff = CellInfo::new(interner.get_or_intern("ff0"), interner.get_or_intern("FF"));
        let lut = CellInfo::new(interner.get_or_intern("lut0"), interner.get_or_intern("LUT"));
        assert!(chip.is_clock_port(&ff, clk));
        assert!(!chip.is_clock_port(&lut, clk));
        assert_eq!(chip.port_clock(&ff, d), Some(clk));
        assert_eq!(chip.port_clock(&ff, clk), None);
    }

    #[test]
    fn lut_has_combinational_arc() {
        let (interner, chip) = chip2x2();
        let o = interner.get_or_intern("O");
        let i0 = interner.get_or_intern("I0");
        let lut = CellInfo::new(interner.get_or_intern("lut0"), interner.get_or_intern("LUT"));
        let ff = CellInfo::new(interner.get_or_intern("ff0"), interner.get_or_intern("FF"));
        assert!(chip.cell_delay(&lut, i0, o).is_some());
        assert!(chip.cell_delay(&ff, i0, o).is_none());
    }

    #[test]
    fn groups_partition_bels_by_tile() {
        let (_interner, chip) = chip2x2();
        let groups = chip.groups();
        assert_eq!(groups.len(), 4);
        let total: usize = groups.iter().map(|&g| chip.group_bels(g).len()).sum();
        assert_eq!(total, chip.bels().len());
    }

    #[test]
    fn unknown_types_are_rejected() {
        let (interner, chip) = chip2x2();
        assert!(chip.has_bel_type(interner.get_or_intern("LUT")));
        assert!(!chip.has_bel_type(interner.get_or_intern("DSP48")));
    }
}
