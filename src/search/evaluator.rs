//! The condition evaluator: tests one seed against the condition list,
//! threading positional state from earlier conditions into later ones.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::biome::TempCat;
use crate::filter::{Category, Condition, FilterKind};
use crate::gen::{is_slime_chunk, region_block_pos, Layer, StructureKind, WorldBackend, WorldSource};
use crate::types::{seed48, Area, Pos};

use super::quad::{check_quad_hut, check_quad_monument, QuadClass};

/// Matched positions of satisfied conditions, indexed by `save` id.
/// Stack-local to one seed evaluation; family searches clone the state of
/// the 48-bit pass for every upper-bits evaluation.
#[derive(Clone)]
pub struct PositionalState {
    slots: [Option<Pos>; 100],
}

impl Default for PositionalState {
    fn default() -> Self {
        Self { slots: [None; 100] }
    }
}

impl PositionalState {
    #[inline]
    pub fn get(&self, save: u8) -> Option<Pos> {
        self.slots.get(save as usize).copied().flatten()
    }

    #[inline]
    pub fn set(&mut self, save: u8, pos: Pos) {
        if let Some(slot) = self.slots.get_mut(save as usize) {
            *slot = Some(pos);
        }
    }
}

/// Which subset of the condition list an invocation evaluates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EvalPass {
    /// Every condition.
    Full,
    /// Only `Cat48` conditions; `CatFull` conditions are presumed satisfied
    /// and record their area centre so later references stay defined.
    Prefix48,
    /// Only `CatFull` conditions; `Cat48` positions must already be in the
    /// state (from a `Prefix48` pass over the same 48-bit prefix).
    UpperOnly,
}

/// Per-item evaluator. Owns its generator view, which is dropped with the
/// evaluator at item end.
pub struct Evaluator<'c> {
    mc: i32,
    conds: &'c [Condition],
    world: Box<dyn WorldSource>,
}

impl<'c> Evaluator<'c> {
    pub fn new(backend: &dyn WorldBackend, mc: i32, conds: &'c [Condition]) -> Self {
        Self {
            mc,
            conds,
            world: backend.create(mc),
        }
    }

    pub fn mc(&self) -> i32 {
        self.mc
    }

    /// Test a seed against the condition list. Never panics or errors: any
    /// internal failure, including cancellation, collapses to `false`.
    ///
    /// A `Full` pass expects a fresh state: the 48-bit conditions run first
    /// so the cheap filters short-circuit before any full-seed generation,
    /// except where a reference chain forces one back into list order.
    pub fn test_seed(
        &mut self,
        seed: i64,
        state: &mut PositionalState,
        cancel: &AtomicBool,
        pass: EvalPass,
    ) -> bool {
        self.world.apply_seed(seed);

        if pass == EvalPass::Full {
            for c in self.conds {
                if cancel.load(Ordering::Relaxed) {
                    return false;
                }
                if c.kind.info().category != Category::Cat48 {
                    continue;
                }
                if c.relative != 0 && state.get(c.relative).is_none() {
                    // anchored on a full-seed condition; runs in list order
                    continue;
                }
                match self.test_cond(seed, c, state, cancel) {
                    Some(pos) => state.set(c.save, pos),
                    None => return false,
                }
            }
        }

        for c in self.conds {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            let cat = c.kind.info().category;
            match (pass, cat) {
                (EvalPass::Full, _) => {
                    if state.get(c.save).is_some() {
                        // satisfied in the 48-bit stage above
                        continue;
                    }
                }
                (EvalPass::Prefix48, Category::CatFull) => {
                    // presumed satisfied at this stage
                    if let Some(area) = self.effective_area(c, state) {
                        state.set(c.save, area.center());
                    }
                    continue;
                }
                (EvalPass::UpperOnly, Category::Cat48) => continue,
                _ => {}
            }
            match self.test_cond(seed, c, state, cancel) {
                Some(pos) => state.set(c.save, pos),
                None => return false,
            }
        }
        true
    }

    fn effective_area(&self, c: &Condition, state: &PositionalState) -> Option<Area> {
        let area = c.block_area();
        if c.relative == 0 {
            return Some(area);
        }
        // a missing source is a programmer error caught at config time;
        // collapse to a failed condition rather than panic
        let origin = state.get(c.relative)?;
        Some(area.offset(origin.x, origin.z))
    }

    /// Test one condition; `Some(pos)` carries the effective centre that
    /// later relative conditions anchor on.
    fn test_cond(
        &mut self,
        seed: i64,
        c: &Condition,
        state: &PositionalState,
        cancel: &AtomicBool,
    ) -> Option<Pos> {
        let area = self.effective_area(c, state)?;
        let kind = c.kind;

        if let Some(class) = QuadClass::from_kind(kind) {
            return self.find_quad_hut(seed, class, area, cancel);
        }
        if kind.is_quad_monument() {
            let frac = if kind == FilterKind::Qm95 { 0.95 } else { 0.90 };
            return self.find_quad_monument(seed, frac, area, cancel);
        }
        if kind.is_biome_filter() {
            let layer = kind.info().layer.expect("biome filters carry a layer");
            return self.check_biomes(c, layer, area, cancel);
        }
        if let Some(st) = kind.info().structure {
            return self.find_structures(seed, st, c, area, cancel);
        }

        match kind {
            FilterKind::Select => Some(area.center()),
            FilterKind::Temps => self.check_temps(c, area, cancel),
            FilterKind::Slime => self.find_slime(seed, c, area, cancel),
            FilterKind::Spawn => {
                let pos = self.world.spawn();
                area.contains(pos).then_some(pos)
            }
            FilterKind::Stronghold => self.find_strongholds(c, area, cancel),
            _ => None,
        }
    }

    fn find_quad_hut(
        &mut self,
        seed: i64,
        class: QuadClass,
        area: Area,
        cancel: &AtomicBool,
    ) -> Option<Pos> {
        let s48 = seed48(seed);
        let region_blocks = 32 * 16;
        let (lo, hi) = area.cell_range(region_blocks);
        for rx in (lo.x - 1)..=hi.x {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for rz in (lo.z - 1)..=hi.z {
                let huts = [
                    region_block_pos(s48, StructureKind::SwampHut, rx, rz)?,
                    region_block_pos(s48, StructureKind::SwampHut, rx + 1, rz)?,
                    region_block_pos(s48, StructureKind::SwampHut, rx, rz + 1)?,
                    region_block_pos(s48, StructureKind::SwampHut, rx + 1, rz + 1)?,
                ];
                let corner = Pos::new((rx + 1) * region_blocks, (rz + 1) * region_blocks);
                if let Some(afk) = check_quad_hut(class, &huts, corner) {
                    if area.contains(afk) {
                        return Some(afk);
                    }
                }
            }
        }
        None
    }

    fn find_quad_monument(
        &mut self,
        seed: i64,
        min_frac: f64,
        area: Area,
        cancel: &AtomicBool,
    ) -> Option<Pos> {
        let s48 = seed48(seed);
        let region_blocks = 32 * 16;
        let (lo, hi) = area.cell_range(region_blocks);
        for rx in (lo.x - 1)..=hi.x {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for rz in (lo.z - 1)..=hi.z {
                let mons = [
                    region_block_pos(s48, StructureKind::Monument, rx, rz)?,
                    region_block_pos(s48, StructureKind::Monument, rx + 1, rz)?,
                    region_block_pos(s48, StructureKind::Monument, rx, rz + 1)?,
                    region_block_pos(s48, StructureKind::Monument, rx + 1, rz + 1)?,
                ];
                if let Some(afk) = check_quad_monument(min_frac, &mons) {
                    if area.contains(afk) {
                        return Some(afk);
                    }
                }
            }
        }
        None
    }

    fn check_biomes(
        &mut self,
        c: &Condition,
        layer: Layer,
        area: Area,
        cancel: &AtomicBool,
    ) -> Option<Pos> {
        let ok = self.world.biome_filter_check(
            layer,
            area,
            (c.biome_incl, c.biome_incl_m),
            (c.biome_excl, c.biome_excl_m),
            cancel,
        )?;
        ok.then(|| area.center())
    }

    fn check_temps(&mut self, c: &Condition, area: Area, cancel: &AtomicBool) -> Option<Pos> {
        let (lo, hi) = area.cell_range(1024);
        let mut counts = [0u32; 9];
        let mut specials = 0u32;
        for cz in lo.z..=hi.z {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for cx in lo.x..=hi.x {
                let cat = self.world.temp_category(cx, cz);
                counts[cat as usize] += 1;
                if cat.is_special() {
                    specials += 1;
                }
            }
        }
        for i in 0..8 {
            if counts[i] < c.temps[i] {
                return None;
            }
        }
        if specials < c.temps[TempCat::Any as usize] {
            return None;
        }
        Some(area.center())
    }

    fn find_slime(&mut self, seed: i64, c: &Condition, area: Area, cancel: &AtomicBool) -> Option<Pos> {
        let (lo, hi) = area.cell_range(16);
        let required = c.count.max(1);
        let mut found = 0u32;
        let mut first = None;
        for cx in lo.x..=hi.x {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for cz in lo.z..=hi.z {
                if is_slime_chunk(seed, cx, cz) {
                    if first.is_none() {
                        first = Some(Pos::new(cx << 4, cz << 4));
                    }
                    found += 1;
                    if found >= required {
                        return first;
                    }
                }
            }
        }
        None
    }

    fn find_strongholds(&mut self, c: &Condition, area: Area, cancel: &AtomicBool) -> Option<Pos> {
        let required = c.count.max(1);
        let mut found = 0u32;
        let mut first = None;
        for pos in self.world.strongholds() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            if area.contains(pos) {
                if first.is_none() {
                    first = Some(pos);
                }
                found += 1;
                if found >= required {
                    return first;
                }
            }
        }
        None
    }

    fn find_structures(
        &mut self,
        seed: i64,
        st: StructureKind,
        c: &Condition,
        area: Area,
        cancel: &AtomicBool,
    ) -> Option<Pos> {
        let s48 = seed48(seed);
        let cfg = st.config();
        let cell = cfg.spacing * 16;
        let (lo, hi) = area.cell_range(cell);
        let required = c.count.max(1);
        let total_regions = ((hi.x - lo.x + 1) as i64) * ((hi.z - lo.z + 1) as i64);
        let mut remaining = total_regions;
        let mut found = 0u32;
        let mut first = None;

        // lexicographic (x, z) iteration fixes the recorded position
        for rx in lo.x..=hi.x {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for rz in lo.z..=hi.z {
                remaining -= 1;
                let pos = match region_block_pos(s48, st, rx, rz) {
                    Some(p) => p,
                    None => {
                        if (found as i64) + remaining < required as i64 {
                            return None;
                        }
                        continue;
                    }
                };
                let hit = area.contains(pos)
                    && self.world.structure_variant(st, pos).is_some();
                if hit {
                    if first.is_none() {
                        first = Some(pos);
                    }
                    found += 1;
                    if found >= required {
                        return first;
                    }
                } else if (found as i64) + remaining < required as i64 {
                    // not enough regions left to reach the required count
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::validate_conditions;
    use crate::gen::LayeredBackend;
    use crate::types::MC_1_16;

    fn eval<'a>(conds: &'a [Condition]) -> Evaluator<'a> {
        Evaluator::new(&LayeredBackend, MC_1_16, conds)
    }

    #[test]
    fn test_deterministic_verdict() {
        let conds = vec![
            Condition::new(FilterKind::SwampHut, 1).with_area(-4000, -4000, 4000, 4000)
        ];
        validate_conditions(&conds, MC_1_16).unwrap();
        let cancel = AtomicBool::new(false);
        let mut e = eval(&conds);
        for seed in [0i64, 1, -1, 123456789, i64::MIN + 5] {
            let a = e.test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full);
            let b = e.test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full);
            assert_eq!(a, b, "verdict flapped for seed {}", seed);
        }
    }

    #[test]
    fn test_cancel_collapses_to_false() {
        let conds =
            vec![Condition::new(FilterKind::Slime, 1).with_area(-100, -100, 100, 100)];
        let cancel = AtomicBool::new(true);
        let mut e = eval(&conds);
        assert!(!e.test_seed(1, &mut PositionalState::default(), &cancel, EvalPass::Full));
    }

    #[test]
    fn test_select_is_area_less_and_passes() {
        let conds = vec![Condition::new(FilterKind::Select, 1)];
        let cancel = AtomicBool::new(false);
        let mut e = eval(&conds);
        assert!(e.test_seed(7, &mut PositionalState::default(), &cancel, EvalPass::Full));
    }

    #[test]
    fn test_slime_count_requirement() {
        // a large area holds many slime chunks; an absurd count does not
        let mut few = Condition::new(FilterKind::Slime, 1).with_area(-64, -64, 64, 64);
        few.count = 1;
        let mut many = few;
        many.count = 1_000_000;
        let cancel = AtomicBool::new(false);
        let seed = 42;
        let conds_few = vec![few];
        let ok = eval(&conds_few)
            .test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full);
        assert!(ok);
        let conds_many = vec![many];
        let ok = eval(&conds_many)
            .test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full);
        assert!(!ok);
    }

    #[test]
    fn test_relative_condition_translates() {
        // condition 2 searches a window around wherever condition 1 matched
        let base = Condition::new(FilterKind::Slime, 1).with_area(-32, -32, 32, 32);
        let mut rel = Condition::new(FilterKind::Slime, 2).with_area(-8, -8, 8, 8);
        rel.relative = 1;
        let conds = vec![base, rel];
        validate_conditions(&conds, MC_1_16).unwrap();
        let cancel = AtomicBool::new(false);
        let mut e = eval(&conds);
        // over many seeds both unconditional pass and fail appear; the point
        // is that evaluation never panics and remains deterministic
        for seed in 0..50i64 {
            let mut s1 = PositionalState::default();
            let mut s2 = PositionalState::default();
            let a = e.test_seed(seed, &mut s1, &cancel, EvalPass::Full);
            let b = e.test_seed(seed, &mut s2, &cancel, EvalPass::Full);
            assert_eq!(a, b);
            if a {
                assert!(s1.get(1).is_some());
                assert!(s1.get(2).is_some());
            }
        }
    }

    #[test]
    fn test_prefix_pass_records_skipped_centres() {
        // CatFull condition in a Prefix48 pass records its area centre
        let conds = vec![
            Condition::new(FilterKind::Biome, 1).with_area(100, 200, 120, 220)
        ];
        let cancel = AtomicBool::new(false);
        let mut e = eval(&conds);
        let mut state = PositionalState::default();
        assert!(e.test_seed(99, &mut state, &cancel, EvalPass::Prefix48));
        assert_eq!(state.get(1), Some(Pos::new(110, 210)));
    }

    #[test]
    fn test_quad_hut_cat48_consistency() {
        // a quad-hut verdict must agree between the full seed and its prefix
        let conds = vec![
            Condition::new(FilterKind::QhBarely, 1).with_area(-10, -10, 10, 10)
        ];
        let cancel = AtomicBool::new(false);
        let mut e = eval(&conds);
        for prefix in 0..200u64 {
            let lo = prefix as i64;
            let hi = lo | (0x7A_i64 << 48);
            let a = e.test_seed(lo, &mut PositionalState::default(), &cancel, EvalPass::Full);
            let b = e.test_seed(hi, &mut PositionalState::default(), &cancel, EvalPass::Full);
            assert_eq!(a, b, "48-bit filter verdict depends on upper bits");
        }
    }
}
