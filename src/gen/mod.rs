//! Generator adapter.
//!
//! The world-generation library is an external collaborator; this module
//! pins down the capability set the search pipeline relies on and ships a
//! deterministic bundled backend. Workers construct one `WorldSource` per
//! work item through the `WorldBackend` factory, so generator state is
//! released on every exit path, including abort.

pub mod layered;
pub mod structures;

use std::sync::atomic::{AtomicBool, Ordering};

use crate::biome::{BiomeId, TempCat};
use crate::types::{Area, Pos};

pub use layered::LayeredBackend;
pub use structures::{
    is_slime_chunk, move_structure, region_block_pos, region_block_pos_salted, region_chunk_pos,
    region_chunk_pos_salted, JavaRandom, StructConfig, StructureKind,
};

/// Biome generation layers, identified by their blocks-per-cell scale.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Layer {
    Voronoi1,
    RiverMix4,
    Shore16,
    Sunflower64,
    Biome256,
    OceanTemp256,
}

impl Layer {
    /// Blocks per cell at this layer.
    pub fn scale(self) -> i32 {
        match self {
            Layer::Voronoi1 => 1,
            Layer::RiverMix4 => 4,
            Layer::Shore16 => 16,
            Layer::Sunflower64 => 64,
            Layer::Biome256 | Layer::OceanTemp256 => 256,
        }
    }

    /// True if the layer is a function of the lower 48 bits only.
    pub fn depends_on_48_only(self) -> bool {
        matches!(self, Layer::OceanTemp256)
    }
}

/// Resolved variant of a placed structure. `None` from
/// [`WorldSource::structure_variant`] means the position is not viable for
/// the full seed (wrong biome footprint).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Variant {
    Standard,
    /// Zombie villages.
    Abandoned,
}

/// A rectangular biome map in cell coordinates of one layer.
#[derive(Clone, Debug)]
pub struct BiomeMap {
    pub x: i32,
    pub z: i32,
    pub w: i32,
    pub h: i32,
    pub ids: Vec<BiomeId>,
}

impl BiomeMap {
    #[inline]
    pub fn get(&self, x: i32, z: i32) -> BiomeId {
        let ix = (x - self.x) as usize;
        let iz = (z - self.z) as usize;
        self.ids[iz * self.w as usize + ix]
    }
}

/// Capability contract over the generator library (one seeded world view).
///
/// Long-running calls poll the cancellation flag and bail out with `None`;
/// the evaluator maps that to a failed seed.
pub trait WorldSource: Send {
    fn mc(&self) -> i32;

    /// Re-key all layers for a new world seed.
    fn apply_seed(&mut self, seed: i64);

    fn seed(&self) -> i64;

    /// Generate the biome map for `w`×`h` cells at (x, z) in layer scale.
    fn gen_area(
        &mut self,
        layer: Layer,
        x: i32,
        z: i32,
        w: i32,
        h: i32,
        cancel: &AtomicBool,
    ) -> Option<BiomeMap>;

    /// World spawn position in blocks.
    fn spawn(&mut self) -> Pos;

    /// Stronghold positions, lazily, at most 128.
    fn strongholds(&mut self) -> Box<dyn Iterator<Item = Pos> + Send>;

    /// Temperature category of the 1024-block cell (cx, cz).
    fn temp_category(&mut self, cx: i32, cz: i32) -> TempCat;

    /// Whether the 48-bit placement at `pos` survives biome checks for the
    /// full seed, and with which variant.
    fn structure_variant(&mut self, kind: StructureKind, pos: Pos) -> Option<Variant>;

    /// Superset/disjointness test of the biome ids occurring in `area`
    /// against an include and an exclude mask pair.
    fn biome_filter_check(
        &mut self,
        layer: Layer,
        area: Area,
        include: (u64, u64),
        exclude: (u64, u64),
        cancel: &AtomicBool,
    ) -> Option<bool> {
        let scale = layer.scale();
        let (lo, hi) = area.cell_range(scale);
        let (w, h) = (hi.x - lo.x + 1, hi.z - lo.z + 1);
        let map = self.gen_area(layer, lo.x, lo.z, w, h, cancel)?;
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        let mut seen = crate::biome::BiomeSet::default();
        for &id in &map.ids {
            seen.insert(id);
        }
        Some(seen.contains_all(include.0, include.1) && seen.disjoint(exclude.0, exclude.1))
    }
}

/// Factory handed to worker threads; one source is created per work item.
pub trait WorldBackend: Send + Sync {
    fn create(&self, mc: i32) -> Box<dyn WorldSource>;
}
