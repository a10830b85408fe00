//! Bundled deterministic world backend.
//!
//! Stands in for the external generator library behind the [`WorldSource`]
//! trait. Structure placement is the real 48-bit arithmetic from
//! [`super::structures`]; the biome field is a layered hash lattice that
//! honours the contract the pipeline depends on: per-seed determinism,
//! coherent refinement across scales, and an ocean-temperature layer that is
//! a function of the lower 48 bits only.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::biome::{self, BiomeId, TempCat};
use crate::types::{seed48, Pos, MASK48};

use super::{BiomeMap, JavaRandom, Layer, StructureKind, Variant, WorldBackend, WorldSource};

const SALT_CLIMATE: u64 = 0x9E3779B97F4A7C15;
const SALT_LAND: u64 = 0xC2B2AE3D27D4EB4F;
const SALT_OTEMP: u64 = 0x165667B19E3779F9;
const SALT_PICK: u64 = 0x27D4EB2F165667C5;
const SALT_RARE: u64 = 0x85EBCA77C2B2AE63;
const SALT_RIVER: u64 = 0xFF51AFD7ED558CCD;
const SALT_VORONOI: u64 = 0xC4CEB9FE1A85EC53;
const SALT_SPAWN: u64 = 0xD6E8FEB86659FD93;

#[inline]
fn mix(seed: u64, salt: u64, x: i32, z: i32) -> u64 {
    let mut h = seed ^ salt;
    h = h.wrapping_add(x as u32 as u64).wrapping_mul(0xBF58476D1CE4E5B9);
    h ^= h >> 27;
    h = h.wrapping_add((z as u32 as u64) << 32).wrapping_mul(0x94D049BB133111EB);
    h ^= h >> 31;
    h
}

/// Uniform pick from a slice keyed by a hash.
#[inline]
fn pick<T: Copy>(h: u64, items: &[T]) -> T {
    items[(h % items.len() as u64) as usize]
}

pub struct LayeredWorld {
    mc: i32,
    seed: i64,
}

impl LayeredWorld {
    pub fn new(mc: i32, seed: i64) -> Self {
        Self { mc, seed }
    }

    /// Temperature category lattice at scale 1:1024.
    fn climate(&self, cx: i32, cz: i32) -> TempCat {
        let h = mix(self.seed as u64, SALT_CLIMATE, cx, cz);
        let cat = match h % 100 {
            0..=24 => TempCat::Lush,
            25..=44 => TempCat::Warm,
            45..=69 => TempCat::Cold,
            70..=84 => TempCat::Freezing,
            _ => TempCat::Oceanic,
        };
        // a small slice of land cells carries the special variant
        if (h >> 32) % 13 == 0 {
            match cat {
                TempCat::Warm => TempCat::SpecialWarm,
                TempCat::Lush => TempCat::SpecialLush,
                TempCat::Cold => TempCat::SpecialCold,
                other => other,
            }
        } else {
            cat
        }
    }

    /// Ocean temperature at 1:256, keyed by the lower 48 bits only.
    fn ocean_temp_256(&self, x: i32, z: i32) -> BiomeId {
        // coarse lattice keeps neighbouring cells coherent
        let h = mix(seed48(self.seed) & MASK48, SALT_OTEMP, x >> 2, z >> 2);
        let jitter = mix(seed48(self.seed) & MASK48, SALT_OTEMP ^ 0xABCD, x, z);
        let band = ((h % 5) as i64 + (jitter % 3) as i64 - 1).clamp(0, 4);
        match band {
            0 => biome::FROZEN_OCEAN,
            1 => biome::COLD_OCEAN,
            2 => biome::OCEAN,
            3 => biome::LUKEWARM_OCEAN,
            _ => biome::WARM_OCEAN,
        }
    }

    fn biome_256(&self, x: i32, z: i32) -> BiomeId {
        let land = mix(self.seed as u64, SALT_LAND, x, z);
        if land % 16 < 6 {
            // ocean cell: temperature from the 48-bit layer, depth from the
            // full seed, with a rare mushroom island override
            if (land >> 24) % 512 == 0 {
                return biome::MUSHROOM_FIELDS;
            }
            let t = self.ocean_temp_256(x, z);
            if (land >> 16) % 3 == 0 {
                return match t {
                    biome::FROZEN_OCEAN => biome::DEEP_FROZEN_OCEAN,
                    biome::COLD_OCEAN => biome::DEEP_COLD_OCEAN,
                    biome::LUKEWARM_OCEAN => biome::DEEP_LUKEWARM_OCEAN,
                    biome::WARM_OCEAN => biome::DEEP_WARM_OCEAN,
                    _ => biome::DEEP_OCEAN,
                };
            }
            return t;
        }
        let h = mix(self.seed as u64, SALT_PICK, x, z);
        match self.climate(x >> 2, z >> 2) {
            TempCat::Warm => pick(h, &[biome::DESERT, biome::SAVANNA, biome::PLAINS]),
            TempCat::SpecialWarm => pick(h, &[biome::BADLANDS, biome::DESERT]),
            TempCat::Lush => pick(
                h,
                &[
                    biome::PLAINS,
                    biome::FOREST,
                    biome::BIRCH_FOREST,
                    biome::SWAMP,
                    biome::DARK_FOREST,
                ],
            ),
            TempCat::SpecialLush => pick(h, &[biome::JUNGLE, biome::JUNGLE_EDGE]),
            TempCat::Cold => pick(h, &[biome::MOUNTAINS, biome::TAIGA, biome::FOREST]),
            TempCat::SpecialCold => pick(h, &[biome::GIANT_TREE_TAIGA, biome::TAIGA]),
            TempCat::Freezing => pick(h, &[biome::SNOWY_TUNDRA, biome::SNOWY_TAIGA]),
            TempCat::Oceanic | TempCat::Any => biome::OCEAN,
        }
    }

    fn biome_64(&self, x: i32, z: i32) -> BiomeId {
        let parent = self.biome_256(x >> 2, z >> 2);
        let h = mix(self.seed as u64, SALT_RARE, x, z);
        if h % 64 == 0 {
            match parent {
                biome::JUNGLE => return biome::BAMBOO_JUNGLE,
                biome::PLAINS => return biome::PLAINS + biome::MODIFIED_OFFSET,
                biome::SWAMP => return biome::SWAMP + biome::MODIFIED_OFFSET,
                _ => {}
            }
        }
        parent
    }

    fn biome_16(&self, x: i32, z: i32) -> BiomeId {
        let own = self.biome_64(x >> 2, z >> 2);
        // shoreline where land touches ocean in the parent lattice
        let land = !is_ocean(own);
        if land {
            for (dx, dz) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let n = self.biome_64((x + dx) >> 2, (z + dz) >> 2);
                if is_ocean(n) {
                    return match own {
                        biome::MUSHROOM_FIELDS => biome::MUSHROOM_FIELD_SHORE,
                        biome::MOUNTAINS => biome::STONE_SHORE,
                        biome::SNOWY_TUNDRA | biome::SNOWY_TAIGA => biome::SNOWY_BEACH,
                        _ => biome::BEACH,
                    };
                }
            }
        }
        own
    }

    fn biome_4(&self, x: i32, z: i32) -> BiomeId {
        let own = self.biome_16(x >> 2, z >> 2);
        let h = mix(self.seed as u64, SALT_RIVER, x >> 1, z >> 1);
        if !is_ocean(own) && h % 24 == 0 {
            return if matches!(own, biome::SNOWY_TUNDRA | biome::SNOWY_TAIGA) {
                biome::FROZEN_RIVER
            } else {
                biome::RIVER
            };
        }
        own
    }

    fn biome_1(&self, x: i32, z: i32) -> BiomeId {
        // voronoi-style jitter of the 1:4 lattice
        let h = mix(self.seed as u64, SALT_VORONOI, x, z);
        let jx = (h & 3) as i32 - 1;
        let jz = ((h >> 2) & 3) as i32 - 1;
        self.biome_4((x + jx) >> 2, (z + jz) >> 2)
    }

    fn cell(&self, layer: Layer, x: i32, z: i32) -> BiomeId {
        match layer {
            Layer::Voronoi1 => self.biome_1(x, z),
            Layer::RiverMix4 => self.biome_4(x, z),
            Layer::Shore16 => self.biome_16(x, z),
            Layer::Sunflower64 => self.biome_64(x, z),
            Layer::Biome256 => self.biome_256(x, z),
            Layer::OceanTemp256 => self.ocean_temp_256(x, z),
        }
    }
}

#[inline]
pub fn is_ocean(id: BiomeId) -> bool {
    matches!(
        id,
        biome::OCEAN
            | biome::FROZEN_OCEAN
            | biome::WARM_OCEAN
            | biome::LUKEWARM_OCEAN
            | biome::COLD_OCEAN
            | biome::DEEP_OCEAN
            | biome::DEEP_WARM_OCEAN
            | biome::DEEP_LUKEWARM_OCEAN
            | biome::DEEP_COLD_OCEAN
            | biome::DEEP_FROZEN_OCEAN
    )
}

impl WorldSource for LayeredWorld {
    fn mc(&self) -> i32 {
        self.mc
    }

    fn apply_seed(&mut self, seed: i64) {
        self.seed = seed;
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn gen_area(
        &mut self,
        layer: Layer,
        x: i32,
        z: i32,
        w: i32,
        h: i32,
        cancel: &AtomicBool,
    ) -> Option<BiomeMap> {
        let mut ids = Vec::with_capacity((w as usize) * (h as usize));
        for iz in 0..h {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            for ix in 0..w {
                ids.push(self.cell(layer, x + ix, z + iz));
            }
        }
        Some(BiomeMap { x, z, w, h, ids })
    }

    fn spawn(&mut self) -> Pos {
        let h = mix(self.seed as u64, SALT_SPAWN, 0, 0);
        let x = ((h & 0x7FF) as i32 - 1024) & !3;
        let z = (((h >> 16) & 0x7FF) as i32 - 1024) & !3;
        Pos::new(x, z)
    }

    fn strongholds(&mut self) -> Box<dyn Iterator<Item = Pos> + Send> {
        Box::new(StrongholdIter::new(self.seed))
    }

    fn temp_category(&mut self, cx: i32, cz: i32) -> TempCat {
        self.climate(cx, cz)
    }

    fn structure_variant(&mut self, kind: StructureKind, pos: Pos) -> Option<Variant> {
        let b = self.biome_4(pos.x >> 2, pos.z >> 2);
        let viable = match kind {
            StructureKind::DesertPyramid => b == biome::DESERT,
            StructureKind::JunglePyramid => {
                b == biome::JUNGLE || b == biome::BAMBOO_JUNGLE
            }
            StructureKind::SwampHut => b == biome::SWAMP,
            StructureKind::Igloo => {
                b == biome::SNOWY_TUNDRA || b == biome::SNOWY_TAIGA
            }
            StructureKind::Monument => matches!(
                b,
                biome::DEEP_OCEAN
                    | biome::DEEP_COLD_OCEAN
                    | biome::DEEP_LUKEWARM_OCEAN
                    | biome::DEEP_FROZEN_OCEAN
                    | biome::DEEP_WARM_OCEAN
            ),
            StructureKind::Village | StructureKind::Outpost => matches!(
                b,
                biome::PLAINS | biome::DESERT | biome::SAVANNA | biome::TAIGA | biome::SNOWY_TUNDRA
            ),
            StructureKind::Mansion => b == biome::DARK_FOREST,
            StructureKind::Treasure => {
                b == biome::BEACH || b == biome::SNOWY_BEACH
            }
            StructureKind::OceanRuin | StructureKind::Shipwreck => is_ocean(b),
            StructureKind::RuinedPortal => true,
        };
        if !viable {
            return None;
        }
        if kind == StructureKind::Village {
            let mut rng =
                JavaRandom::with_region_seed(self.seed, pos.x >> 4, pos.z >> 4, 10387312);
            if rng.next_float() < 0.02 {
                return Some(Variant::Abandoned);
            }
        }
        Some(Variant::Standard)
    }
}

/// Strongholds generate on concentric rings; 128 in total.
struct StrongholdIter {
    rng: JavaRandom,
    angle: f64,
    ring: usize,
    in_ring: u32,
    emitted: u32,
}

/// Strongholds per ring, innermost first.
const RING_COUNTS: [u32; 8] = [3, 6, 10, 15, 21, 28, 36, 9];

impl StrongholdIter {
    fn new(seed: i64) -> Self {
        let mut rng = JavaRandom::with_seed(seed);
        let angle = rng.next_double() * std::f64::consts::TAU;
        Self {
            rng,
            angle,
            ring: 0,
            in_ring: 0,
            emitted: 0,
        }
    }
}

impl Iterator for StrongholdIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        if self.emitted >= 128 {
            return None;
        }
        while self.in_ring >= RING_COUNTS[self.ring] {
            self.ring += 1;
            self.in_ring = 0;
            if self.ring >= RING_COUNTS.len() {
                return None;
            }
        }
        let count = RING_COUNTS[self.ring];
        let dist_chunks =
            (4.0 * 32.0) + (self.ring as f64 * 6.0 * 32.0) + (self.rng.next_double() - 0.5) * 32.0 * 2.5;
        let theta = self.angle + std::f64::consts::TAU * self.in_ring as f64 / count as f64;
        let x = ((theta.cos() * dist_chunks).round() as i32) << 4;
        let z = ((theta.sin() * dist_chunks).round() as i32) << 4;
        self.in_ring += 1;
        self.emitted += 1;
        if self.in_ring == count {
            // rings are rotated against each other
            self.angle += self.rng.next_double() * std::f64::consts::TAU;
        }
        Some(Pos::new(x, z))
    }
}

/// Backend factory for the bundled world model.
#[derive(Default, Clone, Copy)]
pub struct LayeredBackend;

impl WorldBackend for LayeredBackend {
    fn create(&self, mc: i32) -> Box<dyn WorldSource> {
        Box::new(LayeredWorld::new(mc, 0))
    }
}
