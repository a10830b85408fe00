//! 48-bit structure placement.
//!
//! Structure positions are a pure function of the lower 48 bits of the world
//! seed: each structure kind owns a region grid and a salted linear
//! congruential generator that picks a chunk offset inside every region.
//! This is the arithmetic the Gen48 candidate source and the quad predicates
//! are built on, so it is implemented here rather than left to the backend.

use crate::types::{Pos, MASK48};

const LCG_MULT: i64 = 0x5DEECE66D;
const LCG_ADD: i64 = 0xB;

/// Region-seed multipliers. Translating a structure configuration by one
/// region along x or z shifts the seed by these constants.
pub const REGION_MX: i64 = 341873128712;
pub const REGION_MZ: i64 = 132897987541;

/// The Java `java.util.Random` sequence, 48 bits of state.
#[derive(Clone, Copy, Debug)]
pub struct JavaRandom {
    state: i64,
}

impl JavaRandom {
    pub fn with_seed(seed: i64) -> Self {
        Self {
            state: (seed ^ LCG_MULT) & MASK48 as i64,
        }
    }

    /// Seed the sequence for a structure region.
    pub fn with_region_seed(world: i64, rx: i32, rz: i32, salt: i64) -> Self {
        let s = (rx as i64)
            .wrapping_mul(REGION_MX)
            .wrapping_add((rz as i64).wrapping_mul(REGION_MZ))
            .wrapping_add(world)
            .wrapping_add(salt);
        Self::with_seed(s)
    }

    #[inline]
    fn next(&mut self, bits: u32) -> i32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULT)
            .wrapping_add(LCG_ADD)
            & MASK48 as i64;
        (self.state as u64 >> (48 - bits)) as i32
    }

    pub fn next_int(&mut self, n: i32) -> i32 {
        debug_assert!(n > 0);
        if n & (n - 1) == 0 {
            // power of two
            return ((n as i64).wrapping_mul(self.next(31) as i64) >> 31) as i32;
        }
        loop {
            let bits = self.next(31);
            let val = bits % n;
            if bits.wrapping_sub(val).wrapping_add(n - 1) >= 0 {
                return val;
            }
        }
    }

    pub fn next_float(&mut self) -> f32 {
        self.next(24) as f32 / (1u32 << 24) as f32
    }

    pub fn next_double(&mut self) -> f64 {
        let hi = (self.next(26) as i64) << 27;
        let lo = self.next(27) as i64;
        (hi + lo) as f64 / (1u64 << 53) as f64
    }
}

/// Structure kinds with placement on the 48-bit layer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
pub enum StructureKind {
    DesertPyramid = 0,
    JunglePyramid = 1,
    SwampHut = 2,
    Igloo = 3,
    Monument = 4,
    Village = 5,
    Outpost = 6,
    Mansion = 7,
    Treasure = 8,
    OceanRuin = 9,
    Shipwreck = 10,
    RuinedPortal = 11,
}

/// Placement parameters for one structure kind.
#[derive(Clone, Copy, Debug)]
pub struct StructConfig {
    pub salt: i64,
    /// Region edge length in chunks.
    pub spacing: i32,
    /// Chunk offset range inside a region (spacing - separation).
    pub range: i32,
    /// Large structures average two rolls per axis.
    pub avg2: bool,
    /// Per-chunk placement with a generation chance instead of a region grid.
    pub chance: Option<f32>,
}

impl StructureKind {
    pub fn config(self) -> StructConfig {
        use StructureKind::*;
        let (salt, spacing, range, avg2, chance) = match self {
            DesertPyramid => (14357617, 32, 24, false, None),
            Igloo => (14357618, 32, 24, false, None),
            JunglePyramid => (14357619, 32, 24, false, None),
            SwampHut => (14357620, 32, 24, false, None),
            Outpost => (165745296, 32, 24, false, None),
            Village => (10387312, 32, 24, false, None),
            Monument => (10387313, 32, 27, true, None),
            Mansion => (10387319, 80, 60, true, None),
            OceanRuin => (14357621, 20, 12, false, None),
            Shipwreck => (165745295, 24, 20, false, None),
            RuinedPortal => (34222645, 40, 25, false, None),
            Treasure => (10387320, 1, 1, false, Some(0.01)),
        };
        StructConfig {
            salt,
            spacing,
            range,
            avg2,
            chance,
        }
    }
}

/// Chunk position of the structure in region (rx, rz), if one generates
/// there at the 48-bit level. Position gating above this layer (biome
/// viability) is the backend's job.
pub fn region_chunk_pos(seed48: u64, kind: StructureKind, rx: i32, rz: i32) -> Option<Pos> {
    region_chunk_pos_salted(seed48, kind, rx, rz, 0)
}

/// Like [`region_chunk_pos`] with an extra salt added to the structure's
/// own; the Gen48 generator searches salted configurations through this.
pub fn region_chunk_pos_salted(
    seed48: u64,
    kind: StructureKind,
    rx: i32,
    rz: i32,
    extra_salt: i64,
) -> Option<Pos> {
    let cfg = kind.config();
    let cfg = StructConfig {
        salt: cfg.salt.wrapping_add(extra_salt),
        ..cfg
    };
    let world = seed48 as i64;

    if let Some(chance) = cfg.chance {
        // chunk-granular structures: region coords are chunk coords
        let mut rng = JavaRandom::with_region_seed(world, rx, rz, cfg.salt);
        if rng.next_float() >= chance {
            return None;
        }
        return Some(Pos::new(rx, rz));
    }

    let mut rng = JavaRandom::with_region_seed(world, rx, rz, cfg.salt);
    let (ox, oz) = if cfg.avg2 {
        let x = (rng.next_int(cfg.range) + rng.next_int(cfg.range)) / 2;
        let z = (rng.next_int(cfg.range) + rng.next_int(cfg.range)) / 2;
        (x, z)
    } else {
        (rng.next_int(cfg.range), rng.next_int(cfg.range))
    };

    let pos = Pos::new(rx * cfg.spacing + ox, rz * cfg.spacing + oz);

    if kind == StructureKind::Outpost {
        // outposts roll an extra sparseness gate on their chunk
        let mut gate = JavaRandom::with_region_seed(world, pos.x, pos.z, cfg.salt + 1);
        if gate.next_int(5) != 0 {
            return None;
        }
    }

    Some(pos)
}

/// Block position of the structure anchor in region (rx, rz).
pub fn region_block_pos(seed48: u64, kind: StructureKind, rx: i32, rz: i32) -> Option<Pos> {
    region_chunk_pos(seed48, kind, rx, rz).map(|c| Pos::new(c.x << 4, c.z << 4))
}

/// Block position of the structure anchor with an extra salt.
pub fn region_block_pos_salted(
    seed48: u64,
    kind: StructureKind,
    rx: i32,
    rz: i32,
    extra_salt: i64,
) -> Option<Pos> {
    region_chunk_pos_salted(seed48, kind, rx, rz, extra_salt).map(|c| Pos::new(c.x << 4, c.z << 4))
}

/// Translate a structure base seed so that a configuration at region (0, 0)
/// appears at region (rx, rz) instead.
pub fn move_structure(seed48: u64, rx: i32, rz: i32) -> u64 {
    (seed48 as i64)
        .wrapping_sub((rx as i64).wrapping_mul(REGION_MX))
        .wrapping_sub((rz as i64).wrapping_mul(REGION_MZ)) as u64
        & MASK48
}

/// The slime-chunk predicate for chunk (cx, cz).
pub fn is_slime_chunk(seed: i64, cx: i32, cz: i32) -> bool {
    let cx = cx as i64;
    let cz = cz as i64;
    let s = seed
        .wrapping_add(cx.wrapping_mul(cx).wrapping_mul(4987142))
        .wrapping_add(cx.wrapping_mul(5947611))
        .wrapping_add(cz.wrapping_mul(cz).wrapping_mul(4392871))
        .wrapping_add(cz.wrapping_mul(389711))
        ^ 0x3ad8025f;
    JavaRandom::with_seed(s).next_int(10) == 0
}
