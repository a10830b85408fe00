//! Static catalogue of filter kinds.

use once_cell::sync::Lazy;

use crate::gen::{Layer, StructureKind};
use crate::types::{MC_1_0, MC_1_11, MC_1_13, MC_1_14, MC_1_16, MC_1_3, MC_1_4, MC_1_7, MC_1_8, MC_1_9};

/// Seed-source category of a filter: `Cat48` kinds are a function of the
/// lower 48 bits only and are evaluated before any `CatFull` kind.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    None,
    Cat48,
    CatFull,
}

/// Filter kinds. Discriminants are stable; they appear in the condition
/// record encoding and must never be reordered.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u16)]
pub enum FilterKind {
    Select = 0,
    QhIdeal = 1,
    QhClassic = 2,
    QhNormal = 3,
    QhBarely = 4,
    Qm95 = 5,
    Qm90 = 6,
    Biome = 7,
    Biome4River = 8,
    Biome16Shore = 9,
    Biome64Rare = 10,
    Biome256Biome = 11,
    Biome256Otemp = 12,
    Temps = 13,
    Slime = 14,
    Spawn = 15,
    Stronghold = 16,
    DesertPyramid = 17,
    JunglePyramid = 18,
    SwampHut = 19,
    Igloo = 20,
    Monument = 21,
    Village = 22,
    Outpost = 23,
    Mansion = 24,
    Treasure = 25,
    OceanRuin = 26,
    Shipwreck = 27,
    RuinedPortal = 28,
}

pub const FILTER_KIND_MAX: u16 = 29;

impl FilterKind {
    pub fn from_u16(v: u16) -> Option<Self> {
        use FilterKind::*;
        Some(match v {
            0 => Select,
            1 => QhIdeal,
            2 => QhClassic,
            3 => QhNormal,
            4 => QhBarely,
            5 => Qm95,
            6 => Qm90,
            7 => Biome,
            8 => Biome4River,
            9 => Biome16Shore,
            10 => Biome64Rare,
            11 => Biome256Biome,
            12 => Biome256Otemp,
            13 => Temps,
            14 => Slime,
            15 => Spawn,
            16 => Stronghold,
            17 => DesertPyramid,
            18 => JunglePyramid,
            19 => SwampHut,
            20 => Igloo,
            21 => Monument,
            22 => Village,
            23 => Outpost,
            24 => Mansion,
            25 => Treasure,
            26 => OceanRuin,
            27 => Shipwreck,
            28 => RuinedPortal,
            _ => return None,
        })
    }

    #[inline]
    pub fn info(self) -> &'static FilterInfo {
        &FILTER_TABLE[self as usize]
    }

    pub fn is_quad_hut(self) -> bool {
        matches!(
            self,
            Self::QhIdeal | Self::QhClassic | Self::QhNormal | Self::QhBarely
        )
    }

    pub fn is_quad_monument(self) -> bool {
        matches!(self, Self::Qm95 | Self::Qm90)
    }

    pub fn is_biome_filter(self) -> bool {
        (Self::Biome as u16..=Self::Biome256Otemp as u16).contains(&(self as u16))
    }
}

/// Per-kind metadata record.
pub struct FilterInfo {
    pub kind: FilterKind,
    pub category: Category,
    pub needs_coord: bool,
    pub needs_area: bool,
    pub layer: Option<Layer>,
    pub structure: Option<StructureKind>,
    /// Blocks per condition coordinate unit.
    pub step: i32,
    pub mc_min: i32,
    pub icon: Option<&'static str>,
    pub name: &'static str,
    pub description: &'static str,
}

macro_rules! finfo {
    ($kind:expr, $cat:expr, $coord:expr, $area:expr, $layer:expr, $st:expr,
     $step:expr, $mc:expr, $icon:expr, $name:expr, $desc:expr) => {
        FilterInfo {
            kind: $kind,
            category: $cat,
            needs_coord: $coord,
            needs_area: $area,
            layer: $layer,
            structure: $st,
            step: $step,
            mc_min: $mc,
            icon: $icon,
            name: $name,
            description: $desc,
        }
    };
}

pub static FILTER_TABLE: Lazy<Vec<FilterInfo>> = Lazy::new(|| {
    use Category::*;
    use FilterKind as F;
    use StructureKind as S;
    vec![
        finfo!(F::Select, None, false, false, Option::None, Option::None, 0, MC_1_0, Option::None, "", ""),
        finfo!(
            F::QhIdeal, Cat48, true, true, Option::None, Some(S::SwampHut), 512, MC_1_4,
            Some(":icons/quad.png"),
            "Quad-hut (ideal)",
            "The lower 48 bits admit four swamp huts in spawning range in one \
             of the best configurations that exist."
        ),
        finfo!(
            F::QhClassic, Cat48, true, true, Option::None, Some(S::SwampHut), 512, MC_1_4,
            Some(":icons/quad.png"),
            "Quad-hut (classic)",
            "The lower 48 bits admit four swamp huts in the nearest 2x2 chunk \
             corners of each region."
        ),
        finfo!(
            F::QhNormal, Cat48, true, true, Option::None, Some(S::SwampHut), 512, MC_1_4,
            Some(":icons/quad.png"),
            "Quad-hut (normal)",
            "The lower 48 bits admit four swamp huts within 128 blocks of a \
             single AFK location, with vertical tolerance for a fall-damage \
             chute."
        ),
        finfo!(
            F::QhBarely, Cat48, true, true, Option::None, Some(S::SwampHut), 512, MC_1_4,
            Some(":icons/quad.png"),
            "Quad-hut (barely)",
            "The lower 48 bits admit four swamp huts whose bounding boxes are \
             within 128 blocks of a single AFK location."
        ),
        finfo!(
            F::Qm95, Cat48, true, true, Option::None, Some(S::Monument), 512, MC_1_8,
            Some(":icons/quad.png"),
            "Quad-ocean-monument (>95%)",
            "The lower 48 bits admit four ocean monuments with 95% of their \
             area within 128 blocks of an AFK location."
        ),
        finfo!(
            F::Qm90, Cat48, true, true, Option::None, Some(S::Monument), 512, MC_1_8,
            Some(":icons/quad.png"),
            "Quad-ocean-monument (>90%)",
            "The lower 48 bits admit four ocean monuments with 90% of their \
             area within 128 blocks of an AFK location."
        ),
        finfo!(
            F::Biome, CatFull, true, true, Some(Layer::Voronoi1), Option::None, 1, MC_1_0,
            Some(":icons/map.png"),
            "Biome filter 1:1",
            "Seeds with all included (+) biomes and no excluded (-) biomes in \
             the area."
        ),
        finfo!(
            F::Biome4River, CatFull, true, true, Some(Layer::RiverMix4), Option::None, 4, MC_1_0,
            Some(":icons/map.png"),
            "Biome filter 1:4 RIVER",
            "Biome check at the RIVER layer, scale 1:4."
        ),
        finfo!(
            F::Biome16Shore, CatFull, true, true, Some(Layer::Shore16), Option::None, 16, MC_1_0,
            Some(":icons/map.png"),
            "Biome filter 1:16 SHORE",
            "Biome check at the SHORE layer, scale 1:16."
        ),
        finfo!(
            F::Biome64Rare, CatFull, true, true, Some(Layer::Sunflower64), Option::None, 64, MC_1_7,
            Some(":icons/map.png"),
            "Biome filter 1:64 RARE",
            "Biome check at the RARE_BIOME layer, scale 1:64."
        ),
        finfo!(
            F::Biome256Biome, CatFull, true, true, Some(Layer::Biome256), Option::None, 256, MC_1_0,
            Some(":icons/map.png"),
            "Biome filter 1:256 BIOME",
            "Biome check at the BIOME layer, scale 1:256."
        ),
        finfo!(
            F::Biome256Otemp, Cat48, true, true, Some(Layer::OceanTemp256), Option::None, 256,
            MC_1_13,
            Some(":icons/map.png"),
            "Biome filter 1:256 O.TEMP",
            "Biome check at the OCEAN TEMPERATURE layer, scale 1:256. This \
             layer depends only on the lower 48 bits of the seed."
        ),
        finfo!(
            F::Temps, CatFull, true, true, Option::None, Option::None, 1024, MC_1_7,
            Some(":icons/tempcat.png"),
            "Temperature categories",
            "Requires a minimum number of cells of each required temperature \
             category in the area."
        ),
        finfo!(F::Slime, CatFull, true, true, Option::None, Option::None, 16, MC_1_0, Some(":icons/slime.png"), "Slime chunk", ""),
        finfo!(F::Spawn, CatFull, true, true, Option::None, Option::None, 1, MC_1_0, Some(":icons/spawn.png"), "Spawn", ""),
        finfo!(F::Stronghold, CatFull, true, true, Option::None, Option::None, 1, MC_1_0, Some(":icons/stronghold.png"), "Stronghold", ""),
        finfo!(
            F::DesertPyramid, CatFull, true, true, Option::None, Some(S::DesertPyramid), 1, MC_1_3,
            Some(":icons/desert.png"),
            "Desert pyramid", ""
        ),
        finfo!(
            F::JunglePyramid, CatFull, true, true, Option::None, Some(S::JunglePyramid), 1, MC_1_3,
            Some(":icons/jungle.png"),
            "Jungle temple", ""
        ),
        finfo!(
            F::SwampHut, CatFull, true, true, Option::None, Some(S::SwampHut), 1, MC_1_4,
            Some(":icons/hut.png"),
            "Swamp hut", ""
        ),
        finfo!(
            F::Igloo, CatFull, true, true, Option::None, Some(S::Igloo), 1, MC_1_9,
            Some(":icons/igloo.png"),
            "Igloo", ""
        ),
        finfo!(
            F::Monument, CatFull, true, true, Option::None, Some(S::Monument), 1, MC_1_8,
            Some(":icons/monument.png"),
            "Ocean monument", ""
        ),
        finfo!(
            F::Village, CatFull, true, true, Option::None, Some(S::Village), 1, MC_1_0,
            Some(":icons/village.png"),
            "Village", ""
        ),
        finfo!(
            F::Outpost, CatFull, true, true, Option::None, Some(S::Outpost), 1, MC_1_14,
            Some(":icons/outpost.png"),
            "Pillager outpost", ""
        ),
        finfo!(
            F::Mansion, CatFull, true, true, Option::None, Some(S::Mansion), 1, MC_1_11,
            Some(":icons/mansion.png"),
            "Woodland mansion", ""
        ),
        finfo!(
            F::Treasure, CatFull, true, true, Option::None, Some(S::Treasure), 1, MC_1_13,
            Some(":icons/treasure.png"),
            "Buried treasure", ""
        ),
        finfo!(
            F::OceanRuin, CatFull, true, true, Option::None, Some(S::OceanRuin), 1, MC_1_13,
            Some(":icons/ruins.png"),
            "Ocean ruins", ""
        ),
        finfo!(
            F::Shipwreck, CatFull, true, true, Option::None, Some(S::Shipwreck), 1, MC_1_13,
            Some(":icons/shipwreck.png"),
            "Shipwreck", ""
        ),
        finfo!(
            F::RuinedPortal, CatFull, true, true, Option::None, Some(S::RuinedPortal), 1, MC_1_16,
            Some(":icons/portal.png"),
            "Ruined portal", ""
        ),
    ]
});
