//! Biome identifiers and the temperature-category mapping.
//!
//! Biome ids follow the classic numeric table: base biomes occupy 0..63 and
//! "modified" mutations are the base id + 128. Biome-filter conditions carry
//! two 64-bit masks per polarity, one for base ids and one for mutations.

pub type BiomeId = i32;

pub const OCEAN: BiomeId = 0;
pub const PLAINS: BiomeId = 1;
pub const DESERT: BiomeId = 2;
pub const MOUNTAINS: BiomeId = 3;
pub const FOREST: BiomeId = 4;
pub const TAIGA: BiomeId = 5;
pub const SWAMP: BiomeId = 6;
pub const RIVER: BiomeId = 7;
pub const FROZEN_OCEAN: BiomeId = 10;
pub const FROZEN_RIVER: BiomeId = 11;
pub const SNOWY_TUNDRA: BiomeId = 12;
pub const MUSHROOM_FIELDS: BiomeId = 14;
pub const MUSHROOM_FIELD_SHORE: BiomeId = 15;
pub const BEACH: BiomeId = 16;
pub const JUNGLE: BiomeId = 21;
pub const JUNGLE_EDGE: BiomeId = 23;
pub const DEEP_OCEAN: BiomeId = 24;
pub const STONE_SHORE: BiomeId = 25;
pub const SNOWY_BEACH: BiomeId = 26;
pub const BIRCH_FOREST: BiomeId = 27;
pub const DARK_FOREST: BiomeId = 29;
pub const SNOWY_TAIGA: BiomeId = 30;
pub const GIANT_TREE_TAIGA: BiomeId = 32;
pub const SAVANNA: BiomeId = 35;
pub const BADLANDS: BiomeId = 37;
pub const WARM_OCEAN: BiomeId = 44;
pub const LUKEWARM_OCEAN: BiomeId = 45;
pub const COLD_OCEAN: BiomeId = 46;
pub const DEEP_WARM_OCEAN: BiomeId = 47;
pub const DEEP_LUKEWARM_OCEAN: BiomeId = 48;
pub const DEEP_COLD_OCEAN: BiomeId = 49;
pub const DEEP_FROZEN_OCEAN: BiomeId = 50;
pub const BAMBOO_JUNGLE: BiomeId = 168;

/// Offset of mutated biome variants.
pub const MODIFIED_OFFSET: BiomeId = 128;

const BIOME_NAMES: &[(BiomeId, &str)] = &[
    (OCEAN, "ocean"),
    (PLAINS, "plains"),
    (DESERT, "desert"),
    (MOUNTAINS, "mountains"),
    (FOREST, "forest"),
    (TAIGA, "taiga"),
    (SWAMP, "swamp"),
    (RIVER, "river"),
    (FROZEN_OCEAN, "frozen_ocean"),
    (FROZEN_RIVER, "frozen_river"),
    (SNOWY_TUNDRA, "snowy_tundra"),
    (MUSHROOM_FIELDS, "mushroom_fields"),
    (MUSHROOM_FIELD_SHORE, "mushroom_field_shore"),
    (BEACH, "beach"),
    (JUNGLE, "jungle"),
    (JUNGLE_EDGE, "jungle_edge"),
    (DEEP_OCEAN, "deep_ocean"),
    (STONE_SHORE, "stone_shore"),
    (SNOWY_BEACH, "snowy_beach"),
    (BIRCH_FOREST, "birch_forest"),
    (DARK_FOREST, "dark_forest"),
    (SNOWY_TAIGA, "snowy_taiga"),
    (GIANT_TREE_TAIGA, "giant_tree_taiga"),
    (SAVANNA, "savanna"),
    (BADLANDS, "badlands"),
    (WARM_OCEAN, "warm_ocean"),
    (LUKEWARM_OCEAN, "lukewarm_ocean"),
    (COLD_OCEAN, "cold_ocean"),
    (DEEP_WARM_OCEAN, "deep_warm_ocean"),
    (DEEP_LUKEWARM_OCEAN, "deep_lukewarm_ocean"),
    (DEEP_COLD_OCEAN, "deep_cold_ocean"),
    (DEEP_FROZEN_OCEAN, "deep_frozen_ocean"),
    (BAMBOO_JUNGLE, "bamboo_jungle"),
];

pub fn biome2str(id: BiomeId) -> Option<&'static str> {
    BIOME_NAMES.iter().find(|(b, _)| *b == id).map(|(_, s)| *s)
}

pub fn str2biome(s: &str) -> Option<BiomeId> {
    BIOME_NAMES.iter().find(|(_, n)| *n == s).map(|(b, _)| *b)
}

/// Accumulated include/exclude masks over a generated biome map.
/// Base biomes set bits in `base`, mutated variants in `modified`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BiomeSet {
    pub base: u64,
    pub modified: u64,
}

impl BiomeSet {
    pub fn insert(&mut self, id: BiomeId) {
        if (0..64).contains(&id) {
            self.base |= 1u64 << id;
        } else if (MODIFIED_OFFSET..MODIFIED_OFFSET + 64).contains(&id) {
            self.modified |= 1u64 << (id - MODIFIED_OFFSET);
        }
    }

    /// True if every bit of `mask` is present in this set.
    pub fn contains_all(&self, base: u64, modified: u64) -> bool {
        self.base & base == base && self.modified & modified == modified
    }

    /// True if no bit of `mask` is present in this set.
    pub fn disjoint(&self, base: u64, modified: u64) -> bool {
        self.base & base == 0 && self.modified & modified == 0
    }
}

/// Temperature categories at scale 1:1024. Nine slots: the five plain
/// categories, the three special (rare mountain/jungle/mega-taiga style)
/// variants, and a ninth wildcard slot matched by any special category.
pub const TEMP_CAT_NUM: usize = 9;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(usize)]
pub enum TempCat {
    Oceanic = 0,
    Warm = 1,
    Lush = 2,
    Cold = 3,
    Freezing = 4,
    SpecialWarm = 5,
    SpecialLush = 6,
    SpecialCold = 7,
    Any = 8,
}

impl TempCat {
    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Oceanic),
            1 => Some(Self::Warm),
            2 => Some(Self::Lush),
            3 => Some(Self::Cold),
            4 => Some(Self::Freezing),
            5 => Some(Self::SpecialWarm),
            6 => Some(Self::SpecialLush),
            7 => Some(Self::SpecialCold),
            8 => Some(Self::Any),
            _ => None,
        }
    }

    pub fn is_special(self) -> bool {
        matches!(
            self,
            Self::SpecialWarm | Self::SpecialLush | Self::SpecialCold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_set_masks() {
        let mut set = BiomeSet::default();
        set.insert(MUSHROOM_FIELDS);
        set.insert(BAMBOO_JUNGLE); // modified-range id
        assert!(set.contains_all(1 << MUSHROOM_FIELDS, 0));
        assert!(set.contains_all(0, 1 << (BAMBOO_JUNGLE - MODIFIED_OFFSET)));
        assert!(set.disjoint(1 << DESERT, 0));
        assert!(!set.disjoint(1 << MUSHROOM_FIELDS, 0));
    }

    #[test]
    fn test_biome_names_roundtrip() {
        assert_eq!(str2biome("mushroom_fields"), Some(MUSHROOM_FIELDS));
        assert_eq!(biome2str(SWAMP), Some("swamp"));
        assert_eq!(str2biome("the_void"), None);
    }
}
