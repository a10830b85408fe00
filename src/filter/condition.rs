//! Condition records: validation and the session wire encoding.

use crate::error::{Result, SearchError};
use crate::types::Area;

use super::table::FilterKind;

/// Format version of the encoded condition record. Independent of the
/// application version; bump only when the layout below changes.
pub const CONDITION_FORMAT: u8 = 1;

/// A single search constraint.
///
/// Coordinates are in condition units (`kind.info().step` blocks each);
/// bounds are inclusive. `relative == 0` means absolute coordinates,
/// otherwise it names the `save` id of an earlier condition whose matched
/// position becomes this condition's origin.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Condition {
    pub kind: FilterKind,
    pub save: u8,
    pub relative: u8,
    pub x1: i32,
    pub z1: i32,
    pub x2: i32,
    pub z2: i32,
    pub count: u32,
    /// Include mask, base biome ids 0..63.
    pub biome_incl: u64,
    /// Include mask, mutated variants (id - 128).
    pub biome_incl_m: u64,
    pub biome_excl: u64,
    pub biome_excl_m: u64,
    /// Required cell counts per temperature category.
    pub temps: [u32; 9],
}

impl Condition {
    /// Encoded record size in bytes; the hex line in a session file is
    /// exactly twice this.
    pub const RECORD_SIZE: usize = 93;

    pub fn new(kind: FilterKind, save: u8) -> Self {
        Self {
            kind,
            save,
            relative: 0,
            x1: 0,
            z1: 0,
            x2: 0,
            z2: 0,
            count: 1,
            biome_incl: 0,
            biome_incl_m: 0,
            biome_excl: 0,
            biome_excl_m: 0,
            temps: [0; 9],
        }
    }

    pub fn with_area(mut self, x1: i32, z1: i32, x2: i32, z2: i32) -> Self {
        self.x1 = x1;
        self.z1 = z1;
        self.x2 = x2;
        self.z2 = z2;
        self
    }

    /// Absolute block area of this condition, before any relative shift.
    pub fn block_area(&self) -> Area {
        Area::from_units(self.x1, self.z1, self.x2, self.z2, self.kind.info().step.max(1))
    }

    pub fn encode(&self) -> [u8; Self::RECORD_SIZE] {
        let mut buf = [0u8; Self::RECORD_SIZE];
        let mut o = 0;
        let mut put = |bytes: &[u8]| {
            buf[o..o + bytes.len()].copy_from_slice(bytes);
            o += bytes.len();
        };
        put(&[CONDITION_FORMAT]);
        put(&(self.kind as u16).to_le_bytes());
        put(&[self.save, self.relative]);
        put(&self.x1.to_le_bytes());
        put(&self.z1.to_le_bytes());
        put(&self.x2.to_le_bytes());
        put(&self.z2.to_le_bytes());
        put(&self.count.to_le_bytes());
        put(&self.biome_incl.to_le_bytes());
        put(&self.biome_incl_m.to_le_bytes());
        put(&self.biome_excl.to_le_bytes());
        put(&self.biome_excl_m.to_le_bytes());
        for t in &self.temps {
            put(&t.to_le_bytes());
        }
        debug_assert_eq!(o, Self::RECORD_SIZE);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != Self::RECORD_SIZE {
            return Err(SearchError::Parse(format!(
                "condition record is {} bytes, expected {}",
                data.len(),
                Self::RECORD_SIZE
            )));
        }
        if data[0] != CONDITION_FORMAT {
            return Err(SearchError::Parse(format!(
                "unsupported condition format {}",
                data[0]
            )));
        }
        let mut o = 1;
        let mut take = |n: usize| {
            let s = &data[o..o + n];
            o += n;
            s
        };
        let kind_raw = u16::from_le_bytes(take(2).try_into().unwrap());
        let kind = FilterKind::from_u16(kind_raw)
            .ok_or_else(|| SearchError::Parse(format!("unknown filter kind {}", kind_raw)))?;
        let save = take(1)[0];
        let relative = take(1)[0];
        let x1 = i32::from_le_bytes(take(4).try_into().unwrap());
        let z1 = i32::from_le_bytes(take(4).try_into().unwrap());
        let x2 = i32::from_le_bytes(take(4).try_into().unwrap());
        let z2 = i32::from_le_bytes(take(4).try_into().unwrap());
        let count = u32::from_le_bytes(take(4).try_into().unwrap());
        let biome_incl = u64::from_le_bytes(take(8).try_into().unwrap());
        let biome_incl_m = u64::from_le_bytes(take(8).try_into().unwrap());
        let biome_excl = u64::from_le_bytes(take(8).try_into().unwrap());
        let biome_excl_m = u64::from_le_bytes(take(8).try_into().unwrap());
        let mut temps = [0u32; 9];
        for t in temps.iter_mut() {
            *t = u32::from_le_bytes(take(4).try_into().unwrap());
        }
        Ok(Self {
            kind,
            save,
            relative,
            x1,
            z1,
            x2,
            z2,
            count,
            biome_incl,
            biome_incl_m,
            biome_excl,
            biome_excl_m,
            temps,
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| SearchError::Parse(format!("bad condition hex: {}", e)))?;
        Self::decode(&bytes)
    }
}

/// Pre-run validation of a condition list against a target version.
/// Any violation aborts the search before it starts.
pub fn validate_conditions(conds: &[Condition], mc: i32) -> Result<()> {
    let mut defined = [false; 100];
    for c in conds {
        let info = c.kind.info();
        if c.save < 1 || c.save > 99 {
            return Err(SearchError::ConfigInvalid(format!(
                "condition with invalid ID [{:02}]",
                c.save
            )));
        }
        if c.relative != 0 && !defined.get(c.relative as usize).copied().unwrap_or(false) {
            return Err(SearchError::ConfigInvalid(format!(
                "condition [{:02}] has a broken reference position: \
                 condition missing or out of order",
                c.save
            )));
        }
        if defined[c.save as usize] {
            return Err(SearchError::ConfigInvalid(format!(
                "more than one condition with ID [{:02}]",
                c.save
            )));
        }
        defined[c.save as usize] = true;
        if mc < info.mc_min {
            return Err(SearchError::ConfigInvalid(format!(
                "condition [{:02}] requires a minimum Minecraft version of {}",
                c.save,
                crate::types::mc2str(info.mc_min).unwrap_or("?")
            )));
        }
        if info.needs_area && (c.x1 > c.x2 || c.z1 > c.z2) {
            return Err(SearchError::ConfigInvalid(format!(
                "condition [{:02}] does not specify a valid area: ({}, {}) - ({}, {})",
                c.save, c.x1, c.z1, c.x2, c.z2
            )));
        }
        if c.kind.is_biome_filter() {
            if (c.biome_excl & c.biome_incl) != 0 || (c.biome_excl_m & c.biome_incl_m) != 0 {
                return Err(SearchError::ConfigInvalid(format!(
                    "biome filter condition [{:02}] has contradicting include \
                     and exclude flags",
                    c.save
                )));
            }
            if c.biome_incl == 0 && c.biome_incl_m == 0 && c.biome_excl == 0 && c.biome_excl_m == 0
            {
                tracing::warn!(save = c.save, "biome filter condition specifies no biomes");
            }
        }
        if c.kind == FilterKind::Temps {
            let w = (c.x2 - c.x1 + 1) as i64;
            let h = (c.z2 - c.z1 + 1) as i64;
            let required: i64 = c.temps.iter().map(|&t| t as i64).sum();
            if required > w * h {
                return Err(SearchError::ConfigInvalid(format!(
                    "temperature condition [{:02}] has too many restrictions \
                     ({}) for the area ({} x {})",
                    c.save, required, w, h
                )));
            }
        }
    }
    Ok(())
}
