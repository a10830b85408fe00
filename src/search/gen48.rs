//! The 48-bit candidate source.
//!
//! Produces the ascending stream of seed prefixes a FamilyBlocks search
//! examines. For quad searches the space is precomputed: a low-20-bit
//! prescan narrows the base space, every surviving base is fully verified
//! at the origin, and the verified bases are translated across the region
//! area of interest. If the expansion overruns the precompute budget the
//! source falls back to enumerating the full 48-bit space.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::{Result, SearchError};
use crate::filter::{Condition, FilterKind};
use crate::gen::{move_structure, region_block_pos_salted, StructureKind};
use crate::types::{Pos, MASK48};

use super::protobase::{self, ProtoKey};
use super::quad::{check_quad_hut, check_quad_monument, QuadClass};

/// Maximum number of precomputed candidates (1 GiB of u64 seeds).
pub const PRECOMPUTE48_MAX: usize = 1 << 27;

/// Upper-28-bit scan limit for a full base precompute.
pub const FULL_SCAN_LIMIT: u64 = 1 << 28;

/// Upper-bit samples for the low-20 prescan. A base survives the prescan if
/// the origin quad check passes for any sample; full verification happens
/// per candidate afterwards.
const HI_SAMPLES: [u64; 6] = [
    0x0000_0000,
    0x0000_0001,
    0x0003_F00F,
    0x0555_5555,
    0x0AAA_AAAA,
    0x0FFF_FFFF,
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gen48Mode {
    Auto,
    Quad,
    Monument48,
    List48,
    None,
}

impl Gen48Mode {
    pub fn to_int(self) -> i32 {
        match self {
            Self::Auto => 0,
            Self::Quad => 1,
            Self::Monument48 => 2,
            Self::List48 => 3,
            Self::None => 4,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Auto,
            1 => Self::Quad,
            2 => Self::Monument48,
            3 => Self::List48,
            4 => Self::None,
            _ => return None,
        })
    }
}

/// User-facing Gen48 configuration, persisted in the session file.
#[derive(Clone, PartialEq, Debug)]
pub struct Gen48Settings {
    pub mode: Gen48Mode,
    /// Quad-hut quality: 0 ideal, 1 classic, 2 normal, 3 barely.
    pub qual: i32,
    /// Quad-monument coverage threshold in percent.
    pub qm_area: i32,
    /// Extra salt added to the structure salt.
    pub salt: i64,
    /// Manual region-unit area for the translation expansion.
    pub manual_area: Option<(i32, i32, i32, i32)>,
    pub list48_path: Option<PathBuf>,
}

impl Default for Gen48Settings {
    fn default() -> Self {
        Self {
            mode: Gen48Mode::Auto,
            qual: 2,
            qm_area: 90,
            salt: 0,
            manual_area: None,
            list48_path: None,
        }
    }
}

pub fn class_from_qual(qual: i32) -> QuadClass {
    match qual {
        0 => QuadClass::Ideal,
        1 => QuadClass::Classic,
        2 => QuadClass::Normal,
        _ => QuadClass::Barely,
    }
}

pub fn qual_from_class(class: QuadClass) -> i32 {
    match class {
        QuadClass::Ideal => 0,
        QuadClass::Classic => 1,
        QuadClass::Normal => 2,
        QuadClass::Barely => 3,
    }
}

/// What the quad precompute is scanning for.
#[derive(Clone, Copy, PartialEq, Debug)]
enum QuadTarget {
    Hut(QuadClass),
    Monument(f64),
}

impl QuadTarget {
    fn cache_key(self, salt: i64, scan_limit: u64) -> ProtoKey {
        match self {
            Self::Hut(class) => ProtoKey {
                kind: 0,
                qual: qual_from_class(class) as u8,
                salt,
                scan_limit,
            },
            Self::Monument(frac) => ProtoKey {
                kind: 1,
                qual: (frac * 100.0).round() as u8,
                salt,
                scan_limit,
            },
        }
    }
}

/// Origin quad check: does `s48` place a quad around the region corner at
/// block (0, 0)? Returns the AFK centre.
fn quad_base_at_origin(target: QuadTarget, s48: u64, salt: i64) -> Option<Pos> {
    let st = match target {
        QuadTarget::Hut(_) => StructureKind::SwampHut,
        QuadTarget::Monument(_) => StructureKind::Monument,
    };
    let p = |rx: i32, rz: i32| region_block_pos_salted(s48, st, rx, rz, salt);
    let quad = [p(-1, -1)?, p(0, -1)?, p(-1, 0)?, p(0, 0)?];
    match target {
        QuadTarget::Hut(class) => check_quad_hut(class, &quad, Pos::new(0, 0)),
        QuadTarget::Monument(frac) => check_quad_monument(frac, &quad),
    }
}

/// Low-20-bit prescan over the sampled upper-bit patterns.
fn scan_low20(target: QuadTarget, salt: i64, cancel: &AtomicBool) -> Vec<u64> {
    (0u64..1 << 20)
        .into_par_iter()
        .filter(|&b| {
            !cancel.load(Ordering::Relaxed)
                && HI_SAMPLES
                    .iter()
                    .any(|&hi| quad_base_at_origin(target, (hi << 20) | b, salt).is_some())
        })
        .collect()
}

/// Verify every (hi, base) combination up to `scan_limit`; ascending output.
fn expand_bases(
    target: QuadTarget,
    salt: i64,
    low20: &[u64],
    scan_limit: u64,
    cancel: &AtomicBool,
) -> Vec<u64> {
    (0..scan_limit)
        .into_par_iter()
        .flat_map_iter(|hi| {
            low20.iter().filter_map(move |&b| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let s = (hi << 20) | b;
                quad_base_at_origin(target, s, salt).map(|_| s)
            })
        })
        .collect()
}

/// Translate origin bases across the region-unit area; sorted, deduplicated.
fn translate_bases(bases: &[u64], area: (i32, i32, i32, i32)) -> Vec<u64> {
    let (x1, z1, x2, z2) = area;
    let mut out =
        Vec::with_capacity(bases.len() * ((x2 - x1 + 2) as usize) * ((z2 - z1 + 2) as usize));
    for a in x1..=x2 + 1 {
        for b in z1..=z2 + 1 {
            for &s in bases {
                out.push(move_structure(s, a, b));
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// The candidate stream. `next` yields 48-bit prefixes in ascending order;
/// a set cancellation flag ends the stream immediately.
pub struct Gen48Source {
    inner: Inner,
}

enum Inner {
    List { seeds: Vec<u64>, pos: usize },
    Range { next: u64, done: bool },
}

impl Gen48Source {
    /// Full 2^48 enumeration.
    pub fn full_range() -> Self {
        Self {
            inner: Inner::Range {
                next: 0,
                done: false,
            },
        }
    }

    pub fn from_list(mut seeds: Vec<u64>) -> Self {
        seeds.sort_unstable();
        seeds.dedup();
        Self {
            inner: Inner::List { seeds, pos: 0 },
        }
    }

    /// Read a 48-bit seed list: one decimal integer per line, blank lines
    /// ignored, values masked to 48 bits.
    pub fn from_list_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut seeds = Vec::new();
        for (ln, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v: i64 = line.parse().map_err(|_| {
                SearchError::Parse(format!("{}:{}: not a seed: {:?}", path.display(), ln + 1, line))
            })?;
            seeds.push(v as u64 & MASK48);
        }
        Ok(Self::from_list(seeds))
    }

    /// Resolve settings and conditions into a concrete source.
    ///
    /// `scan_limit` bounds the upper-28-bit verification range (use
    /// [`FULL_SCAN_LIMIT`] for a complete precompute); `cache_path` enables
    /// the proto-base store.
    pub fn build(
        settings: &Gen48Settings,
        conds: &[Condition],
        scan_limit: u64,
        cache_path: Option<&Path>,
        cancel: &AtomicBool,
    ) -> Result<Self> {
        let resolved = match settings.mode {
            Gen48Mode::None => None,
            Gen48Mode::List48 => {
                let path = settings.list48_path.as_ref().ok_or_else(|| {
                    SearchError::ConfigInvalid("List48 mode without a list path".into())
                })?;
                return Self::from_list_file(path);
            }
            Gen48Mode::Quad => Some((
                QuadTarget::Hut(class_from_qual(settings.qual)),
                settings
                    .manual_area
                    .or_else(|| auto_area(conds))
                    .unwrap_or((-1, -1, 0, 0)),
            )),
            Gen48Mode::Monument48 => Some((
                QuadTarget::Monument(settings.qm_area as f64 / 100.0),
                settings
                    .manual_area
                    .or_else(|| auto_area(conds))
                    .unwrap_or((-1, -1, 0, 0)),
            )),
            Gen48Mode::Auto => auto_target(conds).map(|target| {
                (
                    target,
                    settings
                        .manual_area
                        .or_else(|| auto_area(conds))
                        .unwrap_or((-1, -1, 0, 0)),
                )
            }),
        };

        let (target, area) = match resolved {
            Some(r) => r,
            None => return Ok(Self::full_range()),
        };

        let key = target.cache_key(settings.salt, scan_limit);
        let bases = cache_path
            .and_then(|p| protobase::load(p, key))
            .unwrap_or_else(|| {
                tracing::info!(?target, scan_limit, "scanning quad proto-bases");
                let low20 = scan_low20(target, settings.salt, cancel);
                let bases = expand_bases(target, settings.salt, &low20, scan_limit, cancel);
                if let Some(p) = cache_path {
                    if !cancel.load(Ordering::Relaxed) {
                        if let Err(e) = protobase::save(p, key, &bases) {
                            tracing::warn!(error = %e, "failed to save proto-base cache");
                        }
                    }
                }
                bases
            });

        let candidates = translate_bases(&bases, area);
        if candidates.is_empty() || candidates.len() > PRECOMPUTE48_MAX {
            tracing::warn!(
                count = candidates.len(),
                "precompute unusable, falling back to full 48-bit enumeration"
            );
            return Ok(Self::full_range());
        }
        Ok(Self::from_list(candidates))
    }

    /// Skip candidates below `start48` so a resumed search misses nothing
    /// and repeats nothing below the cursor.
    pub fn skip_below(&mut self, start48: u64) {
        match &mut self.inner {
            Inner::List { seeds, pos } => {
                *pos = seeds.partition_point(|&s| s < start48);
            }
            Inner::Range { next, .. } => {
                *next = (*next).max(start48);
            }
        }
    }

    /// Next candidate prefix, ascending. Returns `None` once exhausted or
    /// as soon as the cancel flag is set.
    pub fn next(&mut self, cancel: &AtomicBool) -> Option<u64> {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        match &mut self.inner {
            Inner::List { seeds, pos } => {
                let s = *seeds.get(*pos)?;
                *pos += 1;
                Some(s)
            }
            Inner::Range { next, done } => {
                if *done || *next > MASK48 {
                    return None;
                }
                let s = *next;
                if s == MASK48 {
                    *done = true;
                } else {
                    *next = s + 1;
                }
                Some(s)
            }
        }
    }

    /// (lower, upper) bound on the total candidate count, for progress.
    pub fn bounds(&self) -> (u64, u64) {
        match &self.inner {
            Inner::List { seeds, .. } => (seeds.len() as u64, seeds.len() as u64),
            Inner::Range { .. } => (MASK48 + 1, MASK48 + 1),
        }
    }
}

/// Pick the most selective precompute the condition list admits.
fn auto_target(conds: &[Condition]) -> Option<QuadTarget> {
    for c in conds {
        if let Some(class) = QuadClass::from_kind(c.kind) {
            return Some(QuadTarget::Hut(class));
        }
    }
    for c in conds {
        if c.kind.is_quad_monument() {
            let frac = if c.kind == FilterKind::Qm95 { 0.95 } else { 0.90 };
            return Some(QuadTarget::Monument(frac));
        }
    }
    None
}

/// Region-unit translation area derived from the first quad condition.
fn auto_area(conds: &[Condition]) -> Option<(i32, i32, i32, i32)> {
    conds
        .iter()
        .find(|c| c.kind.is_quad_hut() || c.kind.is_quad_monument())
        .map(|c| (c.x1, c.z1, c.x2, c.z2))
}

/// Read a full 64-bit seed list: one signed decimal per line, blank lines
/// ignored. Used by the List search mode.
pub fn read_seed_list(path: &Path) -> Result<Vec<i64>> {
    let text = std::fs::read_to_string(path)?;
    let mut seeds = Vec::new();
    for (ln, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let v: i64 = line.parse().map_err(|_| {
            SearchError::Parse(format!("{}:{}: not a seed: {:?}", path.display(), ln + 1, line))
        })?;
        seeds.push(v);
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_list_source_is_ascending_and_deduped() {
        let mut src = Gen48Source::from_list(vec![9, 3, 3, 7, 1]);
        let cancel = AtomicBool::new(false);
        let mut out = Vec::new();
        while let Some(s) = src.next(&cancel) {
            out.push(s);
        }
        assert_eq!(out, vec![1, 3, 7, 9]);
        assert_eq!(src.bounds(), (4, 4));
    }

    #[test]
    fn test_skip_below_resumes_exactly() {
        let mut src = Gen48Source::from_list(vec![1, 3, 7, 9]);
        src.skip_below(4);
        let cancel = AtomicBool::new(false);
        assert_eq!(src.next(&cancel), Some(7));

        let mut range = Gen48Source::full_range();
        range.skip_below(500);
        assert_eq!(range.next(&cancel), Some(500));
    }

    #[test]
    fn test_cancel_ends_stream() {
        let mut src = Gen48Source::from_list(vec![1, 2, 3]);
        let cancel = AtomicBool::new(false);
        assert_eq!(src.next(&cancel), Some(1));
        cancel.store(true, Ordering::SeqCst);
        assert_eq!(src.next(&cancel), None);
    }

    #[test]
    fn test_range_terminates_at_mask48() {
        let mut src = Gen48Source::full_range();
        src.skip_below(MASK48 - 1);
        let cancel = AtomicBool::new(false);
        assert_eq!(src.next(&cancel), Some(MASK48 - 1));
        assert_eq!(src.next(&cancel), Some(MASK48));
        assert_eq!(src.next(&cancel), None);
    }

    #[test]
    fn test_list48_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list48.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "1234").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "-1").unwrap(); // masks to MASK48
        drop(f);
        let mut src = Gen48Source::from_list_file(&path).unwrap();
        let cancel = AtomicBool::new(false);
        assert_eq!(src.next(&cancel), Some(1234));
        assert_eq!(src.next(&cancel), Some(MASK48));
        assert_eq!(src.next(&cancel), None);

        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "notaseed\n").unwrap();
        assert!(Gen48Source::from_list_file(&bad).is_err());
    }

    #[test]
    fn test_translate_bases_sorted_unique() {
        let bases = vec![100u64, 200];
        let out = translate_bases(&bases, (-1, -1, 0, 0));
        assert!(out.windows(2).all(|w| w[0] < w[1]));
        // 2 bases x 2x2 translation corners... plus dedup can shrink
        assert!(out.len() <= 2 * 4 + 4);
    }

    #[test]
    fn test_quad_precompute_small_scan() {
        // tiny scan limit keeps this fast; the contract under test is that
        // every produced candidate really admits a quad somewhere in the area
        let settings = Gen48Settings {
            mode: Gen48Mode::Quad,
            qual: 3,
            ..Default::default()
        };
        let conds = vec![
            Condition::new(FilterKind::QhBarely, 1).with_area(-1, -1, 0, 0)
        ];
        let cancel = AtomicBool::new(false);
        let src = Gen48Source::build(&settings, &conds, 4, None, &cancel).unwrap();
        let (lo, hi) = src.bounds();
        assert_eq!(lo, hi);
    }

    #[test]
    fn test_auto_without_quad_conditions_is_full_range() {
        let settings = Gen48Settings::default();
        let conds = vec![
            Condition::new(FilterKind::Village, 1).with_area(-500, -500, 500, 500)
        ];
        let cancel = AtomicBool::new(false);
        let src = Gen48Source::build(&settings, &conds, 4, None, &cancel).unwrap();
        assert_eq!(src.bounds().0, MASK48 + 1);
    }
}
