//! Gen48 candidate source contracts.

use std::io::Write;
use std::sync::atomic::AtomicBool;

use seedquarry::filter::{Condition, FilterKind};
use seedquarry::search::{Gen48Mode, Gen48Settings, Gen48Source};
use seedquarry::types::MASK48;

fn drain(src: &mut Gen48Source) -> Vec<u64> {
    let cancel = AtomicBool::new(false);
    let mut out = Vec::new();
    while let Some(s) = src.next(&cancel) {
        out.push(s);
        if out.len() > 1_000_000 {
            panic!("source produced implausibly many candidates");
        }
    }
    out
}

#[test]
fn test_quad_build_produces_verified_ascending_candidates() {
    let settings = Gen48Settings {
        mode: Gen48Mode::Quad,
        qual: 3,
        ..Default::default()
    };
    let conds = vec![Condition::new(FilterKind::QhBarely, 1).with_area(-1, -1, 0, 0)];
    let cancel = AtomicBool::new(false);
    let mut src = Gen48Source::build(&settings, &conds, 8, None, &cancel).unwrap();
    let (lo, hi) = src.bounds();
    assert_eq!(lo, hi);

    if lo <= 1_000_000 {
        let out = drain(&mut src);
        assert_eq!(out.len() as u64, lo);
        assert!(out.windows(2).all(|w| w[0] < w[1]), "not strictly ascending");
        assert!(out.iter().all(|&s| s <= MASK48));
    }
}

#[test]
fn test_proto_base_cache_hit_matches_fresh_scan() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("bases.qb48");
    let settings = Gen48Settings {
        mode: Gen48Mode::Monument48,
        qm_area: 90,
        ..Default::default()
    };
    let conds: Vec<Condition> = Vec::new();
    let cancel = AtomicBool::new(false);

    let mut fresh =
        Gen48Source::build(&settings, &conds, 4, Some(&cache), &cancel).unwrap();
    let mut cached =
        Gen48Source::build(&settings, &conds, 4, Some(&cache), &cancel).unwrap();
    assert_eq!(fresh.bounds(), cached.bounds());
    if fresh.bounds().0 <= 1_000_000 {
        assert_eq!(drain(&mut fresh), drain(&mut cached));
    }
}

#[test]
fn test_list48_mode_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("list.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    for s in [500u64, 100, 500, 300] {
        writeln!(f, "{}", s).unwrap();
    }
    drop(f);

    let settings = Gen48Settings {
        mode: Gen48Mode::List48,
        list48_path: Some(path),
        ..Default::default()
    };
    let cancel = AtomicBool::new(false);
    let mut src = Gen48Source::build(&settings, &[], 4, None, &cancel).unwrap();
    assert_eq!(drain(&mut src), vec![100, 300, 500]);
}

#[test]
fn test_skip_below_then_ascending() {
    let mut src = Gen48Source::from_list(vec![10, 20, 30, 40]);
    src.skip_below(20);
    assert_eq!(drain(&mut src), vec![20, 30, 40]);

    let mut src = Gen48Source::from_list(vec![10, 20, 30, 40]);
    src.skip_below(21);
    assert_eq!(drain(&mut src), vec![30, 40]);
}
