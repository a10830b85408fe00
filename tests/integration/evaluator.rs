//! End-to-end re-verification: every seed a search reports must pass an
//! independent evaluator invocation, for both full and family pipelines.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use seedquarry::biome;
use seedquarry::filter::{Condition, FilterKind};
use seedquarry::gen::LayeredBackend;
use seedquarry::search::{
    scheduler, EvalPass, Evaluator, Gen48Mode, PositionalState, SearchMode, SearchParams,
};
use seedquarry::types::MC_1_16;

fn retest(conds: &[Condition], seed: i64) -> bool {
    let mut ev = Evaluator::new(&LayeredBackend, MC_1_16, conds);
    let cancel = AtomicBool::new(false);
    ev.test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full)
}

#[test]
fn test_incremental_hits_reverify() {
    let conds = vec![Condition::new(FilterKind::Slime, 1).with_area(-2, -2, 2, 2)];
    let mut p = SearchParams::new(MC_1_16, conds.clone(), Arc::new(LayeredBackend));
    p.config.mode = SearchMode::Incremental;
    p.config.start_seed = i64::MAX - 5000;
    p.config.threads = 4;
    p.config.seeds_per_item = 128;
    p.config.queue_size = 16;
    let outcome = scheduler::start(p).unwrap().join();
    assert!(outcome.complete);
    assert!(!outcome.results.is_empty());
    for &seed in &outcome.results {
        assert!(retest(&conds, seed), "reported seed {} fails re-test", seed);
    }
}

#[test]
fn test_family_hits_reverify_with_full_pass() {
    // a Cat48 condition (ocean-temperature layer) plus a CatFull condition,
    // exercised through the family pipeline
    let mut otemp = Condition::new(FilterKind::Biome256Otemp, 1).with_area(-2, -2, 2, 2);
    otemp.biome_incl = 1 << biome::OCEAN;
    // selective enough to stay well below the result cap
    let full = Condition::new(FilterKind::Slime, 2).with_area(0, 0, 0, 0);
    let conds = vec![otemp, full];

    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("list48.txt");
    let mut f = std::fs::File::create(&list).unwrap();
    for s in 0..64u64 {
        writeln!(f, "{}", s).unwrap();
    }
    drop(f);

    let mut p = SearchParams::new(MC_1_16, conds.clone(), Arc::new(LayeredBackend));
    p.config.mode = SearchMode::FamilyBlocks;
    p.config.threads = 4;
    p.config.queue_size = 64;
    p.config.max_results = 1 << 20;
    p.gen48.mode = Gen48Mode::List48;
    p.gen48.list48_path = Some(list);
    let outcome = scheduler::start(p).unwrap().join();
    assert!(outcome.complete);

    for &seed in outcome.results.iter().take(2000) {
        assert!(retest(&conds, seed), "family hit {} fails full re-test", seed);
    }
}

#[test]
fn test_family_pipeline_matches_exhaustive_evaluation() {
    // for one 48-bit prefix, the family search must report exactly the
    // seeds an exhaustive full-pass sweep of the family finds
    let mut otemp = Condition::new(FilterKind::Biome256Otemp, 1).with_area(-1, -1, 1, 1);
    otemp.biome_incl = 1 << biome::OCEAN;
    let full = Condition::new(FilterKind::Slime, 2).with_area(0, 0, 4, 4);
    let conds = vec![otemp, full];

    // find a prefix passing the 48-bit screen
    let cancel = AtomicBool::new(false);
    let mut screen = Evaluator::new(&LayeredBackend, MC_1_16, &conds);
    let prefix = (0..4096i64)
        .find(|&s| {
            screen.test_seed(s, &mut PositionalState::default(), &cancel, EvalPass::Prefix48)
        })
        .expect("no prefix passes the 48-bit screen in 4096 tries");

    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("one.txt");
    std::fs::write(&list, format!("{}\n", prefix)).unwrap();

    let mut p = SearchParams::new(MC_1_16, conds.clone(), Arc::new(LayeredBackend));
    p.config.mode = SearchMode::FamilyBlocks;
    p.config.threads = 4;
    p.config.queue_size = 32;
    p.config.max_results = 1 << 17;
    p.gen48.mode = Gen48Mode::List48;
    p.gen48.list48_path = Some(list);
    let mut family: Vec<i64> = scheduler::start(p).unwrap().join().results;
    family.sort_unstable();

    let mut exhaustive = Vec::new();
    let mut ev = Evaluator::new(&LayeredBackend, MC_1_16, &conds);
    for upper in 0..0x10000i64 {
        let seed = prefix | (upper << 48);
        if ev.test_seed(seed, &mut PositionalState::default(), &cancel, EvalPass::Full) {
            exhaustive.push(seed);
        }
    }
    exhaustive.sort_unstable();

    assert_eq!(family, exhaustive);
}
