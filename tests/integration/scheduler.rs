//! Scheduler behaviour: ordered progress, stop semantics, cancellation
//! latency, resume equivalence.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use seedquarry::filter::{Condition, FilterKind};
use seedquarry::gen::LayeredBackend;
use seedquarry::search::{
    scheduler, Gen48Mode, SearchEvent, SearchMode, SearchParams,
};
use seedquarry::types::MC_1_16;

fn params(conds: Vec<Condition>) -> SearchParams {
    let mut p = SearchParams::new(MC_1_16, conds, Arc::new(LayeredBackend));
    p.config.threads = 4;
    p.config.seeds_per_item = 64;
    p.config.queue_size = 32;
    p.scan_limit = 2;
    p
}

/// Roughly one in ten seeds has a slime chunk at the origin chunk.
fn selective_condition() -> Condition {
    Condition::new(FilterKind::Slime, 1).with_area(0, 0, 0, 0)
}

/// Satisfied by essentially every seed.
fn easy_condition() -> Condition {
    Condition::new(FilterKind::Slime, 1).with_area(-64, -64, 64, 64)
}

fn write_list48(dir: &std::path::Path, n: u64) -> std::path::PathBuf {
    let path = dir.join("list48.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    for s in 0..n {
        writeln!(f, "{}", s).unwrap();
    }
    path
}

#[test]
fn test_progress_cursor_is_monotonic() {
    let mut p = params(vec![selective_condition()]);
    p.config.start_seed = i64::MAX - 20_000;
    let handle = scheduler::start(p).unwrap();

    let mut cursors = Vec::new();
    let mut dones = Vec::new();
    for ev in handle.events.iter() {
        if let SearchEvent::Progress { done, cursor, .. } = ev {
            cursors.push(cursor);
            dones.push(done);
        }
    }
    let outcome = handle.join();
    assert!(outcome.complete);
    assert!(
        cursors.windows(2).all(|w| w[0] <= w[1]),
        "cursor went backwards: {:?}",
        cursors
    );
    assert!(dones.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(outcome.cursor, i64::MAX);
}

#[test]
fn test_unsatisfiable_run_reaches_exact_end() {
    // two quad conditions whose relative areas can never both hold
    let a = Condition::new(FilterKind::QhBarely, 1).with_area(-1, -1, 0, 0);
    let mut b = Condition::new(FilterKind::QhBarely, 2).with_area(500, 500, 500, 500);
    b.relative = 1;

    let dir = tempfile::tempdir().unwrap();
    let list = write_list48(dir.path(), 4096);

    let mut p = params(vec![a, b]);
    p.config.mode = SearchMode::FamilyBlocks;
    p.gen48.mode = Gen48Mode::List48;
    p.gen48.list48_path = Some(list);
    let handle = scheduler::start(p).unwrap();

    let mut final_done = 0;
    for ev in handle.events.iter() {
        if let SearchEvent::Progress { done, .. } = ev {
            final_done = done;
        }
    }
    let outcome = handle.join();
    assert!(outcome.complete);
    assert!(outcome.results.is_empty());
    // every 48-bit candidate was consumed
    assert_eq!(final_done, 4096);
}

#[test]
fn test_stop_on_result_bounds_hits() {
    let mut p = params(vec![easy_condition()]);
    p.config.stop_on_result = true;
    let queue = p.config.queue_size;
    let item = p.config.seeds_per_item;
    let outcome = scheduler::start(p).unwrap().join();
    assert!(!outcome.complete);
    assert!(!outcome.results.is_empty());
    // bounded by the work that was already in flight at the first hit
    assert!(
        outcome.results.len() <= (queue + 1) * item,
        "{} results for queue {} x item {}",
        outcome.results.len(),
        queue,
        item
    );
}

#[test]
fn test_cancellation_latency() {
    let dir = tempfile::tempdir().unwrap();
    let list = write_list48(dir.path(), 100_000);

    let mut p = params(vec![easy_condition()]);
    p.config.mode = SearchMode::FamilyBlocks;
    p.config.threads = 8;
    p.config.max_results = usize::MAX >> 1;
    p.gen48.mode = Gen48Mode::List48;
    p.gen48.list48_path = Some(list);
    let handle = scheduler::start(p).unwrap();

    // let it get going, then pull the plug
    std::thread::sleep(Duration::from_millis(100));
    handle.cancel();
    let t0 = Instant::now();
    let outcome = handle.join();
    assert!(
        t0.elapsed() < Duration::from_secs(2),
        "abort took {:?}",
        t0.elapsed()
    );
    assert!(!outcome.complete);
}

#[test]
fn test_resume_union_equals_uninterrupted_run() {
    let start = i64::MAX - 3000;

    // uninterrupted reference run
    let mut p = params(vec![selective_condition()]);
    p.config.start_seed = start;
    let reference = scheduler::start(p).unwrap().join();
    assert!(reference.complete);

    // interrupted run: cancel after the first progress event
    let mut p = params(vec![selective_condition()]);
    p.config.start_seed = start;
    let handle = scheduler::start(p).unwrap();
    let mut cut = start;
    for ev in handle.events.iter() {
        if let SearchEvent::Progress { cursor, .. } = ev {
            cut = cursor;
            handle.cancel();
            break;
        }
    }
    let first = handle.join();
    assert!(first.cursor >= cut);

    // resumed run from the reported cursor, pre-seeded with the first
    // run's results the way a reloaded session would be
    let mut p = params(vec![selective_condition()]);
    p.config.start_seed = first.cursor;
    p.preload_results = first.results.clone();
    let second = scheduler::start(p).unwrap().join();
    assert!(second.complete);

    let mut union: Vec<i64> = second.results;
    union.sort_unstable();
    let mut expected = reference.results;
    expected.sort_unstable();
    assert_eq!(union, expected);
}
