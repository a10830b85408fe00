//! Work items and the ordered scheduler.
//!
//! The controller thread owns the candidate source and a sliding window of
//! out-of-order completions keyed by item id. Items are dispatched over a
//! bounded channel to a fixed pool of workers; completions come back on an
//! unbounded channel. The window guarantees the progress cursor only ever
//! advances over contiguously completed items, so a search resumed from the
//! reported cursor misses nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::error::Result;
use crate::filter::{validate_conditions, Condition};
use crate::gen::WorldBackend;
use crate::results::ResultSink;
use crate::types::{combine_seed, seed48, MASK48};

use super::evaluator::{EvalPass, Evaluator, PositionalState};
use super::gen48::{read_seed_list, Gen48Mode, Gen48Settings, Gen48Source, FULL_SCAN_LIMIT};
use super::{SearchConfig, SearchEvent, SearchMode};

/// Seeds per family work item (upper-16-bit block).
const FAMILY_BLOCK: u32 = 0x200;
/// Family items per 48-bit candidate.
const FAMILY_BLOCKS_PER_PREFIX: u32 = 0x10000 / FAMILY_BLOCK;

/// Event-channel depth towards the UI layer.
const EVENT_QUEUE: usize = 256;

/// One unit of worker work. Owned by the scheduler until dispatch, then by
/// exactly one worker.
#[derive(Clone, Debug)]
pub struct WorkItem {
    pub id: u64,
    /// First seed of the batch (base seed for family items).
    pub seed: i64,
    pub kind: ItemKind,
    /// Set when the generator knew at creation that no item follows.
    pub is_final: bool,
}

#[derive(Clone, Debug)]
pub enum ItemKind {
    /// `count` consecutive full seeds starting at `seed`.
    Range { count: u32 },
    /// `count` seeds from the shared list starting at `start`.
    List { start: usize, count: u32 },
    /// `count` upper-16-bit steps over the 48-bit prefix of `seed`.
    Family { count: u32 },
}

enum WorkerMsg {
    Done {
        id: u64,
        last_seed: i64,
        is_final: bool,
    },
    Canceled {
        id: u64,
    },
    Results(Vec<i64>),
}

/// Everything a run needs; immutable once the search starts.
pub struct SearchParams {
    pub mc: i32,
    pub conditions: Vec<Condition>,
    pub config: SearchConfig,
    pub gen48: Gen48Settings,
    pub backend: Arc<dyn WorldBackend>,
    /// Proto-base cache file for quad precomputes.
    pub cache_path: Option<std::path::PathBuf>,
    /// Upper-28-bit scan bound for quad precomputes.
    pub scan_limit: u64,
    /// Hits from a loaded session; pre-seeds the sink so a resumed run
    /// deduplicates against them and reports the union.
    pub preload_results: Vec<i64>,
}

impl SearchParams {
    pub fn new(mc: i32, conditions: Vec<Condition>, backend: Arc<dyn WorldBackend>) -> Self {
        Self {
            mc,
            conditions,
            config: SearchConfig::default(),
            gen48: Gen48Settings::default(),
            backend,
            cache_path: None,
            scan_limit: FULL_SCAN_LIMIT,
            preload_results: Vec::new(),
        }
    }
}

/// Final state of a finished or aborted run.
#[derive(Debug)]
pub struct SearchOutcome {
    pub results: Vec<i64>,
    /// Resume point: every candidate below it has been fully evaluated.
    pub cursor: i64,
    /// True if the candidate space was exhausted (not aborted or capped).
    pub complete: bool,
}

/// Handle to a running search.
pub struct SearchHandle {
    pub events: Receiver<SearchEvent>,
    cancel: Arc<AtomicBool>,
    sink: Arc<Mutex<ResultSink>>,
    controller: Option<JoinHandle<SearchOutcome>>,
}

impl SearchHandle {
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the result set so far (only the controller writes it).
    pub fn results_snapshot(&self) -> Vec<i64> {
        self.sink.lock().map(|s| s.seeds().to_vec()).unwrap_or_default()
    }

    /// Wait for the run to end, draining any pending events.
    pub fn join(mut self) -> SearchOutcome {
        while self.events.recv().is_ok() {}
        self.controller
            .take()
            .expect("join called once")
            .join()
            .expect("controller thread panicked")
    }
}

/// Validate and launch a search. IO-dependent inputs (seed lists) are read
/// here so errors surface before any thread spawns; the quad precompute
/// runs on the controller thread.
pub fn start(params: SearchParams) -> Result<SearchHandle> {
    validate_conditions(&params.conditions, params.mc)?;

    let list: Arc<Vec<i64>> = match params.config.mode {
        SearchMode::List => {
            let path = params.config.seed_list_path.as_ref().ok_or_else(|| {
                crate::error::SearchError::ConfigInvalid("List mode without a seed list".into())
            })?;
            Arc::new(read_seed_list(path)?)
        }
        _ => Arc::new(Vec::new()),
    };

    // List48 does file IO inside the source build; resolve it up front
    let prebuilt_gen48 = match (params.config.mode, params.gen48.mode) {
        (SearchMode::FamilyBlocks, Gen48Mode::List48) => {
            let path = params.gen48.list48_path.as_ref().ok_or_else(|| {
                crate::error::SearchError::ConfigInvalid("List48 mode without a list path".into())
            })?;
            Some(Gen48Source::from_list_file(path)?)
        }
        _ => None,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let (event_tx, event_rx) = bounded::<SearchEvent>(EVENT_QUEUE);
    let mut preloaded = ResultSink::new(params.config.max_results);
    preloaded.add(params.preload_results.iter().copied());
    let sink = Arc::new(Mutex::new(preloaded));

    let run_cancel = cancel.clone();
    let run_sink = sink.clone();
    let controller = thread::Builder::new()
        .name("seedquarry-controller".into())
        .spawn(move || controller_run(params, list, prebuilt_gen48, run_cancel, run_sink, event_tx))
        .expect("failed to spawn controller thread");

    Ok(SearchHandle {
        events: event_rx,
        cancel,
        sink,
        controller: Some(controller),
    })
}

// ============================================================================
// ITEM GENERATION
// ============================================================================

struct ItemGen {
    mode: SearchMode,
    mc: i32,
    conds: Arc<Vec<Condition>>,
    backend: Arc<dyn WorldBackend>,
    item_size: u32,
    next_id: u64,
    exhausted: bool,

    // Incremental
    cursor: i64,
    start: i64,

    // List
    list: Arc<Vec<i64>>,
    index: usize,

    // FamilyBlocks
    gen48: Option<Gen48Source>,
    consumed: u64,
    last_prefix: i64,
    pending: Option<(u64, u32)>,
}

impl ItemGen {
    fn next_item(&mut self, cancel: &AtomicBool) -> Option<WorkItem> {
        if self.exhausted || cancel.load(Ordering::Relaxed) {
            return None;
        }
        match self.mode {
            SearchMode::Incremental => {
                let remaining = i64::MAX as i128 - self.cursor as i128 + 1;
                if remaining <= 0 {
                    self.exhausted = true;
                    return None;
                }
                let count = (self.item_size as i128).min(remaining) as u32;
                let is_final = count as i128 == remaining;
                let item = WorkItem {
                    id: self.take_id(),
                    seed: self.cursor,
                    kind: ItemKind::Range { count },
                    is_final,
                };
                if is_final {
                    self.exhausted = true;
                } else {
                    self.cursor += count as i64;
                }
                Some(item)
            }
            SearchMode::List => {
                if self.index >= self.list.len() {
                    self.exhausted = true;
                    return None;
                }
                let count = (self.item_size as usize).min(self.list.len() - self.index) as u32;
                let start = self.index;
                self.index += count as usize;
                let is_final = self.index >= self.list.len();
                if is_final {
                    self.exhausted = true;
                }
                Some(WorkItem {
                    id: self.take_id(),
                    seed: self.list[start],
                    kind: ItemKind::List { start, count },
                    is_final,
                })
            }
            SearchMode::FamilyBlocks => self.next_family_item(cancel),
        }
    }

    fn next_family_item(&mut self, cancel: &AtomicBool) -> Option<WorkItem> {
        if let Some((prefix, block)) = self.pending.take() {
            if block + 1 < FAMILY_BLOCKS_PER_PREFIX {
                self.pending = Some((prefix, block + 1));
            }
            return Some(WorkItem {
                id: self.take_id(),
                seed: combine_seed(prefix, (block * FAMILY_BLOCK) as u16),
                kind: ItemKind::Family {
                    count: FAMILY_BLOCK,
                },
                is_final: false,
            });
        }
        // pull candidates until one passes the 48-bit screen
        let gen48 = self.gen48.as_mut()?;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let prefix = match gen48.next(cancel) {
                Some(p) => p,
                None => {
                    if !cancel.load(Ordering::Relaxed) {
                        self.exhausted = true;
                    }
                    return None;
                }
            };
            self.consumed += 1;
            self.last_prefix = prefix as i64;
            let mut screen = Evaluator::new(&*self.backend, self.mc, &self.conds);
            let mut state = PositionalState::default();
            if screen.test_seed(prefix as i64, &mut state, cancel, EvalPass::Prefix48) {
                self.pending = Some((prefix, 1));
                return Some(WorkItem {
                    id: self.take_id(),
                    seed: combine_seed(prefix, 0),
                    kind: ItemKind::Family {
                        count: FAMILY_BLOCK,
                    },
                    is_final: false,
                });
            }
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Dispatch-side progress: units handed out vs. the total space.
    fn progress(&self) -> (u64, u64) {
        match self.mode {
            SearchMode::Incremental => {
                let total = (i64::MAX as i128 - self.start as i128 + 1) as u64;
                let done = if self.exhausted {
                    total
                } else {
                    (self.cursor as i128 - self.start as i128).max(0) as u64
                };
                (done, total)
            }
            SearchMode::List => (self.index as u64, self.list.len() as u64),
            SearchMode::FamilyBlocks => {
                let total = self
                    .gen48
                    .as_ref()
                    .map(|g| g.bounds().1)
                    .unwrap_or(MASK48 + 1);
                (self.consumed, total)
            }
        }
    }

    fn initial_cursor(&self) -> i64 {
        match self.mode {
            SearchMode::Incremental => self.cursor,
            SearchMode::List => 0,
            SearchMode::FamilyBlocks => self.last_prefix,
        }
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

fn controller_run(
    params: SearchParams,
    list: Arc<Vec<i64>>,
    prebuilt_gen48: Option<Gen48Source>,
    cancel: Arc<AtomicBool>,
    sink: Arc<Mutex<ResultSink>>,
    event_tx: Sender<SearchEvent>,
) -> SearchOutcome {
    let conds = Arc::new(params.conditions);
    let config = &params.config;
    let queue_size = config.queue_size.max(1);
    let item_size = config.seeds_per_item.max(1) as u32;
    let threads = if config.threads == 0 {
        thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
    } else {
        config.threads
    };

    // presearch: resolve the candidate source before any item is built
    let gen48 = match config.mode {
        SearchMode::FamilyBlocks => {
            let mut src = match prebuilt_gen48 {
                Some(src) => src,
                None => Gen48Source::build(
                    &params.gen48,
                    &conds,
                    params.scan_limit,
                    params.cache_path.as_deref(),
                    &cancel,
                )
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "gen48 build failed, using full range");
                    Gen48Source::full_range()
                }),
            };
            src.skip_below(seed48(config.start_seed));
            Some(src)
        }
        _ => None,
    };

    let mut itemgen = ItemGen {
        mode: config.mode,
        mc: params.mc,
        conds: conds.clone(),
        backend: params.backend.clone(),
        item_size,
        next_id: 0,
        exhausted: false,
        cursor: config.start_seed,
        start: config.start_seed,
        list: list.clone(),
        index: 0,
        gen48,
        consumed: 0,
        last_prefix: seed48(config.start_seed) as i64,
        pending: None,
    };

    let (item_tx, item_rx) = bounded::<WorkItem>(queue_size);
    let (msg_tx, msg_rx) = unbounded::<WorkerMsg>();

    let mut workers = Vec::with_capacity(threads);
    for w in 0..threads {
        let item_rx = item_rx.clone();
        let msg_tx = msg_tx.clone();
        let conds = conds.clone();
        let backend = params.backend.clone();
        let list = list.clone();
        let cancel = cancel.clone();
        let mc = params.mc;
        workers.push(
            thread::Builder::new()
                .name(format!("seedquarry-worker-{}", w))
                .spawn(move || worker_run(mc, conds, backend, list, item_rx, msg_tx, cancel))
                .expect("failed to spawn worker"),
        );
    }
    drop(item_rx);
    drop(msg_tx);

    // completion window: slot i tracks item last_id + i
    let mut window: Vec<(bool, i64)> = vec![(false, 0); queue_size];
    let mut last_id: u64 = 0;
    let mut active: usize = 0;
    let mut cursor = itemgen.initial_cursor();
    let mut capped = false;

    // pre-fill the queue
    for _ in 0..queue_size {
        match itemgen.next_item(&cancel) {
            Some(item) => {
                active += 1;
                let _ = item_tx.send(item);
            }
            None => break,
        }
    }

    while active > 0 {
        let msg = match msg_rx.recv() {
            Ok(m) => m,
            Err(_) => break,
        };
        match msg {
            WorkerMsg::Done {
                id,
                last_seed,
                is_final,
            } => {
                active -= 1;
                if is_final {
                    itemgen.exhausted = true;
                }
                if cancel.load(Ordering::Relaxed) {
                    continue;
                }
                if id == last_id {
                    let len = window.len();
                    let mut k = 1;
                    while k < len && window[k].0 {
                        k += 1;
                    }
                    cursor = if k == 1 { last_seed } else { window[k - 1].1 };
                    for i in k..len {
                        window[i - k] = window[i];
                    }
                    for slot in window.iter_mut().skip(len - k) {
                        *slot = (false, 0);
                    }
                    last_id += k as u64;
                    for _ in 0..k {
                        match itemgen.next_item(&cancel) {
                            Some(item) => {
                                active += 1;
                                let _ = item_tx.send(item);
                            }
                            None => break,
                        }
                    }
                    let (done, total) = itemgen.progress();
                    let _ = event_tx.send(SearchEvent::Progress {
                        done,
                        total,
                        cursor,
                    });
                } else {
                    let idx = (id - last_id) as usize;
                    if idx < window.len() {
                        window[idx] = (true, last_seed);
                    }
                }
            }
            WorkerMsg::Canceled { id: _ } => {
                active -= 1;
            }
            WorkerMsg::Results(hits) => {
                let (added, full) = match sink.lock() {
                    Ok(mut s) => (s.add(hits), s.is_full()),
                    Err(_) => (0, false),
                };
                if added > 0 {
                    let _ = event_tx.send(SearchEvent::ResultsAdded(added));
                    if config.stop_on_result {
                        tracing::info!("hit found, stopping search");
                        cancel.store(true, Ordering::SeqCst);
                    }
                }
                if full && !capped {
                    capped = true;
                    tracing::warn!(max = config.max_results, "result cap reached, stopping");
                    cancel.store(true, Ordering::SeqCst);
                }
            }
        }
    }

    drop(item_tx);
    for w in workers {
        let _ = w.join();
    }

    let complete = itemgen.exhausted && !cancel.load(Ordering::Relaxed) && !capped;
    if complete {
        // the whole space was covered; the cursor reflects that
        cursor = match config.mode {
            SearchMode::Incremental => i64::MAX,
            _ => cursor,
        };
    }
    let (done, total) = itemgen.progress();
    let _ = event_tx.send(SearchEvent::Progress {
        done,
        total,
        cursor,
    });
    let _ = event_tx.send(SearchEvent::Finished { complete });
    drop(event_tx);

    let results = sink.lock().map(|s| s.seeds().to_vec()).unwrap_or_default();
    SearchOutcome {
        results,
        cursor,
        complete,
    }
}

// ============================================================================
// WORKERS
// ============================================================================

fn worker_run(
    mc: i32,
    conds: Arc<Vec<Condition>>,
    backend: Arc<dyn WorldBackend>,
    list: Arc<Vec<i64>>,
    item_rx: Receiver<WorkItem>,
    msg_tx: Sender<WorkerMsg>,
    cancel: Arc<AtomicBool>,
) {
    for item in item_rx.iter() {
        if cancel.load(Ordering::Relaxed) {
            let _ = msg_tx.send(WorkerMsg::Canceled { id: item.id });
            continue;
        }
        // the evaluator (and its generator view) lives exactly as long as
        // this item
        let mut ev = Evaluator::new(&*backend, mc, &conds);
        let mut hits = Vec::new();
        let mut canceled = false;
        let mut last_seed = item.seed;

        match item.kind {
            ItemKind::Range { count } => {
                for i in 0..count as i64 {
                    if cancel.load(Ordering::Relaxed) {
                        canceled = true;
                        break;
                    }
                    let seed = item.seed + i;
                    let mut state = PositionalState::default();
                    if ev.test_seed(seed, &mut state, &cancel, EvalPass::Full) {
                        hits.push(seed);
                    }
                    // the last item of the space ends on i64::MAX itself
                    last_seed = seed.saturating_add(1);
                }
            }
            ItemKind::List { start, count } => {
                for &seed in &list[start..start + count as usize] {
                    if cancel.load(Ordering::Relaxed) {
                        canceled = true;
                        break;
                    }
                    let mut state = PositionalState::default();
                    if ev.test_seed(seed, &mut state, &cancel, EvalPass::Full) {
                        hits.push(seed);
                    }
                    last_seed = seed;
                }
            }
            ItemKind::Family { count } => {
                // one 48-bit pass pins the Cat48 positions for the family
                let mut base_state = PositionalState::default();
                let prefix_ok = ev.test_seed(
                    item.seed,
                    &mut base_state,
                    &cancel,
                    EvalPass::Prefix48,
                );
                last_seed = seed48(item.seed) as i64;
                if prefix_ok {
                    for i in 0..count as i64 {
                        if cancel.load(Ordering::Relaxed) {
                            canceled = true;
                            break;
                        }
                        let seed = item.seed.wrapping_add(i << 48);
                        let mut state = base_state.clone();
                        if ev.test_seed(seed, &mut state, &cancel, EvalPass::UpperOnly) {
                            hits.push(seed);
                        }
                    }
                } else {
                    canceled = cancel.load(Ordering::Relaxed);
                }
            }
        }

        // never lose hits, even from a canceled item; the sink deduplicates
        if !hits.is_empty() {
            let _ = msg_tx.send(WorkerMsg::Results(hits));
        }
        if canceled {
            let _ = msg_tx.send(WorkerMsg::Canceled { id: item.id });
        } else {
            let _ = msg_tx.send(WorkerMsg::Done {
                id: item.id,
                last_seed,
                is_final: item.is_final,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;
    use crate::gen::LayeredBackend;
    use crate::types::MC_1_16;

    fn base_params(conds: Vec<Condition>) -> SearchParams {
        let mut p = SearchParams::new(MC_1_16, conds, Arc::new(LayeredBackend));
        p.config.threads = 2;
        p.config.seeds_per_item = 64;
        p.config.queue_size = 16;
        p.scan_limit = 2;
        p
    }

    /// A condition no seed satisfies: more slime chunks than the area holds.
    fn impossible_condition() -> Condition {
        let mut c = Condition::new(FilterKind::Slime, 1).with_area(0, 0, 3, 3);
        c.count = 1000;
        c
    }

    /// A condition every seed satisfies: at least one slime chunk in a
    /// large area.
    fn easy_condition() -> Condition {
        Condition::new(FilterKind::Slime, 1).with_area(-64, -64, 64, 64)
    }

    #[test]
    fn test_list_mode_empty_list_finishes_clean() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seeds.txt");
        std::fs::write(&path, "\n").unwrap();
        let mut p = base_params(vec![easy_condition()]);
        p.config.mode = SearchMode::List;
        p.config.seed_list_path = Some(path);
        let outcome = start(p).unwrap().join();
        assert!(outcome.complete);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_list_mode_finds_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seeds.txt");
        std::fs::write(&path, "1\n2\n3\n2\n").unwrap();
        let mut p = base_params(vec![easy_condition()]);
        p.config.mode = SearchMode::List;
        p.config.seed_list_path = Some(path);
        let outcome = start(p).unwrap().join();
        assert!(outcome.complete);
        let mut results = outcome.results;
        results.sort_unstable();
        assert_eq!(results, vec![1, 2, 3]);
    }

    #[test]
    fn test_incremental_near_boundary_terminates() {
        let mut p = base_params(vec![impossible_condition()]);
        p.config.start_seed = i64::MAX - 1000;
        let outcome = start(p).unwrap().join();
        assert!(outcome.complete);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.cursor, i64::MAX);
    }

    #[test]
    fn test_max_results_cap_stops_run() {
        let mut p = base_params(vec![easy_condition()]);
        p.config.max_results = 10;
        let outcome = start(p).unwrap().join();
        assert!(!outcome.complete);
        assert_eq!(outcome.results.len(), 10);
    }

    #[test]
    fn test_validation_rejects_before_spawn() {
        let mut bad = easy_condition();
        bad.save = 0;
        let p = base_params(vec![bad]);
        assert!(start(p).is_err());
    }
}
