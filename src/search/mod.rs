//! The search pipeline: evaluator, candidate source, scheduler.

pub mod evaluator;
pub mod gen48;
pub mod protobase;
pub mod quad;
pub mod scheduler;

use std::path::PathBuf;

pub use evaluator::{EvalPass, Evaluator, PositionalState};
pub use gen48::{read_seed_list, Gen48Mode, Gen48Settings, Gen48Source, FULL_SCAN_LIMIT};
pub use quad::QuadClass;
pub use scheduler::{SearchHandle, SearchOutcome, SearchParams};

/// Top-level search strategy, fixed for the lifetime of a run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchMode {
    /// Full 64-bit seeds counting up from `start_seed`.
    Incremental,
    /// 48-bit candidates from Gen48, expanded into upper-16-bit families.
    FamilyBlocks,
    /// Full evaluator over an explicit seed list.
    List,
}

impl SearchMode {
    pub fn to_int(self) -> i32 {
        match self {
            Self::Incremental => 0,
            Self::FamilyBlocks => 1,
            Self::List => 2,
        }
    }

    pub fn from_int(v: i32) -> Option<Self> {
        Some(match v {
            0 => Self::Incremental,
            1 => Self::FamilyBlocks,
            2 => Self::List,
            _ => return None,
        })
    }
}

/// Run configuration owned by the controller and shared read-only with
/// workers for the duration of a run.
#[derive(Clone, PartialEq, Debug)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub start_seed: i64,
    /// 0 = hardware parallelism.
    pub threads: usize,
    pub stop_on_result: bool,
    pub seed_list_path: Option<PathBuf>,
    pub max_results: usize,
    /// Seeds per work item.
    pub seeds_per_item: usize,
    /// Outstanding-item window size.
    pub queue_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Incremental,
            start_seed: 0,
            threads: 0,
            stop_on_result: false,
            seed_list_path: None,
            max_results: 65536,
            seeds_per_item: 1024,
            queue_size: 1024,
        }
    }
}

/// Events delivered to the UI layer over a bounded channel: the producer
/// blocks rather than outrun the consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchEvent {
    /// Dispatch-side progress plus the monotonic completed-seed cursor:
    /// every candidate strictly below `cursor` has been fully evaluated.
    Progress { done: u64, total: u64, cursor: i64 },
    ResultsAdded(usize),
    /// The run is over. `complete` is false for aborted runs.
    Finished { complete: bool },
}
