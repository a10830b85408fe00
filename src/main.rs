use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use tracing_subscriber::EnvFilter;

use seedquarry::cli::{parse_i64, Args};
use seedquarry::config::AppConfig;
use seedquarry::gen::LayeredBackend;
use seedquarry::results::format_seed;
use seedquarry::search::{scheduler, Gen48Mode, SearchEvent, SearchParams};
use seedquarry::session::Session;
use seedquarry::types::str2mc;
use seedquarry::util::{format_num, format_speed, format_time, parse_seed, shadow_seed};

const CONFIG_FILE: &str = "seedquarry.json";
const DEFAULT_SESSION: &str = "session.save";
const PROTOBASE_FILE: &str = "protobases.qb48";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load_or_default(Path::new(CONFIG_FILE));

    let session_path = args
        .session
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION));
    let mut session = if session_path.exists() {
        match Session::load(&session_path, false) {
            Ok(s) => {
                println!(
                    "[✓] Loaded session: {} conditions, {} results, cursor {}",
                    s.conditions.len(),
                    s.results.len(),
                    s.search.start_seed
                );
                s
            }
            Err(e) => {
                eprintln!("[✗] Failed to load {}: {}", session_path.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        Session::default()
    };

    apply_overrides(&mut session, &args, &config);

    if session.conditions.is_empty() {
        eprintln!("[✗] No conditions configured; every seed would match.");
        eprintln!("    Load a session file with #Cond: records via --session.");
        std::process::exit(2);
    }

    let mut params = SearchParams::new(
        session.mc,
        session.conditions.clone(),
        Arc::new(LayeredBackend),
    );
    params.config = session.search.clone();
    params.gen48 = session.gen48.clone();
    params.cache_path = Some(PathBuf::from(PROTOBASE_FILE));
    params.preload_results = session.results.clone();

    let handle = match scheduler::start(params) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("[✗] {}", e);
            std::process::exit(1);
        }
    };

    let cancel = handle.cancel_flag();
    ctrlc::set_handler(move || {
        println!("\n[!] Stopping...");
        cancel.store(true, std::sync::atomic::Ordering::SeqCst);
    })
    .ok();

    println!("[▶] Searching... (Ctrl+C to stop)\n");

    let start = Instant::now();
    let autosave_period = Duration::from_secs(config.autosave_cycle as u64 * 60);
    let mut last_autosave = Instant::now();
    let mut last_status = Instant::now();
    let mut last_done = 0u64;
    let mut done = 0u64;
    let mut total = 0u64;
    let mut cursor = session.search.start_seed;
    let mut hits = session.results.len();

    loop {
        match handle.events.recv_timeout(Duration::from_millis(200)) {
            Ok(SearchEvent::Progress {
                done: d,
                total: t,
                cursor: c,
            }) => {
                done = d;
                total = t;
                cursor = c;
            }
            Ok(SearchEvent::ResultsAdded(n)) => hits += n,
            Ok(SearchEvent::Finished { complete }) => {
                if complete {
                    println!("\n[✓] Search space exhausted.");
                } else {
                    println!("\n[!] Search stopped.");
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if !args.quiet && last_status.elapsed() >= Duration::from_millis(200) {
            let elapsed = start.elapsed().as_secs_f64();
            let rate = (done - last_done) as f64 / last_status.elapsed().as_secs_f64();
            print!(
                "\r[⚡] {} / {} | {} | {} hits | {}    ",
                format_num(done),
                format_num(total),
                format_speed(rate),
                hits,
                format_time(elapsed)
            );
            stdout().flush().ok();
            last_status = Instant::now();
            last_done = done;
        }

        if config.autosave_cycle > 0 && last_autosave.elapsed() >= autosave_period {
            session.search.start_seed = cursor;
            session.results = handle.results_snapshot();
            session.save_quiet(&session_path);
            last_autosave = Instant::now();
        }
    }

    let outcome = handle.join();
    session.search.start_seed = outcome.cursor;
    session.results = outcome.results;

    for &seed in &session.results {
        if args.shadow {
            println!("{}  shadow {}", format_seed(seed), shadow_seed(seed));
        } else {
            println!("{}", format_seed(seed));
        }
    }

    if let Err(e) = session.save(&session_path) {
        eprintln!("[✗] Failed to save session: {}", e);
    }

    let elapsed = start.elapsed().as_secs_f64();
    println!(
        "\n[Done] {} candidates in {} @ {} | {} results | resume cursor {}",
        format_num(done),
        format_time(elapsed),
        format_speed(done as f64 / elapsed.max(1e-9)),
        session.results.len(),
        session.search.start_seed
    );
}

fn apply_overrides(session: &mut Session, args: &Args, config: &AppConfig) {
    if let Some(threads) = args.threads {
        session.search.threads = threads;
    }
    if let Some(mode) = args.mode {
        session.search.mode = mode.into();
    }
    if let Some(start) = &args.start {
        let seed = parse_i64(start).unwrap_or_else(|_| parse_seed(start).0);
        session.search.start_seed = seed;
    }
    if let Some(mc) = &args.mc {
        match str2mc(mc) {
            Some(v) => session.mc = v,
            None => {
                eprintln!("[✗] Unknown MC version: {}", mc);
                std::process::exit(2);
            }
        }
    }
    if let Some(path) = &args.list64 {
        session.search.seed_list_path = Some(path.clone());
    }
    if let Some(path) = &args.list48 {
        session.gen48.list48_path = Some(path.clone());
        session.gen48.mode = Gen48Mode::List48;
    }
    if args.stop_on_result {
        session.search.stop_on_result = true;
    }
    session.search.max_results = args.max_results.unwrap_or(config.max_matching);
    session.search.seeds_per_item = config.seeds_per_item;
    session.search.queue_size = config.queue_size;
}
