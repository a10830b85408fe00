//! Session round-trip scenarios.

use seedquarry::filter::{Condition, FilterKind};
use seedquarry::search::{Gen48Mode, SearchMode};
use seedquarry::session::Session;
use seedquarry::types::MC_1_16;

fn configured_session() -> Session {
    let mut s = Session::default();
    s.mc = MC_1_16;
    s.search.mode = SearchMode::FamilyBlocks;
    s.search.start_seed = 77_000_000_001;
    s.search.threads = 6;
    s.search.stop_on_result = true;
    s.gen48.mode = Gen48Mode::Quad;
    s.gen48.qual = 0;
    s.gen48.qm_area = 95;
    s.gen48.salt = 1234;
    s.gen48.manual_area = Some((-2, -2, 1, 1));

    let hut = Condition::new(FilterKind::QhIdeal, 1).with_area(-1, -1, 0, 0);
    let mut biome = Condition::new(FilterKind::Biome, 5).with_area(-128, -128, 128, 128);
    biome.biome_incl = 1 << 14; // mushroom fields
    biome.relative = 1;
    let mut temps = Condition::new(FilterKind::Temps, 9).with_area(-2, -2, 2, 2);
    temps.temps = [1, 0, 2, 0, 0, 0, 0, 0, 1];
    s.conditions = vec![hut, biome, temps];

    s.results = (0..17).map(|i| (i as i64 - 8) * 987_654_321_987).collect();
    s
}

#[test]
fn test_save_clear_load_restores_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.save");
    let original = configured_session();
    original.save(&path).unwrap();

    let loaded = Session::load(&path, false).unwrap();
    assert_eq!(loaded.mc, original.mc);
    assert_eq!(loaded.search, original.search);
    assert_eq!(loaded.gen48, original.gen48);
    assert_eq!(loaded.conditions, original.conditions);
    assert_eq!(loaded.results, original.results);
}

#[test]
fn test_serialization_is_stable_modulo_timestamp() {
    let s = configured_session();
    let strip_time = |text: &str| -> String {
        text.lines()
            .filter(|l| !l.starts_with("#Time:"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let a = strip_time(&s.to_text());
    let b = strip_time(&Session::from_text(&s.to_text(), false).unwrap().to_text());
    assert_eq!(a, b);
}

#[test]
fn test_condition_hex_is_byte_identical_after_reload() {
    let s = configured_session();
    let text = s.to_text();
    let hex_lines: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("#Cond:"))
        .collect();
    assert_eq!(hex_lines.len(), 3);

    let reloaded = Session::from_text(&text, false).unwrap();
    for (line, cond) in hex_lines.iter().zip(&reloaded.conditions) {
        let hex = line.strip_prefix("#Cond:").unwrap().trim();
        assert_eq!(hex, cond.to_hex());
    }
}

#[test]
fn test_truncated_condition_rejects_whole_file() {
    let s = configured_session();
    let text = s.to_text();
    // drop two hex chars from the first condition line
    let broken: String = text
        .lines()
        .map(|l| {
            if l.starts_with("#Cond:") {
                l[..l.len() - 2].to_string()
            } else {
                l.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    assert!(Session::from_text(&broken, false).is_err());
}

#[test]
fn test_load_failure_leaves_caller_state_untouched() {
    // the parse builds a fresh session; a failure returns nothing to apply
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.save");
    std::fs::write(&path, "#Version:  0.1.0\ngarbage-line\n").unwrap();
    assert!(Session::load(&path, false).is_err());
    assert!(Session::load_quiet(&path).is_none());
}
