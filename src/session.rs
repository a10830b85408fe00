//! The line-oriented session format.
//!
//! `#Key:` header records, hex condition dumps, then one decimal result
//! seed per line. Unknown keys are skipped for forwards compatibility; a
//! newer version header raises a warning but parsing proceeds. A malformed
//! line or a condition record of the wrong size rejects the whole file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};
use crate::filter::Condition;
use crate::search::{Gen48Mode, Gen48Settings, SearchConfig, SearchMode};
use crate::types::{mc2str, str2mc, MC_1_16};

/// A search session: everything needed to resume a run plus its hits.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub mc: i32,
    pub search: SearchConfig,
    pub gen48: Gen48Settings,
    pub conditions: Vec<Condition>,
    pub results: Vec<i64>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            mc: MC_1_16,
            search: SearchConfig::default(),
            gen48: Gen48Settings::default(),
            conditions: Vec::new(),
            results: Vec::new(),
        }
    }
}

fn app_version() -> (u32, u32, u32) {
    let mut parts = env!("CARGO_PKG_VERSION").split('.').map(|p| p.parse().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

impl Session {
    /// Serialize to the session text form.
    pub fn to_text(&self) -> String {
        let (major, minor, patch) = app_version();
        let mut out = String::new();
        let _ = writeln!(out, "#Version:  {}.{}.{}", major, minor, patch);
        let _ = writeln!(
            out,
            "#Time:     {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "#MC:       {}", mc2str(self.mc).unwrap_or("1.16"));
        let _ = writeln!(out, "#Search:   {}", self.search.mode.to_int());
        if let Some(path) = &self.search.seed_list_path {
            let _ = writeln!(out, "#List64:   {}", path.display());
        }
        let _ = writeln!(out, "#Progress: {}", self.search.start_seed);
        let _ = writeln!(out, "#Threads:  {}", self.search.threads);
        let _ = writeln!(out, "#ResStop:  {}", self.search.stop_on_result as i32);
        let _ = writeln!(out, "#Mode48:   {}", self.gen48.mode.to_int());
        if let Some(path) = &self.gen48.list48_path {
            let _ = writeln!(out, "#List48:   {}", path.display());
        }
        let _ = writeln!(out, "#HutQual:  {}", self.gen48.qual);
        let _ = writeln!(out, "#MonArea:  {}", self.gen48.qm_area);
        if self.gen48.salt != 0 {
            let _ = writeln!(out, "#Salt:     {}", self.gen48.salt);
        }
        if let Some((x1, z1, x2, z2)) = self.gen48.manual_area {
            let _ = writeln!(out, "#Gen48X1:  {}", x1);
            let _ = writeln!(out, "#Gen48Z1:  {}", z1);
            let _ = writeln!(out, "#Gen48X2:  {}", x2);
            let _ = writeln!(out, "#Gen48Z2:  {}", z2);
        }
        for c in &self.conditions {
            let _ = writeln!(out, "#Cond:     {}", c.to_hex());
        }
        for s in &self.results {
            let _ = writeln!(out, "{}", s);
        }
        out
    }

    /// Parse the session text form. Nothing is applied on failure.
    pub fn from_text(text: &str, quiet: bool) -> Result<Self> {
        let mut lines = text.lines();
        let first = lines
            .next()
            .ok_or_else(|| SearchError::Parse("empty session file".into()))?;
        let version = first
            .strip_prefix("#Version:")
            .map(str::trim)
            .ok_or_else(|| SearchError::Parse("missing #Version header".into()))?;
        let mut vp = version.split('.').map(|p| p.parse::<u32>());
        let (major, minor, patch) = match (vp.next(), vp.next(), vp.next()) {
            (Some(Ok(a)), Some(Ok(b)), Some(Ok(c))) => (a, b, c),
            _ => {
                return Err(SearchError::Parse(format!(
                    "malformed #Version header: {:?}",
                    version
                )))
            }
        };
        if (major, minor, patch) > app_version() && !quiet {
            tracing::warn!(
                "session file was created with a newer version ({}.{}.{})",
                major,
                minor,
                patch
            );
        }

        let mut session = Session::default();
        // manual gen48 area accumulates from any of the four keys
        let mut g48 = (0, 0, 0, 0);
        let mut g48_manual = false;

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            if let Some(rest) = line.strip_prefix('#') {
                let (key, value) = match rest.split_once(':') {
                    Some((k, v)) => (k, v.trim()),
                    None => continue, // unknown header shape, skip
                };
                match key {
                    "Time" => {}
                    "MC" => {
                        session.mc = str2mc(value).ok_or_else(|| {
                            SearchError::Parse(format!("unknown MC version {:?}", value))
                        })?;
                    }
                    "Search" => {
                        let v = parse_int(value)?;
                        session.search.mode = SearchMode::from_int(v as i32).ok_or_else(|| {
                            SearchError::Parse(format!("invalid search mode {}", v))
                        })?;
                    }
                    "List64" => session.search.seed_list_path = Some(PathBuf::from(value)),
                    "Progress" => session.search.start_seed = parse_int(value)?,
                    "Threads" => session.search.threads = parse_int(value)? as usize,
                    "ResStop" => session.search.stop_on_result = parse_int(value)? != 0,
                    "Mode48" => {
                        let v = parse_int(value)?;
                        session.gen48.mode = Gen48Mode::from_int(v as i32).ok_or_else(|| {
                            SearchError::Parse(format!("invalid gen48 mode {}", v))
                        })?;
                    }
                    "List48" => session.gen48.list48_path = Some(PathBuf::from(value)),
                    "HutQual" => session.gen48.qual = parse_int(value)? as i32,
                    "MonArea" => session.gen48.qm_area = parse_int(value)? as i32,
                    "Salt" => session.gen48.salt = parse_int(value)?,
                    "Gen48X1" => {
                        g48.0 = parse_int(value)? as i32;
                        g48_manual = true;
                    }
                    "Gen48Z1" => {
                        g48.1 = parse_int(value)? as i32;
                        g48_manual = true;
                    }
                    "Gen48X2" => {
                        g48.2 = parse_int(value)? as i32;
                        g48_manual = true;
                    }
                    "Gen48Z2" => {
                        g48.3 = parse_int(value)? as i32;
                        g48_manual = true;
                    }
                    "Cond" => session.conditions.push(Condition::from_hex(value)?),
                    _ => {} // forwards compatibility: unknown keys ignored
                }
            } else {
                let seed: i64 = line.trim().parse().map_err(|_| {
                    SearchError::Parse(format!("not a result seed: {:?}", line))
                })?;
                session.results.push(seed);
            }
        }
        if g48_manual {
            session.gen48.manual_area = Some(g48);
        }
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Quiet save for autosave paths: errors are swallowed.
    pub fn save_quiet(&self, path: &Path) -> bool {
        match self.save(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, path = %path.display(), "quiet session save failed");
                false
            }
        }
    }

    pub fn load(path: &Path, quiet: bool) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_text(&text, quiet)
    }

    /// Quiet load for session restore: errors are swallowed.
    pub fn load_quiet(path: &Path) -> Option<Self> {
        Self::load(path, true).ok()
    }
}

fn parse_int(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| SearchError::Parse(format!("not an integer: {:?}", value)))
}
