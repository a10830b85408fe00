//! Binary store for scanned quad proto-bases.
//!
//! The origin-base scan behind the Quad and Monument48 generator modes is
//! expensive, so its output is persisted and reloaded when the scan
//! parameters match.
//!
//! Header layout (little-endian):
//! - magic:      4 bytes ("QB48")
//! - version:    1 byte
//! - kind:       1 byte
//! - qual:       1 byte
//! - reserved:   1 byte (must be 0)
//! - salt:       8 bytes (i64)
//! - scan_limit: 8 bytes (u64)
//! - count:      8 bytes (u64)
//! followed by `count` u64 base seeds.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;

const MAGIC: &[u8; 4] = b"QB48";
const FORMAT_VERSION: u8 = 1;
const HEADER_SIZE: usize = 32;

/// Scan parameters a stored base list is keyed by.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProtoKey {
    pub kind: u8,
    pub qual: u8,
    pub salt: i64,
    pub scan_limit: u64,
}

/// Load a base list if the file exists, parses, and matches `key`.
/// Any mismatch or IO failure is treated as a cache miss.
pub fn load(path: &Path, key: ProtoKey) -> Option<Vec<u64>> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header).ok()?;
    if &header[0..4] != MAGIC || header[4] != FORMAT_VERSION {
        return None;
    }
    let stored = ProtoKey {
        kind: header[5],
        qual: header[6],
        salt: i64::from_le_bytes(header[8..16].try_into().ok()?),
        scan_limit: u64::from_le_bytes(header[16..24].try_into().ok()?),
    };
    if stored != key || header[7] != 0 {
        return None;
    }
    let count = u64::from_le_bytes(header[24..32].try_into().ok()?) as usize;

    let mut bases = Vec::with_capacity(count);
    let mut buf = [0u8; 8];
    for _ in 0..count {
        reader.read_exact(&mut buf).ok()?;
        bases.push(u64::from_le_bytes(buf));
    }
    tracing::debug!(count, path = %path.display(), "loaded proto-base cache");
    Some(bases)
}

/// Persist a base list for `key`, replacing any previous file.
pub fn save(path: &Path, key: ProtoKey, bases: &[u64]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(MAGIC);
    header[4] = FORMAT_VERSION;
    header[5] = key.kind;
    header[6] = key.qual;
    header[8..16].copy_from_slice(&key.salt.to_le_bytes());
    header[16..24].copy_from_slice(&key.scan_limit.to_le_bytes());
    header[24..32].copy_from_slice(&(bases.len() as u64).to_le_bytes());
    writer.write_all(&header)?;

    for &b in bases {
        writer.write_all(&b.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bases.qb48");
        let key = ProtoKey {
            kind: 0,
            qual: 3,
            salt: -7,
            scan_limit: 1 << 12,
        };
        let bases = vec![1u64, 99, 0x0000_FFFF_FFFF_FFFF];
        save(&path, key, &bases).unwrap();
        assert_eq!(load(&path, key), Some(bases));
    }

    #[test]
    fn test_key_mismatch_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bases.qb48");
        let key = ProtoKey {
            kind: 0,
            qual: 3,
            salt: 0,
            scan_limit: 1 << 12,
        };
        save(&path, key, &[5, 6]).unwrap();
        let other = ProtoKey { salt: 1, ..key };
        assert_eq!(load(&path, other), None);
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let key = ProtoKey {
            kind: 1,
            qual: 0,
            salt: 0,
            scan_limit: 0,
        };
        assert_eq!(load(Path::new("/nonexistent/bases.qb48"), key), None);
    }
}
