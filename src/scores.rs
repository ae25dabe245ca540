//! Running per-nickname totals kept across games.
//!
//! Totals are loaded once when the controller is built and written back after each
//! recorded result. Storage is owned by a [`ScoreRepository`] supplied by the host; the
//! byte format below is what [`MemoryScoreRepository`] and the WASM facade exchange.
//!
//! Blob layout (little-endian):
//! `RVSB` | version u32 | entry count u32 | CRC32 of payload u32 | reserved u32 | payload,
//! where each payload entry is `name length u16 | UTF-8 name | total u32`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::ScoreboardError;
use crate::types::ScoreTally;

const MAGIC: &[u8; 4] = b"RVSB";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub total: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    totals: BTreeMap<String, u32>,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, name: &str) -> Option<u32> {
        self.totals.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Adds each side's disk count to its nickname's total. New names start from zero.
    pub fn add_result(&mut self, black_name: &str, white_name: &str, tally: ScoreTally) {
        *self.totals.entry(black_name.to_string()).or_insert(0) += u32::from(tally.black);
        *self.totals.entry(white_name.to_string()).or_insert(0) += u32::from(tally.white);
    }

    /// Entries by descending total, ties by name.
    pub fn leaderboard(&self) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self
            .totals
            .iter()
            .map(|(name, &total)| ScoreEntry {
                name: name.clone(),
                total,
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ScoreboardError> {
        let mut payload = Vec::new();
        for (name, total) in &self.totals {
            let len = u16::try_from(name.len())
                .map_err(|_| ScoreboardError::NameTooLong(name.len()))?;
            payload.extend_from_slice(&len.to_le_bytes());
            payload.extend_from_slice(name.as_bytes());
            payload.extend_from_slice(&total.to_le_bytes());
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(self.totals.len() as u32).to_le_bytes());
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, ScoreboardError> {
        if data.len() < HEADER_SIZE {
            return Err(ScoreboardError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if &data[0..4] != MAGIC {
            return Err(ScoreboardError::BadMagic);
        }

        let version = read_u32_le(data, 4, "version")?;
        if version != VERSION {
            return Err(ScoreboardError::UnsupportedVersion {
                expected: VERSION,
                actual: version,
            });
        }

        let count = read_u32_le(data, 8, "entry count")? as usize;
        let expected_crc = read_u32_le(data, 12, "checksum")?;
        let payload = &data[HEADER_SIZE..];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(ScoreboardError::ChecksumMismatch {
                expected: expected_crc,
                actual: actual_crc,
            });
        }

        let mut totals = BTreeMap::new();
        let mut offset = 0usize;
        for entry in 0..count {
            let len = read_u16_le(payload, offset, "name length")? as usize;
            offset += 2;
            let name_bytes = payload
                .get(offset..offset + len)
                .ok_or(ScoreboardError::Truncated("name"))?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| ScoreboardError::InvalidUtf8(entry))?
                .to_string();
            offset += len;
            let total = read_u32_le(payload, offset, "total")?;
            offset += 4;
            totals.insert(name, total);
        }

        if offset != payload.len() {
            return Err(ScoreboardError::TrailingBytes);
        }

        Ok(Self { totals })
    }
}

/// Where the scoreboard lives between sessions.
pub trait ScoreRepository {
    fn load(&self) -> Result<Scoreboard, ScoreboardError>;
    fn save(&mut self, scoreboard: &Scoreboard) -> Result<(), ScoreboardError>;
}

/// Keeps the encoded scoreboard in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreRepository {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with a previously exported blob.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(bytes))),
        }
    }

    /// The last saved blob, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ScoreRepository for MemoryScoreRepository {
    fn load(&self) -> Result<Scoreboard, ScoreboardError> {
        let guard = self
            .blob
            .lock()
            .map_err(|err| ScoreboardError::Repository(err.to_string()))?;
        match guard.as_deref() {
            Some(bytes) => Scoreboard::from_bytes(bytes),
            None => Ok(Scoreboard::new()),
        }
    }

    fn save(&mut self, scoreboard: &Scoreboard) -> Result<(), ScoreboardError> {
        let bytes = scoreboard.to_bytes()?;
        let mut guard = self
            .blob
            .lock()
            .map_err(|err| ScoreboardError::Repository(err.to_string()))?;
        *guard = Some(bytes);
        Ok(())
    }
}

fn read_u32_le(data: &[u8], offset: usize, what: &'static str) -> Result<u32, ScoreboardError> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(ScoreboardError::Truncated(what))?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf))
}

fn read_u16_le(data: &[u8], offset: usize, what: &'static str) -> Result<u16, ScoreboardError> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(ScoreboardError::Truncated(what))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scoreboard {
        let mut board = Scoreboard::new();
        board.add_result("ala", "bob", ScoreTally { black: 40, white: 24 });
        board.add_result("bob", "cyd", ScoreTally { black: 30, white: 30 });
        board
    }

    #[test]
    fn add_result_accumulates_per_nickname() {
        let board = sample();

        assert_eq!(board.total("ala"), Some(40));
        assert_eq!(board.total("bob"), Some(54));
        assert_eq!(board.total("cyd"), Some(30));
        assert_eq!(board.total("dee"), None);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn leaderboard_orders_by_total_then_name() {
        let mut board = sample();
        board.add_result("aaa", "zed", ScoreTally { black: 30, white: 0 });

        let names: Vec<_> = board.leaderboard().into_iter().map(|e| e.name).collect();

        assert_eq!(names, vec!["bob", "ala", "aaa", "cyd", "zed"]);
    }

    #[test]
    fn bytes_survive_encoding() {
        let board = sample();
        let bytes = board.to_bytes().unwrap();

        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(Scoreboard::from_bytes(&bytes), Ok(board));
        assert_eq!(
            Scoreboard::from_bytes(&Scoreboard::new().to_bytes().unwrap()),
            Ok(Scoreboard::new())
        );
    }

    #[test]
    fn from_bytes_rejects_corruption() {
        let bytes = sample().to_bytes().unwrap();

        assert!(matches!(
            Scoreboard::from_bytes(&bytes[..10]),
            Err(ScoreboardError::TooShort { .. })
        ));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert_eq!(Scoreboard::from_bytes(&bad_magic), Err(ScoreboardError::BadMagic));

        let mut bad_version = bytes.clone();
        bad_version[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            Scoreboard::from_bytes(&bad_version),
            Err(ScoreboardError::UnsupportedVersion { actual: 2, .. })
        ));

        let mut flipped = bytes.clone();
        let last = flipped.len() - 1;
        flipped[last] ^= 0x01;
        assert!(matches!(
            Scoreboard::from_bytes(&flipped),
            Err(ScoreboardError::ChecksumMismatch { .. })
        ));

        let mut truncated = bytes.clone();
        truncated.pop();
        let crc = crc32fast::hash(&truncated[HEADER_SIZE..]);
        truncated[12..16].copy_from_slice(&crc.to_le_bytes());
        assert_eq!(
            Scoreboard::from_bytes(&truncated),
            Err(ScoreboardError::Truncated("total"))
        );
    }

    #[test]
    fn memory_repository_round_trips_through_bytes() {
        let mut repo = MemoryScoreRepository::new();
        assert_eq!(repo.load(), Ok(Scoreboard::new()));

        repo.save(&sample()).unwrap();
        let shared = repo.clone();

        assert_eq!(shared.load(), Ok(sample()));
        assert!(shared.bytes().is_some());
        assert_eq!(
            MemoryScoreRepository::with_bytes(b"nope".to_vec()).load(),
            Err(ScoreboardError::TooShort {
                expected: 20,
                actual: 4
            })
        );
    }
}
