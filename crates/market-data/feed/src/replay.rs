//! Binary dump and replay of feed record streams
//!
//! Records are appended raw as fixed-size frames; the replayer reads
//! fixed-size chunks and invokes a callback per record. A trailing partial
//! frame is treated as end of stream.

use crate::record::{FeedRecord, RECORD_SIZE};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write a record log to a binary dump file.
pub fn write_records(records: &[FeedRecord], path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating feed dump {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        writer.write_all(&record.encode())?;
    }
    writer.flush()?;
    debug!(count = records.len(), path = %path.display(), "feed dump written");
    Ok(())
}

/// Reads binary feed dumps and replays the records.
pub struct FeedReplayer {
    path: PathBuf,
}

impl FeedReplayer {
    /// Replayer for the dump at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replay every record, invoking the callback for each.
    /// Returns the record count.
    pub fn replay(&self, mut callback: impl FnMut(&FeedRecord)) -> Result<usize> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening feed dump {}", self.path.display()))?;
        let mut reader = BufReader::new(file);

        let mut buf = [0u8; RECORD_SIZE];
        let mut count = 0usize;
        loop {
            match reader.read_exact(&mut buf) {
                Ok(()) => {
                    let record = FeedRecord::decode(&buf)
                        .with_context(|| format!("decoding record {count}"))?;
                    callback(&record);
                    count += 1;
                }
                Err(err) if err.kind() == ErrorKind::UnexpectedEof => break,
                Err(err) => return Err(err.into()),
            }
        }
        debug!(count, path = %self.path.display(), "feed replay complete");
        Ok(count)
    }

    /// Load the whole dump into memory.
    pub fn load_all(&self) -> Result<Vec<FeedRecord>> {
        let mut records = Vec::new();
        self.replay(|record| records.push(*record))?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Px, Qty, Side, Symbol, Trade, Ts};

    #[test]
    fn empty_file_replays_nothing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.bin");
        write_records(&[], &path)?;

        let replayer = FeedReplayer::new(&path);
        assert_eq!(replayer.replay(|_| {})?, 0);
        assert!(replayer.load_all()?.is_empty());
        Ok(())
    }

    #[test]
    fn truncated_tail_is_end_of_stream() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("truncated.bin");

        let trade = Trade {
            sequence: 1,
            buy_order_id: 1,
            sell_order_id: 2,
            price: Px::from_ticks(10_000),
            quantity: Qty::new(10),
            exec_time: Ts::from_nanos(5),
            aggressor: Side::Buy,
            symbol: Symbol::new("TEST"),
        };
        let record = FeedRecord::make_trade(1, &trade);

        let mut bytes = record.encode().to_vec();
        bytes.extend_from_slice(&record.encode()[..RECORD_SIZE / 2]);
        std::fs::write(&path, &bytes)?;

        let records = FeedReplayer::new(&path).load_all()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], record);
        Ok(())
    }
}
