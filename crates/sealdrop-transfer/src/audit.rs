//! Audit sinks for transfer records
//!
//! The coordinator only produces records; sinks never hand them back to it.
//! A sink that cannot persist a record logs the problem and carries on, so an
//! audit outage never changes a transfer's outcome.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use sealdrop_core::TransferRecord;
use tracing::{info, warn};

/// Append-only destination for [`TransferRecord`]s
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &TransferRecord);
}

/// Emits each record as a structured tracing event on target `sealdrop::audit`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &TransferRecord) {
        info!(
            target: "sealdrop::audit",
            event = record.operation.as_str(),
            object_id = %record.object_id,
            size = record.size,
            hash = record.digest.as_deref(),
            outcome = record.outcome.as_str(),
            "transfer"
        );
    }
}

/// Appends one JSON object per line to a file.
///
/// Lines are handed to a dedicated writer thread over a channel, so `record`
/// never does file I/O on the caller's (async) thread. Dropping the sink
/// drains the queue and joins the writer.
pub struct JsonLinesAuditSink {
    path: PathBuf,
    tx: Option<Sender<WriterMsg>>,
    writer: Option<JoinHandle<()>>,
}

enum WriterMsg {
    Line(Vec<u8>),
    Flush(Sender<()>),
}

impl JsonLinesAuditSink {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating audit log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening audit log {}", path.display()))?;

        let (tx, rx) = mpsc::channel();
        let writer_path = path.to_path_buf();
        let writer = std::thread::Builder::new()
            .name("sealdrop-audit".into())
            .spawn(move || write_lines(file, &writer_path, rx))
            .context("spawning audit writer thread")?;

        Ok(Self {
            path: path.to_path_buf(),
            tx: Some(tx),
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until every record handed over so far has reached the file.
    pub fn flush(&self) {
        let Some(tx) = &self.tx else { return };
        let (ack_tx, ack_rx) = mpsc::channel();
        if tx.send(WriterMsg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

fn write_lines(mut file: File, path: &Path, rx: Receiver<WriterMsg>) {
    for msg in rx {
        match msg {
            WriterMsg::Line(line) => {
                if let Err(e) = file.write_all(&line) {
                    warn!(path = %path.display(), error = %e, "audit log write failed");
                }
            }
            WriterMsg::Flush(ack) => {
                if let Err(e) = file.flush() {
                    warn!(path = %path.display(), error = %e, "audit log flush failed");
                }
                let _ = ack.send(());
            }
        }
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, record: &TransferRecord) {
        let mut line = match serde_json::to_vec(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "audit record serialization failed");
                return;
            }
        };
        line.push(b'\n');

        let sent = self
            .tx
            .as_ref()
            .is_some_and(|tx| tx.send(WriterMsg::Line(line)).is_ok());
        if !sent {
            warn!(path = %self.path.display(), "audit writer stopped; record dropped");
        }
    }
}

impl Drop for JsonLinesAuditSink {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop once the queue is drained
        drop(self.tx.take());
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                warn!(path = %self.path.display(), "audit writer thread panicked");
            }
        }
    }
}

/// Forwards every record to each inner sink in order
#[derive(Default, Clone)]
pub struct FanoutAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl FanoutAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for FanoutAuditSink {
    fn record(&self, record: &TransferRecord) {
        for sink in &self.sinks {
            sink.record(record);
        }
    }
}

/// Keeps records in memory; for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<TransferRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &TransferRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealdrop_core::{Operation, Outcome};

    fn sample(outcome: Outcome) -> TransferRecord {
        TransferRecord::new("file-1-2-a.txt", Operation::Ingest, outcome)
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.record(&sample(Outcome::Success));
        sink.record(&sample(Outcome::StorageFailure));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, Outcome::Success);
        assert_eq!(records[1].outcome, Outcome::StorageFailure);
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(MemoryAuditSink::new());
        let b = Arc::new(MemoryAuditSink::new());
        let fanout = FanoutAuditSink::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(TracingAuditSink));

        fanout.record(&sample(Outcome::Success));

        assert_eq!(fanout.len(), 3);
        assert_eq!(a.records().len(), 1);
        assert_eq!(b.records().len(), 1);
    }

    #[test]
    fn test_json_lines_appends() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs/transfer.log");

        let sink = JsonLinesAuditSink::open(&path).unwrap();
        sink.record(&sample(Outcome::Success).with_plaintext(3, "abc"));
        sink.record(&sample(Outcome::StorageFailure));
        drop(sink);

        // Reopening appends instead of truncating
        let sink = JsonLinesAuditSink::open(&path).unwrap();
        sink.record(&sample(Outcome::Success));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<TransferRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].digest.as_deref(), Some("abc"));
        assert_eq!(lines[1].outcome, Outcome::StorageFailure);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_json_lines_record_from_async_context() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("transfer.log");
        let sink = Arc::new(JsonLinesAuditSink::open(&path).unwrap());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                tokio::spawn(async move { sink.record(&sample(Outcome::Success)) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        sink.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 8);
        for line in content.lines() {
            let record: TransferRecord = serde_json::from_str(line).unwrap();
            assert_eq!(record.outcome, Outcome::Success);
        }
    }
}
