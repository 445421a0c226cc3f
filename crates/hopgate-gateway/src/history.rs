//! Set of destinations reached so far, with an optional append-only log.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use hopgate_proto::Destination;
use parking_lot::Mutex;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Shared across every session of one gateway.
///
/// The in-memory set is checked and updated under a short synchronous lock;
/// the log append happens afterwards, off that lock.
#[derive(Debug, Default)]
pub struct ConnectionHistory {
    seen: Mutex<HashSet<String>>,
    log: Option<tokio::sync::Mutex<File>>,
}

impl ConnectionHistory {
    /// History kept in memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that also appends each new destination to `path`.
    pub async fn with_log_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            seen: Mutex::new(HashSet::new()),
            log: Some(tokio::sync::Mutex::new(file)),
        })
    }

    /// Record `dest` by its `host:port` identity.
    ///
    /// Returns `true` the first time a destination is seen. A failed log write
    /// is reported and otherwise ignored.
    pub async fn record(&self, dest: &Destination) -> bool {
        let id = dest.to_string();
        if !self.seen.lock().insert(id.clone()) {
            return false;
        }

        if let Some(log) = &self.log {
            let mut file = log.lock().await;
            let line = format!("{id}\n");
            if let Err(e) = append(&mut file, line.as_bytes()).await {
                warn!(destination = %id, error = %e, "failed to append to history log");
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, dest: &Destination) -> bool {
        self.seen.lock().contains(&dest.to_string())
    }
}

async fn append(file: &mut File, line: &[u8]) -> io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn records_each_destination_once() {
        let history = ConnectionHistory::new();
        let dest = Destination::hostname("example.com", 443);

        assert!(history.record(&dest).await);
        assert!(!history.record(&dest).await);
        assert!(history.record(&Destination::hostname("example.com", 80)).await);
        assert_eq!(history.len(), 2);
        assert!(history.contains(&dest));
    }

    #[tokio::test]
    async fn appends_new_entries_to_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.log");
        std::fs::write(&path, "old.example:1\n").unwrap();

        let history = ConnectionHistory::with_log_file(&path).await.unwrap();
        history.record(&Destination::hostname("example.com", 443)).await;
        history.record(&Destination::ip("10.0.0.1".parse().unwrap(), 22)).await;
        history.record(&Destination::hostname("example.com", 443)).await;
        history.record(&Destination::ip("::1".parse().unwrap(), 8080)).await;

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            log,
            "old.example:1\nexample.com:443\n10.0.0.1:22\n[::1]:8080\n"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sessions_log_each_destination_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.log");
        let history = Arc::new(ConnectionHistory::with_log_file(&path).await.unwrap());

        let mut tasks = Vec::new();
        for i in 0..32u16 {
            let history = history.clone();
            tasks.push(tokio::spawn(async move {
                history
                    .record(&Destination::hostname("shared.example", 443))
                    .await;
                history
                    .record(&Destination::hostname("example.com", 1000 + i))
                    .await
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        let log = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 33);
        lines.sort_unstable();
        lines.dedup();
        assert_eq!(lines.len(), 33);
        assert!(lines.contains(&"shared.example:443"));
    }
}
