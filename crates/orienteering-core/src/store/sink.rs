//! Persistence boundary: one shared document per race session.
//!
//! A sink offers two primitives: `subscribe` delivers the latest full
//! document on every change, `write_full` replaces it. Nothing else (partial
//! updates, transactions, queries) is needed by the store.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// One notification from a sink subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkUpdate {
    /// The current document.
    Snapshot(serde_json::Value),
    /// No document stored yet for this session.
    Missing,
    /// The sink lost its connection.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Connecting,
    Connected,
    Saving,
    /// Local-only: the sink could not be reached or rejected a write.
    Offline,
}

pub trait PersistenceSink {
    fn subscribe(&mut self) -> Result<Receiver<SinkUpdate>, SinkError>;

    fn write_full(&mut self, document: &serde_json::Value) -> Result<(), SinkError>;
}

impl<S: PersistenceSink + ?Sized> PersistenceSink for Box<S> {
    fn subscribe(&mut self) -> Result<Receiver<SinkUpdate>, SinkError> {
        (**self).subscribe()
    }

    fn write_full(&mut self, document: &serde_json::Value) -> Result<(), SinkError> {
        (**self).write_full(document)
    }
}

/// Send `update` to every live subscriber, dropping the ones that hung up.
pub(crate) fn broadcast(subscribers: &mut Vec<Sender<SinkUpdate>>, update: &SinkUpdate) {
    subscribers.retain(|tx| tx.send(update.clone()).is_ok());
}

#[derive(Debug, Default)]
struct Shared {
    document: Option<serde_json::Value>,
    subscribers: Vec<Sender<SinkUpdate>>,
    unavailable: bool,
    reject_writes: bool,
    writes: usize,
}

/// In-memory sink. Clones share one document, so two stores built on clones
/// of the same sink behave like two devices on one session.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    shared: Arc<Mutex<Shared>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: serde_json::Value) -> Self {
        let sink = Self::default();
        sink.lock().document = Some(document);
        sink
    }

    pub fn document(&self) -> Option<serde_json::Value> {
        self.lock().document.clone()
    }

    /// Number of accepted writes.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut shared = self.lock();
        if shared.unavailable == unavailable {
            return;
        }
        shared.unavailable = unavailable;
        let update = if unavailable {
            SinkUpdate::Failed("memory sink disconnected".into())
        } else {
            current_update(&shared)
        };
        broadcast(&mut shared.subscribers, &update);
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn current_update(shared: &Shared) -> SinkUpdate {
    match &shared.document {
        Some(doc) => SinkUpdate::Snapshot(doc.clone()),
        None => SinkUpdate::Missing,
    }
}

impl PersistenceSink for MemorySink {
    fn subscribe(&mut self) -> Result<Receiver<SinkUpdate>, SinkError> {
        let mut shared = self.lock();
        if shared.unavailable {
            return Err(SinkError::Unavailable("memory sink disconnected".into()));
        }
        let (tx, rx) = channel();
        // The receiver is still held here, so this send cannot fail.
        let _ = tx.send(current_update(&shared));
        shared.subscribers.push(tx);
        Ok(rx)
    }

    fn write_full(&mut self, document: &serde_json::Value) -> Result<(), SinkError> {
        let mut shared = self.lock();
        if shared.unavailable {
            return Err(SinkError::Unavailable("memory sink disconnected".into()));
        }
        if shared.reject_writes {
            return Err(SinkError::WriteFailed("memory sink rejects writes".into()));
        }
        shared.document = Some(document.clone());
        shared.writes += 1;
        let update = SinkUpdate::Snapshot(document.clone());
        broadcast(&mut shared.subscribers, &update);
        Ok(())
    }
}
