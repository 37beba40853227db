//! In-process PPS transport for tests
//!
//! Publishers push messages with [`MemoryTransport::publish`]; every reader
//! opened on the path receives them in order. Readers opened after a
//! publication first replay everything published so far, which mirrors the
//! "current state on first read" behaviour of real PPS objects. A reader
//! opened on a path with nothing published gets an empty first read. Writes are
//! recorded and can be inspected with [`MemoryTransport::writes`].

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{mpsc, Arc, Mutex};

use crate::codec::{Attributes, PpsMessage};
use crate::error::PpsError;
use crate::transport::{FileMode, PpsHandle, PpsMode, PpsTransport, POLL_INTERVAL};

#[derive(Default)]
struct Endpoint {
    history: Vec<Vec<PpsMessage>>,
    readers: Vec<mpsc::Sender<Vec<PpsMessage>>>,
    writes: Vec<Attributes>,
    opened: Vec<(PpsMode, FileMode)>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    endpoints: HashMap<String, Endpoint>,
    failing: HashSet<String>,
}

/// Shared in-memory PPS namespace
#[derive(Clone, Default)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one read's worth of messages to a path
    pub fn publish(&self, path: &str, messages: Vec<PpsMessage>) {
        let mut shared = match self.shared.lock() {
            Ok(s) => s,
            Err(_) => return,
        };
        let endpoint = shared.endpoints.entry(path.to_string()).or_default();
        endpoint
            .readers
            .retain(|reader| reader.send(messages.clone()).is_ok());
        endpoint.history.push(messages);
    }

    /// Close a path: readers see end of stream, later opens fail
    pub fn close(&self, path: &str) {
        if let Ok(mut shared) = self.shared.lock() {
            let endpoint = shared.endpoints.entry(path.to_string()).or_default();
            endpoint.readers.clear();
            endpoint.closed = true;
        }
    }

    /// Make every future open of `path` fail
    pub fn fail_open(&self, path: &str) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.failing.insert(path.to_string());
        }
    }

    /// Attribute sets written to a path, oldest first
    pub fn writes(&self, path: &str) -> Vec<Attributes> {
        self.shared
            .lock()
            .ok()
            .and_then(|s| s.endpoints.get(path).map(|e| e.writes.clone()))
            .unwrap_or_default()
    }

    /// Modes a path was opened with, in open order
    pub fn opened(&self, path: &str) -> Vec<(PpsMode, FileMode)> {
        self.shared
            .lock()
            .ok()
            .and_then(|s| s.endpoints.get(path).map(|e| e.opened.clone()))
            .unwrap_or_default()
    }
}

impl PpsTransport for MemoryTransport {
    fn open(
        &self,
        path: &str,
        mode: PpsMode,
        access: FileMode,
    ) -> Result<Box<dyn PpsHandle>, PpsError> {
        let mut shared = self
            .shared
            .lock()
            .map_err(|_| PpsError::Closed(path.to_string()))?;

        if shared.failing.contains(path) {
            return Err(PpsError::Open {
                path: path.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such PPS object"),
            });
        }

        let endpoint = shared.endpoints.entry(path.to_string()).or_default();
        if endpoint.closed {
            return Err(PpsError::Closed(path.to_string()));
        }
        endpoint.opened.push((mode, access));

        let rx = if access.can_read() {
            let (tx, rx) = mpsc::channel();
            if endpoint.history.is_empty() {
                let _ = tx.send(Vec::new());
            }
            for messages in &endpoint.history {
                let _ = tx.send(messages.clone());
            }
            endpoint.readers.push(tx);
            Some(rx)
        } else {
            None
        };

        Ok(Box::new(MemoryHandle {
            path: path.to_string(),
            access,
            rx,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MemoryHandle {
    path: String,
    access: FileMode,
    rx: Option<mpsc::Receiver<Vec<PpsMessage>>>,
    shared: Arc<Mutex<Shared>>,
}

impl PpsHandle for MemoryHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&mut self) -> Result<Option<Vec<PpsMessage>>, PpsError> {
        let rx = self.rx.as_ref().ok_or_else(|| PpsError::AccessDenied {
            path: self.path.clone(),
            operation: "reading",
        })?;
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(messages) => Ok(Some(messages)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(Some(Vec::new())),
            Err(mpsc::RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn write(&mut self, attributes: &Attributes) -> Result<(), PpsError> {
        if !self.access.can_write() {
            return Err(PpsError::AccessDenied {
                path: self.path.clone(),
                operation: "writing",
            });
        }

        let mut shared = self
            .shared
            .lock()
            .map_err(|_| PpsError::Closed(self.path.clone()))?;
        let endpoint = shared.endpoints.entry(self.path.clone()).or_default();
        if endpoint.closed {
            return Err(PpsError::Closed(self.path.clone()));
        }
        endpoint.writes.push(attributes.clone());
        Ok(())
    }
}
