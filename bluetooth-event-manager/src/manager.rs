//! Event manager: opens the PPS objects and runs feed delivery
//!
//! Objects are opened in the order they were configured on the builder.
//! Nothing is spawned until every object has opened, so a failed open
//! leaves no threads behind.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

use parking_lot::Mutex;
use pps_client::{Attributes, FileMode, PpsError, PpsHandle, PpsMode, PpsTransport};

use crate::error::{EventManagerError, Result};
use crate::feed::{Delivery, Feed, FeedHandler};
use crate::worker::{spawn_dispatcher, spawn_feed_reader, Dispatch, HandlerMap};

enum ObjectSpec {
    Feed {
        feed: Feed,
        path: String,
        mode: PpsMode,
    },
    Control {
        path: String,
        mode: PpsMode,
    },
}

/// Write-only handle to the Bluetooth manager's control object
///
/// Cloning shares the underlying handle; writes are serialized.
#[derive(Clone)]
pub struct ControlSink {
    path: String,
    handle: Arc<Mutex<Box<dyn PpsHandle>>>,
}

impl ControlSink {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Publish a command object
    ///
    /// Returns once the transport accepted the write; no response from the
    /// Bluetooth manager is awaited.
    pub fn write(&self, attributes: &Attributes) -> std::result::Result<(), PpsError> {
        self.handle.lock().write(attributes)
    }
}

impl std::fmt::Debug for ControlSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSink").field("path", &self.path).finish()
    }
}

/// Configures which objects to open and which handlers receive their events
///
/// # Example
///
/// ```rust,ignore
/// let manager = EventManager::builder(transport)
///     .feed(Feed::PairedDevices, "/pps/services/bluetooth/paired_devices/.all", PpsMode::Delta)
///     .control("/pps/services/bluetooth/control", PpsMode::Delta)
///     .feed(Feed::Status, "/pps/services/bluetooth/status", PpsMode::Delta)
///     .on_first_read(Feed::PairedDevices, |event: &FeedEvent| println!("{:?}", event))
///     .on_new_data(Feed::Status, |event: &FeedEvent| println!("{:?}", event))
///     .start()?;
/// ```
pub struct EventManagerBuilder {
    transport: Arc<dyn PpsTransport>,
    objects: Vec<ObjectSpec>,
    handlers: HandlerMap,
}

impl EventManagerBuilder {
    /// Read `path` as `feed`
    pub fn feed(mut self, feed: Feed, path: impl Into<String>, mode: PpsMode) -> Self {
        self.objects.push(ObjectSpec::Feed {
            feed,
            path: path.into(),
            mode,
        });
        self
    }

    /// Open `path` write-only as the control sink
    pub fn control(mut self, path: impl Into<String>, mode: PpsMode) -> Self {
        self.objects.push(ObjectSpec::Control {
            path: path.into(),
            mode,
        });
        self
    }

    /// Register a handler for the first read of `feed`
    pub fn on_first_read(self, feed: Feed, handler: impl FeedHandler) -> Self {
        self.subscribe(feed, Delivery::FirstRead, handler)
    }

    /// Register a handler for every read of `feed` after the first
    pub fn on_new_data(self, feed: Feed, handler: impl FeedHandler) -> Self {
        self.subscribe(feed, Delivery::NewData, handler)
    }

    /// Register a handler for one kind of delivery on `feed`
    pub fn subscribe(mut self, feed: Feed, delivery: Delivery, handler: impl FeedHandler) -> Self {
        self.handlers
            .entry((feed, delivery))
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// Open every configured object and start delivering events
    pub fn start(self) -> Result<EventManager> {
        let mut seen = HashSet::new();
        for spec in &self.objects {
            if let ObjectSpec::Feed { feed, .. } = spec {
                if !seen.insert(*feed) {
                    return Err(EventManagerError::DuplicateFeed(*feed));
                }
            }
        }

        let mut readers = Vec::new();
        let mut control = None;
        for spec in &self.objects {
            match spec {
                ObjectSpec::Feed { feed, path, mode } => {
                    let handle = self.transport.open(path, *mode, FileMode::ReadOnly)?;
                    tracing::debug!("Opened {:?} feed at {}", feed, path);
                    readers.push((*feed, handle));
                }
                ObjectSpec::Control { path, mode } => {
                    let handle = self.transport.open(path, *mode, FileMode::WriteOnly)?;
                    tracing::debug!("Opened control object at {}", path);
                    control = Some(ControlSink {
                        path: path.clone(),
                        handle: Arc::new(Mutex::new(handle)),
                    });
                }
            }
        }

        let (dispatch_tx, dispatch_rx) = mpsc::channel();
        let delivered = Arc::new(AtomicU64::new(0));
        let dispatcher = spawn_dispatcher(self.handlers, dispatch_rx, Arc::clone(&delivered))?;

        let mut manager = EventManager {
            dispatch_tx,
            control,
            delivered,
            stop: Arc::new(AtomicBool::new(false)),
            dispatcher: Some(dispatcher),
            readers: Vec::with_capacity(readers.len()),
        };

        for (feed, handle) in readers {
            let thread = spawn_feed_reader(
                feed,
                handle,
                manager.dispatch_tx.clone(),
                Arc::clone(&manager.stop),
            )?;
            manager.readers.push(thread);
        }

        tracing::info!("Event manager started with {} feed(s)", manager.readers.len());

        Ok(manager)
    }

    /// Like [`start`](Self::start), but a control object is required and
    /// returned alongside the manager
    pub fn start_with_control(self) -> Result<(EventManager, ControlSink)> {
        let has_control = self
            .objects
            .iter()
            .any(|spec| matches!(spec, ObjectSpec::Control { .. }));
        if !has_control {
            return Err(EventManagerError::ControlNotConfigured);
        }

        let manager = self.start()?;
        let control = manager
            .control
            .clone()
            .ok_or(EventManagerError::ControlNotConfigured)?;
        Ok((manager, control))
    }
}

/// Running feed subscriptions
///
/// Shutting down (or dropping) the manager stops the dispatcher and waits
/// for every reader thread to exit. Readers notice within one
/// [`POLL_INTERVAL`](pps_client::POLL_INTERVAL) and close their PPS handle.
pub struct EventManager {
    dispatch_tx: mpsc::Sender<Dispatch>,
    control: Option<ControlSink>,
    delivered: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
    dispatcher: Option<JoinHandle<()>>,
    readers: Vec<JoinHandle<()>>,
}

impl EventManager {
    pub fn builder(transport: Arc<dyn PpsTransport>) -> EventManagerBuilder {
        EventManagerBuilder {
            transport,
            objects: Vec::new(),
            handlers: HandlerMap::new(),
        }
    }

    /// The control sink, if one was configured
    pub fn control(&self) -> Option<&ControlSink> {
        self.control.as_ref()
    }

    /// Number of feed events the dispatcher has finished handling
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Stop dispatching and wait for every background thread to exit
    ///
    /// The dispatcher finishes its current event first. Calling this again
    /// is a no-op.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.dispatch_tx.send(Dispatch::Shutdown);

        if let Some(dispatcher) = self.dispatcher.take() {
            if dispatcher.join().is_err() {
                tracing::warn!("Event dispatcher panicked");
            }
        }
        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                tracing::warn!("Feed reader panicked");
            }
        }
    }
}

impl Drop for EventManager {
    fn drop(&mut self) {
        tracing::debug!(
            "EventManager dropping after {} delivered event(s)",
            self.delivered_count()
        );
        self.shutdown();
    }
}
