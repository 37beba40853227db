//! Background threads: one reader per feed and a single dispatcher
//!
//! Readers poll `PpsHandle::read()` and forward decoded messages to the
//! dispatcher over an mpsc channel. The dispatcher owns every handler and
//! calls them sequentially, which is what makes delivery non-reentrant.
//! Readers check the stop flag between reads, so they exit within one
//! poll interval of shutdown and drop their handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use pps_client::PpsHandle;

use crate::error::{EventManagerError, Result};
use crate::feed::{Delivery, Feed, FeedEvent, FeedHandler};

/// Messages consumed by the dispatcher thread
#[derive(Debug)]
pub enum Dispatch {
    /// Deliver an event to the handlers registered for it
    Event(FeedEvent),
    /// A feed reached end of stream or failed
    FeedClosed(Feed),
    /// Stop dispatching
    Shutdown,
}

pub(crate) type HandlerMap = HashMap<(Feed, Delivery), Vec<Box<dyn FeedHandler>>>;

/// Spawn a thread that reads `handle` until it closes or `stop` is set
pub(crate) fn spawn_feed_reader(
    feed: Feed,
    mut handle: Box<dyn PpsHandle>,
    dispatch_tx: mpsc::Sender<Dispatch>,
    stop: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let name = format!("pps-reader-{:?}", feed).to_lowercase();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || read_feed(feed, handle.as_mut(), &dispatch_tx, &stop))
        .map_err(|source| EventManagerError::WorkerSpawn { name, source })
}

fn read_feed(
    feed: Feed,
    handle: &mut dyn PpsHandle,
    dispatch_tx: &mpsc::Sender<Dispatch>,
    stop: &AtomicBool,
) {
    let mut delivery = Delivery::FirstRead;

    while !stop.load(Ordering::SeqCst) {
        match handle.read() {
            Ok(Some(messages)) => {
                for message in messages {
                    let event = FeedEvent {
                        feed,
                        delivery,
                        message,
                    };
                    if dispatch_tx.send(Dispatch::Event(event)).is_err() {
                        tracing::debug!("Dispatcher gone, stopping {:?} reader", feed);
                        return;
                    }
                }
                delivery = Delivery::NewData;
            }
            Ok(None) => {
                tracing::info!("{:?} feed {} closed", feed, handle.path());
                let _ = dispatch_tx.send(Dispatch::FeedClosed(feed));
                return;
            }
            Err(e) => {
                tracing::warn!("Reading {:?} feed failed: {}", feed, e);
                let _ = dispatch_tx.send(Dispatch::FeedClosed(feed));
                return;
            }
        }
    }

    tracing::debug!("{:?} reader stopped", feed);
}

/// Spawn the dispatcher that owns all handlers
pub(crate) fn spawn_dispatcher(
    mut handlers: HandlerMap,
    dispatch_rx: mpsc::Receiver<Dispatch>,
    delivered: Arc<AtomicU64>,
) -> Result<JoinHandle<()>> {
    let name = "pps-dispatcher".to_string();
    thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            tracing::info!("Event dispatcher started");

            while let Ok(dispatch) = dispatch_rx.recv() {
                match dispatch {
                    Dispatch::Event(event) => {
                        if let Some(list) = handlers.get_mut(&(event.feed, event.delivery)) {
                            for handler in list.iter_mut() {
                                handler.handle(&event);
                            }
                        }
                        delivered.fetch_add(1, Ordering::SeqCst);
                    }
                    Dispatch::FeedClosed(feed) => {
                        tracing::debug!("No further events from {:?} feed", feed);
                    }
                    Dispatch::Shutdown => {
                        tracing::info!("Dispatcher received shutdown command");
                        break;
                    }
                }
            }

            tracing::info!("Event dispatcher shut down");
        })
        .map_err(|source| EventManagerError::WorkerSpawn { name, source })
}
