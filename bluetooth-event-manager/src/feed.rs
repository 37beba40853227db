//! Feed identifiers, delivered events and the handler contract

use pps_client::PpsMessage;

/// A PPS object the manager reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// `paired_devices/.all`: one object per paired device
    PairedDevices,
    /// `status`: Bluetooth manager lifecycle notifications
    Status,
}

/// Which read of a feed produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delivery {
    /// The initial read returning the object's current state
    FirstRead,
    /// Any later read returning changes
    NewData,
}

/// One decoded object delivered from a feed
#[derive(Debug, Clone)]
pub struct FeedEvent {
    pub feed: Feed,
    pub delivery: Delivery,
    pub message: PpsMessage,
}

/// Receives events for the feeds it is registered on
///
/// Handlers run on the manager's single dispatcher thread, one event at a
/// time and in the order each feed produced them. A handler is never
/// invoked concurrently with itself or with any other handler of the same
/// manager, so handler state needs no locking of its own. Handlers must not
/// block for long: every feed waits behind them.
///
/// Closures taking `&FeedEvent` implement this trait.
pub trait FeedHandler: Send + 'static {
    fn handle(&mut self, event: &FeedEvent);
}

impl<F> FeedHandler for F
where
    F: FnMut(&FeedEvent) + Send + 'static,
{
    fn handle(&mut self, event: &FeedEvent) {
        self(event)
    }
}
