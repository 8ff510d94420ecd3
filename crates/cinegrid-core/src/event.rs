use crate::detail::DetailOutcome;
use crate::listing::ListingOutcome;

/// Results of background work, delivered to the UI loop over an
/// `mpsc::UnboundedSender<CoreEvent>`.
#[derive(Debug)]
pub enum CoreEvent {
    Listing(ListingOutcome),
    Detail(DetailOutcome),
}

pub type EventSender = tokio::sync::mpsc::UnboundedSender<CoreEvent>;
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<CoreEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
