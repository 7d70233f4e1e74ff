//! Location provider adapter.
//!
//! The overlay consumes already-processed position samples. Platform
//! integrations (fused location, GNSS receivers, replayed tracks) implement
//! [`LocationProvider`] and push [`LocationFix`]es through the
//! [`EventSink`](crate::event::EventSink) they receive on subscribe. Permission
//! handling is the host's concern; a provider is only subscribed once the host
//! has granted access.

mod fix;

pub use fix::{now_timestamp_ms, LocationFix};

use crate::error::OverlayResult;
use crate::event::EventSink;

/// A source of location fixes.
///
/// `subscribe` is called when the overlay becomes enabled and `unsubscribe`
/// when it is disabled or detached. Implementations may deliver from any
/// thread; sends after `unsubscribe` are refused by the sink.
pub trait LocationProvider: Send {
    /// Start delivering fixes into `sink`.
    ///
    /// Returns [`OverlayError::ProviderUnavailable`](crate::OverlayError::ProviderUnavailable)
    /// if the platform source cannot be started.
    fn subscribe(&mut self, sink: EventSink) -> OverlayResult<()>;

    /// Stop delivering fixes.
    fn unsubscribe(&mut self);

    /// Short name for log output.
    fn name(&self) -> &str {
        "location"
    }
}
