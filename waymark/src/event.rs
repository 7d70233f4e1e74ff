//! Provider event marshalling.
//!
//! Location and heading providers run on their own threads. They never touch
//! overlay state directly; instead each subscription hands the provider an
//! [`EventSink`] that pushes events onto an unbounded channel owned by the
//! overlay. The overlay drains the channel on its owner thread.
//!
//! # Architecture
//!
//! ```text
//! provider thread ──EventSink──┐
//!                              ├──► mpsc::unbounded ──► EventBus::try_next ──► OverlayView
//! provider thread ──EventSink──┘         (tagged with kind + generation)
//! ```
//!
//! Every subscription gets a fresh generation number and a child
//! [`CancellationToken`]. Releasing a subscription cancels the token, so the
//! provider's sink starts refusing events, and any envelopes already queued
//! under the old generation are discarded when drained.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::bearing::BearingReading;
use crate::error::ProviderKind;
use crate::location::LocationFix;

/// An event delivered by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    /// A new position sample.
    Fix(LocationFix),
    /// A new heading sample.
    Bearing(BearingReading),
    /// The provider lost its data source (permission revoked, sensor gone).
    Unavailable { kind: ProviderKind, reason: String },
}

/// Channel payload: the event plus the subscription that produced it.
#[derive(Debug)]
struct Envelope {
    kind: ProviderKind,
    generation: u64,
    event: OverlayEvent,
}

/// Sending half handed to a provider on subscribe.
///
/// Cheap to clone and safe to move to any thread. All send methods return
/// `false` once the subscription has been released or the overlay is gone.
#[derive(Debug, Clone)]
pub struct EventSink {
    kind: ProviderKind,
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
    token: CancellationToken,
}

impl EventSink {
    /// Deliver a location fix.
    pub fn send_fix(&self, fix: LocationFix) -> bool {
        self.send(OverlayEvent::Fix(fix))
    }

    /// Deliver a heading reading.
    pub fn send_bearing(&self, reading: BearingReading) -> bool {
        self.send(OverlayEvent::Bearing(reading))
    }

    /// Report that the provider can no longer deliver data.
    pub fn report_unavailable(&self, reason: impl Into<String>) -> bool {
        self.send(OverlayEvent::Unavailable {
            kind: self.kind,
            reason: reason.into(),
        })
    }

    /// Whether the subscription behind this sink has ended.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    /// Wait until the subscription behind this sink is released.
    pub async fn closed(&self) {
        self.token.cancelled().await
    }

    /// Which provider this sink belongs to.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Generation of the subscription this sink belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn send(&self, event: OverlayEvent) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.tx
            .send(Envelope {
                kind: self.kind,
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Guard for an open provider subscription.
///
/// Dropping the guard cancels the subscription.
#[derive(Debug)]
pub struct Subscription {
    kind: ProviderKind,
    generation: u64,
    token: CancellationToken,
}

impl Subscription {
    /// Which provider this subscription belongs to.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Generation number of this subscription.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the subscription is still live.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Owner side of the provider channel.
///
/// Holds at most one live subscription per [`ProviderKind`].
#[derive(Debug)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    root: CancellationToken,
    next_generation: u64,
    subscriptions: HashMap<ProviderKind, (Subscription, EventSink)>,
    stale_dropped: u64,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            root: CancellationToken::new(),
            next_generation: 1,
            subscriptions: HashMap::new(),
            stale_dropped: 0,
        }
    }

    /// Open a new subscription for `kind`, replacing any previous one.
    ///
    /// Returns the sink to hand to the provider.
    pub fn open(&mut self, kind: ProviderKind) -> EventSink {
        self.release(kind);

        let generation = self.next_generation;
        self.next_generation += 1;

        let token = self.root.child_token();
        let sink = EventSink {
            kind,
            generation,
            tx: self.tx.clone(),
            token: token.clone(),
        };
        let subscription = Subscription {
            kind,
            generation,
            token,
        };

        debug!(kind = %kind, generation, "Subscription opened");
        self.subscriptions
            .insert(kind, (subscription, sink.clone()));
        sink
    }

    /// Release the subscription for `kind`. Returns whether one was open.
    pub fn release(&mut self, kind: ProviderKind) -> bool {
        match self.subscriptions.remove(&kind) {
            Some((subscription, _)) => {
                debug!(
                    kind = %kind,
                    generation = subscription.generation(),
                    "Subscription released"
                );
                true
            }
            None => false,
        }
    }

    /// Whether a subscription for `kind` is open.
    pub fn is_subscribed(&self, kind: ProviderKind) -> bool {
        self.subscriptions.contains_key(&kind)
    }

    /// Sink of the open subscription for `kind`, if any.
    pub fn sink(&self, kind: ProviderKind) -> Option<EventSink> {
        self.subscriptions.get(&kind).map(|(_, sink)| sink.clone())
    }

    /// Generation of the open subscription for `kind`, if any.
    pub fn generation(&self, kind: ProviderKind) -> Option<u64> {
        self.subscriptions
            .get(&kind)
            .map(|(subscription, _)| subscription.generation())
    }

    /// Take the next current event without blocking.
    ///
    /// Events from released subscriptions are skipped.
    pub fn try_next(&mut self) -> Option<OverlayEvent> {
        while let Ok(envelope) = self.rx.try_recv() {
            if let Some(event) = self.accept(envelope) {
                return Some(event);
            }
        }
        None
    }

    /// Wait for the next current event.
    ///
    /// The bus keeps a sender of its own, so this only resolves with `None`
    /// after [`close`](Self::close).
    pub async fn next(&mut self) -> Option<OverlayEvent> {
        loop {
            let envelope = self.rx.recv().await?;
            if let Some(event) = self.accept(envelope) {
                return Some(event);
            }
        }
    }

    /// Release every subscription and refuse further events.
    pub fn close(&mut self) {
        self.subscriptions.clear();
        self.root.cancel();
        self.rx.close();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Number of queued events discarded because their subscription was gone.
    pub fn stale_dropped(&self) -> u64 {
        self.stale_dropped
    }

    fn accept(&mut self, envelope: Envelope) -> Option<OverlayEvent> {
        if self.generation(envelope.kind) == Some(envelope.generation) {
            Some(envelope.event)
        } else {
            self.stale_dropped += 1;
            debug!(
                kind = %envelope.kind,
                generation = envelope.generation,
                "Dropped event from released subscription"
            );
            None
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
