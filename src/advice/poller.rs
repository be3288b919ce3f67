//! Periodic snapshot-and-request loop.
//!
//! [`AdvicePoller::start`] spawns a timer task.  Every tick it calls the
//! snapshot provider, skips the tick when the snapshot is empty, and
//! otherwise spawns one request task.  Request results travel back as
//! [`AdviceDelivery`] messages on the channel returned by
//! [`AdvicePoller::new`], so the consumer applies them in arrival order.
//!
//! ```text
//! interval tick ──▶ snapshot() ──empty?──▶ skip
//!                        │
//!                        └─▶ tokio::spawn(client.advise) ──▶ AdviceDelivery (mpsc)
//! ```
//!
//! Requests are not serialized by default: a slow response can land after a
//! newer one.  [`OverlapPolicy::SkipWhileInFlight`] drops ticks instead.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{AdvisorConfig, OverlapPolicy};

use super::client::{AdviceClient, AdviceError, AdviceReply, Snapshot};

/// Result of one advice request, tagged with the listening round that
/// issued it.
#[derive(Debug)]
pub struct AdviceDelivery {
    pub round: u64,
    pub result: Result<AdviceReply, AdviceError>,
}

/// Owns the single poll timer.
pub struct AdvicePoller {
    client: Arc<dyn AdviceClient>,
    period: Duration,
    overlap: OverlapPolicy,
    deliveries: mpsc::UnboundedSender<AdviceDelivery>,
    in_flight: Arc<AtomicUsize>,
    timer: Option<JoinHandle<()>>,
}

impl AdvicePoller {
    /// Create a stopped poller and the receiver its results arrive on.
    pub fn new(
        client: Arc<dyn AdviceClient>,
        config: &AdvisorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<AdviceDelivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            client,
            period: config.poll_interval(),
            overlap: config.overlap,
            deliveries: tx,
            in_flight: Arc::new(AtomicUsize::new(0)),
            timer: None,
        };
        (poller, rx)
    }

    /// Start ticking.  Any previous timer is cancelled first.
    ///
    /// The first tick fires one full period after this call.  `snapshot` is
    /// invoked fresh on every tick.  Must be called from within a tokio
    /// runtime.
    pub fn start<F>(&mut self, round: u64, snapshot: F)
    where
        F: Fn() -> Snapshot + Send + Sync + 'static,
    {
        self.stop();

        let client = Arc::clone(&self.client);
        let deliveries = self.deliveries.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let overlap = self.overlap;
        let period = self.period;

        log::debug!("advice: poller started (round={round}, period={period:?})");

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let snap = snapshot();
                if snap.is_empty() {
                    log::trace!("advice: empty snapshot, tick skipped");
                    continue;
                }

                if overlap == OverlapPolicy::SkipWhileInFlight
                    && in_flight.load(Ordering::SeqCst) > 0
                {
                    log::debug!("advice: request still in flight, tick skipped");
                    continue;
                }

                let pending = InFlight::enter(&in_flight);
                let client = Arc::clone(&client);
                let deliveries = deliveries.clone();

                tokio::spawn(async move {
                    let result = client.advise(&snap).await;
                    drop(pending);
                    if deliveries.send(AdviceDelivery { round, result }).is_err() {
                        log::debug!("advice: receiver gone, delivery dropped");
                    }
                });
            }
        }));
    }

    /// Cancel the timer.  Idempotent.
    ///
    /// Requests already in flight are not cancelled and still deliver.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            log::debug!("advice: poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Number of requests waiting for the backend.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Counts one pending request; the count drops with the guard, so a
/// request task that panics or is aborted still releases its slot.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Drop for AdvicePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
