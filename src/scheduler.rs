//! Polling scheduler
//!
//! One cycle spawns a probe task per registry entry and gathers every
//! result before returning. Cycles are driven sequentially by the monitor
//! loop, so two cycles never overlap.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Interval, MissedTickBehavior};

use crate::conntable::ConnectionTable;
use crate::prober::PortProber;
use crate::registry::{PortSpec, Registry};
use crate::status::PortStatus;

/// Default time between cycle starts
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// Default time an in-flight cycle gets to finish after a stop request
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Status of one registry entry in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub spec: PortSpec,
    pub status: PortStatus,
}

impl ProbeResult {
    pub fn new(spec: PortSpec, status: PortStatus) -> Self {
        Self { spec, status }
    }
}

/// Probe tasks of one cycle; aborts whatever is still running when dropped
struct InFlight {
    specs: Vec<PortSpec>,
    handles: Vec<JoinHandle<PortStatus>>,
}

impl InFlight {
    /// Await every probe in registry order
    async fn gather(&mut self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.specs.len());
        for (spec, handle) in self.specs.iter().zip(self.handles.iter_mut()) {
            let status = match handle.await {
                Ok(status) => status,
                Err(e) => {
                    warn!("probe task for {} failed: {}", spec, e);
                    PortStatus::Error
                }
            };
            results.push(ProbeResult::new(spec.clone(), status));
        }
        results
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Runs probe cycles over a registry
pub struct Scheduler<T: ConnectionTable> {
    prober: Arc<PortProber<T>>,
    interval: Duration,
    grace: Duration,
}

impl<T: ConnectionTable> Scheduler<T> {
    pub fn new(prober: PortProber<T>) -> Self {
        Self {
            prober: Arc::new(prober),
            interval: DEFAULT_INTERVAL,
            grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn prober(&self) -> &PortProber<T> {
        &self.prober
    }

    /// Tick source for the driver loop
    ///
    /// A cycle that overruns the period delays the next tick instead of
    /// causing a burst of catch-up cycles.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn spawn(&self, registry: &Registry) -> InFlight {
        let specs: Vec<PortSpec> = registry.iter().cloned().collect();
        let handles = specs
            .iter()
            .map(|spec| {
                let prober = Arc::clone(&self.prober);
                let port = spec.port;
                tokio::spawn(async move { prober.probe(port).await })
            })
            .collect();
        InFlight { specs, handles }
    }

    /// Probe every registry entry concurrently and return results in
    /// registry order
    pub async fn run_cycle(&self, registry: &Registry) -> Vec<ProbeResult> {
        let mut in_flight = self.spawn(registry);
        let results = in_flight.gather().await;
        debug!("cycle probed {} port(s)", results.len());
        results
    }

    /// Like `run_cycle`, but gives up once `stop` is raised and the gather
    /// has not finished within the grace period
    ///
    /// Returns `None` when the cycle was abandoned. Abandoned probe tasks
    /// are aborted.
    pub async fn run_cycle_until(
        &self,
        registry: &Registry,
        stop: &mut watch::Receiver<bool>,
    ) -> Option<Vec<ProbeResult>> {
        let mut in_flight = self.spawn(registry);
        let gather = in_flight.gather();
        tokio::pin!(gather);

        tokio::select! {
            results = &mut gather => return Some(results),
            _ = stop_requested(stop) => {}
        }

        debug!("stop requested mid-cycle, waiting up to {:?}", self.grace);
        match timeout(self.grace, &mut gather).await {
            Ok(results) => Some(results),
            Err(_) => {
                debug!("abandoning in-flight cycle");
                None
            }
        }
    }
}

/// Resolves once `stop` is raised or its sender is gone
pub async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}
