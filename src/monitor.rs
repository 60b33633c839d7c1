//! Monitor session
//!
//! Owns the registry and the render state and drives cycles through the
//! scheduler. Use `tick` to pull one cycle's operations at a time, or `run`
//! to push every cycle's operations into a `ViewSink` until stopped.

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};

use crate::config::MonitorOptions;
use crate::conntable::ConnectionTable;
use crate::prober::PortProber;
use crate::reconciler::{reconcile, RenderState, ViewOp};
use crate::registry::{PortSpec, Registry};
use crate::scheduler::{stop_requested, ProbeResult, Scheduler};

/// Consumer of view operations
pub trait ViewSink {
    /// Apply one cycle's operations, in order
    fn apply(&mut self, ops: &[ViewOp]);
}

/// Collects each applied batch separately
impl ViewSink for Vec<Vec<ViewOp>> {
    fn apply(&mut self, ops: &[ViewOp]) {
        self.push(ops.to_vec());
    }
}

/// Registry change, applied at the next cycle boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Add(PortSpec),
    Remove(String),
    Replace(Registry),
}

pub struct Monitor<T: ConnectionTable> {
    registry: Registry,
    render_state: RenderState,
    scheduler: Scheduler<T>,
}

impl<T: ConnectionTable> Monitor<T> {
    pub fn new(registry: Registry, scheduler: Scheduler<T>) -> Self {
        Self {
            registry,
            render_state: RenderState::new(),
            scheduler,
        }
    }

    /// Build a monitor from configured options
    pub fn with_options(registry: Registry, options: &MonitorOptions, table: T) -> Self {
        let prober = PortProber::new(table)
            .with_host(options.host.clone())
            .with_timeout(options.probe_timeout)
            .with_lookup_timeout(options.lookup_timeout);
        let scheduler = Scheduler::new(prober)
            .with_interval(options.interval)
            .with_grace(options.shutdown_grace);
        Self::new(registry, scheduler)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable registry access between cycles
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }

    pub fn apply_control(&mut self, control: Control) {
        match control {
            Control::Add(spec) => {
                let label = spec.to_string();
                match self.registry.add(spec) {
                    Ok(()) => info!("watching {}", label),
                    Err(e) => warn!("ignoring registry addition: {}", e),
                }
            }
            Control::Remove(name) => match self.registry.remove(&name) {
                Some(spec) => info!("no longer watching {}", spec),
                None => warn!("ignoring removal of unknown port name {:?}", name),
            },
            Control::Replace(registry) => {
                info!("registry replaced ({} port(s))", registry.len());
                self.registry = registry;
            }
        }
    }

    /// Probe the current registry once
    pub async fn next_cycle(&self) -> Vec<ProbeResult> {
        self.scheduler.run_cycle(&self.registry).await
    }

    /// Reconcile a finished batch against the render state
    pub fn on_batch_ready(&mut self, batch: &[ProbeResult]) -> Vec<ViewOp> {
        reconcile(batch, &mut self.render_state)
    }

    /// Run one full cycle and return the resulting operations
    pub async fn tick(&mut self) -> Vec<ViewOp> {
        let batch = self.next_cycle().await;
        self.on_batch_ready(&batch)
    }

    /// Drive cycles until `stop` is raised
    ///
    /// Registry changes received on `control` are applied between cycles.
    /// A cycle interrupted by `stop` is either finished within the grace
    /// period and emitted whole, or dropped without emitting anything.
    pub async fn run<S: ViewSink>(
        &mut self,
        sink: &mut S,
        control: &mut mpsc::UnboundedReceiver<Control>,
        mut stop: watch::Receiver<bool>,
    ) {
        let mut ticker = self.scheduler.ticker();
        info!(
            "monitoring {} port(s) every {:?}",
            self.registry.len(),
            self.scheduler.interval()
        );

        loop {
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break,
                _ = ticker.tick() => {}
            }

            while let Ok(change) = control.try_recv() {
                self.apply_control(change);
            }

            let Some(batch) = self
                .scheduler
                .run_cycle_until(&self.registry, &mut stop)
                .await
            else {
                break;
            };

            let ops = reconcile(&batch, &mut self.render_state);
            debug!("cycle produced {} view op(s)", ops.len());
            if !ops.is_empty() {
                sink.apply(&ops);
            }

            if *stop.borrow() {
                break;
            }
        }

        info!("monitor stopped");
    }
}
