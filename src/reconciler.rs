//! View reconciliation
//!
//! Diffs a cycle's batch against what the view currently shows and emits
//! the smallest ordered set of operations that brings the view in sync.

use std::collections::{BTreeMap, HashSet};

use crate::scheduler::ProbeResult;
use crate::status::PortStatus;

/// What the view shows for one port card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardState {
    pub port: u16,
    pub status: PortStatus,
    pub has_close_control: bool,
}

impl CardState {
    fn from_status(port: u16, status: PortStatus) -> Self {
        Self {
            port,
            status,
            has_close_control: status.eligible_for_close(),
        }
    }
}

/// Last-applied view snapshot, keyed by port name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    cards: BTreeMap<String, CardState>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&CardState> {
        self.cards.get(name)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CardState)> {
        self.cards.iter().map(|(name, card)| (name.as_str(), card))
    }
}

/// A single change for the renderer to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    /// Build a new card; `position` is the entry's index in the batch
    Create {
        name: String,
        port: u16,
        status: PortStatus,
        has_close_control: bool,
        position: usize,
    },
    /// Refresh status text, color and close control of an existing card
    Update {
        name: String,
        port: u16,
        status: PortStatus,
        has_close_control: bool,
    },
    /// Destroy a card
    Remove { name: String },
}

impl ViewOp {
    pub fn name(&self) -> &str {
        match self {
            ViewOp::Create { name, .. } | ViewOp::Update { name, .. } | ViewOp::Remove { name } => {
                name
            }
        }
    }
}

/// Bring `state` in line with `batch`, returning the operations applied
///
/// Removals come first (in name order), then creates and updates in batch
/// order. Names in `batch` must be unique.
pub fn reconcile(batch: &[ProbeResult], state: &mut RenderState) -> Vec<ViewOp> {
    let current: HashSet<&str> = batch.iter().map(|r| r.spec.name.as_str()).collect();
    debug_assert_eq!(
        current.len(),
        batch.len(),
        "duplicate port names in probe batch"
    );

    let mut ops = Vec::new();

    let stale: Vec<String> = state
        .cards
        .keys()
        .filter(|name| !current.contains(name.as_str()))
        .cloned()
        .collect();
    for name in stale {
        state.cards.remove(&name);
        ops.push(ViewOp::Remove { name });
    }

    for (position, result) in batch.iter().enumerate() {
        let name = &result.spec.name;
        let next = CardState::from_status(result.spec.port, result.status);

        match state.cards.get_mut(name) {
            None => {
                state.cards.insert(name.clone(), next);
                ops.push(ViewOp::Create {
                    name: name.clone(),
                    port: next.port,
                    status: next.status,
                    has_close_control: next.has_close_control,
                    position,
                });
            }
            Some(card) if *card == next => {}
            Some(card) => {
                *card = next;
                ops.push(ViewOp::Update {
                    name: name.clone(),
                    port: next.port,
                    status: next.status,
                    has_close_control: next.has_close_control,
                });
            }
        }
    }

    ops
}
