//! Stale-render guard.
//!
//! Every render takes a ticket before it starts. Only the holder of the most
//! recent ticket may publish its view, so a slow render that finishes after a
//! newer one started is dropped.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::view::model::ViewModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket(u64);

impl RenderTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RenderGate {
    generation: AtomicU64,
    latest: Mutex<Option<ViewModel>>,
}

impl RenderGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render; any ticket issued earlier becomes stale.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Publish `view` if `ticket` is still the latest. Returns whether it was accepted.
    pub fn commit(&self, ticket: RenderTicket, view: ViewModel) -> bool {
        let mut latest = match self.latest.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Checked under the lock so a concurrent commit cannot interleave.
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "discarding stale render");
            return false;
        }
        *latest = Some(view);
        true
    }

    /// The last accepted view.
    pub fn latest(&self) -> Option<ViewModel> {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartConfig, DatasetId};
    use crate::view::model::{Axis, ScaleKind};

    fn view(version: u64) -> ViewModel {
        let axis = Axis {
            scale: ScaleKind::Linear,
            label: String::new(),
        };
        ViewModel {
            version,
            plot: ChartConfig::default().active(),
            dataset: DatasetId::DEFAULT,
            x_axis: axis.clone(),
            y_axis: axis,
            curves: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn newest_ticket_wins() {
        let gate = RenderGate::new();
        let slow = gate.begin();
        let fast = gate.begin();
        assert!(gate.commit(fast, view(2)));
        assert!(!gate.commit(slow, view(1)));
        assert_eq!(gate.latest().map(|v| v.version), Some(2));
    }

    #[test]
    fn concurrent_renders_publish_only_the_newest() {
        let gate = RenderGate::new();
        let tickets: Vec<RenderTicket> = (0..8).map(|_| gate.begin()).collect();
        let accepted: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = tickets
                .iter()
                .rev()
                .map(|&t| {
                    let gate = &gate;
                    s.spawn(move || gate.commit(t, view(t.generation())))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(accepted.iter().filter(|&&ok| ok).count(), 1);
        assert_eq!(gate.latest().map(|v| v.version), Some(8));
    }

    #[test]
    fn nothing_published_before_first_commit() {
        let gate = RenderGate::new();
        let ticket = gate.begin();
        assert!(gate.is_current(ticket));
        assert!(gate.latest().is_none());
        assert_eq!(ticket.generation(), 1);
    }
}
