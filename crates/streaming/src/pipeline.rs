use std::collections::BTreeMap;

use tracing::debug;

use crate::request::Request;
use crate::residency::LoadState;

/// Handle for one asynchronous grid load.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadTicket {
    pub request: Request,
    pub resolution: f64,
}

/// Tracks in-flight grid loads and detects stale completions.
///
/// Loads cannot be cancelled. Instead, only the most recently issued request
/// is allowed to commit: completing any older ticket reports `Superseded`
/// and the caller drops the data untouched.
#[derive(Debug, Default)]
pub struct LoadPipeline {
    next_request: u64,
    current: Option<LoadTicket>,
    pending: BTreeMap<Request, LoadTicket>,
}

impl LoadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new request for `resolution`; every earlier pending request
    /// becomes stale.
    pub fn begin(&mut self, resolution: f64) -> LoadTicket {
        self.next_request += 1;
        let ticket = LoadTicket {
            request: Request(self.next_request),
            resolution,
        };
        self.pending.insert(ticket.request, ticket);
        self.current = Some(ticket);
        ticket
    }

    pub fn current(&self) -> Option<LoadTicket> {
        self.current
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current.is_some_and(|c| c.request == ticket.request)
    }

    /// True while the most recent request has not finished.
    pub fn is_loading(&self) -> bool {
        self.current
            .is_some_and(|c| self.pending.contains_key(&c.request))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn state(&self, ticket: LoadTicket) -> Option<LoadState> {
        self.pending.get(&ticket.request)?;
        Some(if self.is_current(ticket) {
            LoadState::Requested
        } else {
            LoadState::Superseded
        })
    }

    /// Marks `ticket` finished. Returns `Resident` when its data may be
    /// committed, `Superseded` otherwise.
    pub fn complete(&mut self, ticket: LoadTicket) -> LoadState {
        self.finish(ticket, LoadState::Resident)
    }

    /// Marks `ticket` failed. Returns `Failed`, or `Superseded` for a stale ticket.
    pub fn fail(&mut self, ticket: LoadTicket) -> LoadState {
        self.finish(ticket, LoadState::Failed)
    }

    fn finish(&mut self, ticket: LoadTicket, outcome: LoadState) -> LoadState {
        let was_pending = self.pending.remove(&ticket.request).is_some();
        if was_pending && self.is_current(ticket) {
            return outcome;
        }
        debug!(
            request = ticket.request.0,
            resolution = ticket.resolution,
            "discarding stale load completion"
        );
        LoadState::Superseded
    }
}

#[cfg(test)]
mod tests {
    use super::LoadPipeline;
    use crate::residency::LoadState;

    #[test]
    fn newer_request_supersedes_older_regardless_of_order() {
        let mut p = LoadPipeline::new();
        let first = p.begin(1000.0);
        let second = p.begin(1000.0);
        assert_eq!(p.state(first), Some(LoadState::Superseded));
        assert_eq!(p.state(second), Some(LoadState::Requested));

        assert_eq!(p.complete(second), LoadState::Resident);
        assert_eq!(p.complete(first), LoadState::Superseded);
        assert!(!p.is_loading());
        assert_eq!(p.pending_len(), 0);
    }

    #[test]
    fn stale_first_completion_does_not_end_loading() {
        let mut p = LoadPipeline::new();
        let first = p.begin(1000.0);
        let second = p.begin(5000.0);
        assert_eq!(p.complete(first), LoadState::Superseded);
        assert!(p.is_loading());
        assert_eq!(p.complete(second), LoadState::Resident);
        assert!(!p.is_loading());
    }

    #[test]
    fn failure_and_double_completion() {
        let mut p = LoadPipeline::new();
        let t = p.begin(1000.0);
        assert_eq!(p.fail(t), LoadState::Failed);
        assert_eq!(p.complete(t), LoadState::Superseded);
        assert!(p.state(t).is_none());
    }
}
