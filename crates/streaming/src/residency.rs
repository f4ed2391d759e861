/// Lifecycle of a grid load request.
///
/// Requested → Resident, or Requested → Failed. A request that was still in
/// flight when a newer one was issued ends as `Superseded` whatever its
/// outcome, and its data is never committed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadState {
    Requested,
    Resident,
    Failed,
    Superseded,
}

impl LoadState {
    pub fn is_finished(self) -> bool {
        !matches!(self, LoadState::Requested)
    }
}
