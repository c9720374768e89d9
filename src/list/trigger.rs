use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerState {
    #[default]
    Idle,
    Requesting,
    /// Terminal: the source ran out of pages.
    Disconnected,
}

/// Watches the sentinel and decides when to ask for the next page.
///
/// Observation is edge-triggered: it fires when the sentinel goes from
/// outside the viewport to inside it, the way an intersection observer does.
#[derive(Debug, Default)]
pub struct VisibilityTrigger {
    state: TriggerState,
    intersecting: bool,
}

impl VisibilityTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> TriggerState {
        self.state
    }

    pub const fn is_disconnected(&self) -> bool {
        matches!(self.state, TriggerState::Disconnected)
    }

    /// Feed the latest intersection check. Returns true when a page should be requested.
    pub fn observe(&mut self, intersecting: bool) -> bool {
        let entered = intersecting && !self.intersecting;
        self.intersecting = intersecting;
        entered && self.begin()
    }

    /// Request regardless of the last observation (explicit retry).
    pub fn activate(&mut self) -> bool {
        self.begin()
    }

    /// A nonempty page arrived. The sentinel moves, so the next observation
    /// counts as a fresh entry.
    pub fn loaded(&mut self) {
        if self.state == TriggerState::Requesting {
            self.state = TriggerState::Idle;
            self.intersecting = false;
        }
    }

    pub fn failed(&mut self) {
        if self.state == TriggerState::Requesting {
            self.state = TriggerState::Idle;
        }
    }

    /// The loader declined the request without fetching.
    pub fn stand_down(&mut self) {
        self.failed();
    }

    pub fn disconnect(&mut self) {
        if self.state != TriggerState::Disconnected {
            debug!("sentinel disconnected");
        }
        self.state = TriggerState::Disconnected;
    }

    fn begin(&mut self) -> bool {
        if self.state == TriggerState::Idle {
            self.state = TriggerState::Requesting;
            true
        } else {
            false
        }
    }
}
