use tokio::sync::watch;
use tracing::info;

/// Shutdown state machine
///
/// States:
/// 1. Running - normal operation
/// 2. Draining - stop accepting new requests, finish in-flight ones
/// 3. Terminated - everything stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Draining,
    Terminated,
}

/// Broadcasts shutdown progress to every task that subscribed.
#[derive(Debug)]
pub struct Shutdown {
    state: watch::Sender<ShutdownState>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self { state }
    }

    /// Get current state
    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    /// Start draining (called on SIGTERM/SIGINT)
    pub fn start_drain(&self) {
        if self.state() != ShutdownState::Running {
            return;
        }

        info!("starting graceful shutdown drain");
        self.state.send_replace(ShutdownState::Draining);
    }

    /// Complete shutdown
    pub fn terminate(&self) {
        if self.state() == ShutdownState::Terminated {
            return;
        }

        info!("shutdown complete");
        self.state.send_replace(ShutdownState::Terminated);
    }

    /// Check if accepting new requests
    pub fn is_accepting(&self) -> bool {
        self.state() == ShutdownState::Running
    }

    /// Resolve once the state has left `Running`.
    pub async fn draining(&self) {
        let mut rx = self.subscribe();
        // Sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|state| *state != ShutdownState::Running).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
