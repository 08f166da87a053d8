/// Local one-second countdowns.
pub mod countdown;
/// Domain types shared across the session.
pub mod game;
/// Roster merging and leaderboard order.
pub mod roster;
/// The explicit session container.
pub mod session;
/// Phase reconciliation.
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tokio::time::Instant;

use crate::dto::view::SessionView;

pub use self::session::{Applied, CountdownOutcome, Effect, Role, SessionState};
use self::{
    roster::RosterSnapshot,
    state_machine::{GameEvent, GamePhase, InvalidTransition},
};

pub type SharedState = Arc<ClientState>;

/// Client state shared between the session loop and the action dispatcher.
pub struct ClientState {
    role: Role,
    session: RwLock<SessionState>,
    phase: watch::Sender<GamePhase>,
}

impl ClientState {
    /// Construct a new [`ClientState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(role: Role) -> SharedState {
        let (phase_tx, _rx) = watch::channel(GamePhase::Idle);
        Arc::new(Self {
            role,
            session: RwLock::new(SessionState::new(role)),
            phase: phase_tx,
        })
    }

    /// Role this client was started with.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Subscribe to phase changes.
    pub fn phase_watcher(&self) -> watch::Receiver<GamePhase> {
        self.phase.subscribe()
    }

    /// Current phase.
    pub async fn phase(&self) -> GamePhase {
        self.session.read().await.phase()
    }

    /// Run `f` against a read-only view of the session.
    pub async fn read_session<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let guard = self.session.read().await;
        f(&guard)
    }

    /// Run `f` with exclusive access to the session.
    pub async fn with_session_mut<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.session.write().await;
        f(&mut guard)
    }

    /// Reconcile an event and publish the resulting phase.
    pub async fn apply_event(&self, event: GameEvent) -> Result<Applied, InvalidTransition> {
        let now = Instant::now();
        let applied = {
            let mut guard = self.session.write().await;
            guard.apply(event, now)?
        };
        self.publish(&applied);
        Ok(applied)
    }

    /// Apply the countdown decrements due now.
    pub async fn advance_countdowns(&self) -> Vec<CountdownOutcome> {
        let now = Instant::now();
        let outcomes = {
            let mut guard = self.session.write().await;
            guard.advance_countdowns(now)
        };
        for applied in outcomes
            .iter()
            .filter_map(|outcome| outcome.expiry.as_ref())
            .filter_map(|expiry| expiry.as_ref().ok())
        {
            self.publish(applied);
        }
        outcomes
    }

    /// Earliest pending countdown decrement.
    pub async fn next_countdown_deadline(&self) -> Option<Instant> {
        self.session.read().await.next_countdown_deadline()
    }

    /// Merge a roster snapshot. Returns whether it was applied.
    pub async fn apply_roster(&self, snapshot: RosterSnapshot) -> bool {
        self.session.write().await.apply_roster(snapshot)
    }

    /// Record push channel state.
    pub async fn set_connected(&self, connected: bool) {
        self.session.write().await.set_connected(connected);
    }

    /// Render the session as a display snapshot.
    pub async fn view(&self) -> SessionView {
        let guard = self.session.read().await;
        SessionView::from(&*guard)
    }

    fn publish(&self, applied: &Applied) {
        if applied.phase_changed() {
            self.phase.send_replace(applied.to);
        }
    }
}
