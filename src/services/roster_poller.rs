//! Periodic `/users` refresh, active only in the phases that show the roster.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    time::{Instant, MissedTickBehavior, interval},
};
use tracing::{debug, warn};

use crate::{
    dao::game_api::GameApi,
    state::{
        roster::{RosterOrigin, RosterSnapshot},
        state_machine::GamePhase,
    },
};

/// Poll `GET /users` every `period` while the phase calls for it.
///
/// Parks on the phase watch outside polling phases. Returns once the phase
/// sender or the snapshot receiver is gone.
pub async fn run(
    api: Arc<dyn GameApi>,
    mut phase: watch::Receiver<GamePhase>,
    period: Duration,
    snapshots: mpsc::Sender<RosterSnapshot>,
) {
    loop {
        let current = *phase.borrow_and_update();
        if !current.polls_roster() {
            if phase.changed().await.is_err() {
                return;
            }
            continue;
        }

        debug!(phase = ?current, "roster polling active");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = phase.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let next = *phase.borrow();
                    if !next.polls_roster() {
                        debug!(phase = ?next, "roster polling paused");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let observed_at = Instant::now();
                    match api.list_users().await {
                        Ok(participants) => {
                            let snapshot = RosterSnapshot {
                                participants,
                                observed_at,
                                origin: RosterOrigin::Poll,
                            };
                            if snapshots.send(snapshot).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => warn!(error = %err, "roster poll failed"),
                    }
                }
            }
        }
    }
}
