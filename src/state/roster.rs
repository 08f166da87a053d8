//! Roster of participants merged from polled snapshots and pushed leaderboards.

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::state::game::{Participant, ParticipantId};

/// Where a roster snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterOrigin {
    /// `GET /users` poll.
    Poll,
    /// Leaderboard pushed over the channel.
    Push,
}

/// Full roster as observed at one instant.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// Participants in server order.
    pub participants: Vec<Participant>,
    /// When the poll was issued, or when the push was received.
    pub observed_at: Instant,
    /// Source of the snapshot.
    pub origin: RosterOrigin,
}

/// Participants keyed by identifier, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    participants: IndexMap<ParticipantId, Participant>,
}

impl Roster {
    /// Build a roster; a repeated identifier keeps its first position and last value.
    pub fn from_participants(participants: impl IntoIterator<Item = Participant>) -> Self {
        let mut map = IndexMap::new();
        for participant in participants {
            map.insert(participant.id, participant);
        }
        Self { participants: map }
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True when nobody is registered.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Look a participant up by identifier.
    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    /// Participants by score descending; equal scores keep arrival order.
    pub fn leaderboard(&self) -> Vec<&Participant> {
        let mut sorted: Vec<&Participant> = self.participants.values().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted
    }

    /// Highest-scoring participant, first arrival on ties.
    pub fn leader(&self) -> Option<&Participant> {
        self.leaderboard().into_iter().next()
    }
}

/// Single source of truth for the roster, favouring the most recent snapshot.
#[derive(Debug, Clone, Default)]
pub struct RosterSource {
    roster: Roster,
    updated_at: Option<Instant>,
    origin: Option<RosterOrigin>,
}

impl RosterSource {
    /// Current roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Origin of the snapshot currently applied.
    pub fn origin(&self) -> Option<RosterOrigin> {
        self.origin
    }

    /// Replace the roster wholesale unless `snapshot` is older than the one applied.
    ///
    /// Returns whether the snapshot was applied.
    pub fn apply(&mut self, snapshot: RosterSnapshot) -> bool {
        if self
            .updated_at
            .is_some_and(|applied| snapshot.observed_at < applied)
        {
            return false;
        }

        self.roster = Roster::from_participants(snapshot.participants);
        self.updated_at = Some(snapshot.observed_at);
        self.origin = Some(snapshot.origin);
        true
    }
}
