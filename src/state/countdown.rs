//! Display-only countdowns seeded by server-provided durations.

use std::time::Duration;

use tokio::time::Instant;

use crate::state::state_machine::GamePhase;

/// Cadence at which every countdown decrements.
pub const TICK: Duration = Duration::from_secs(1);

/// What a countdown is counting towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountdownPurpose {
    /// Time left before the first question.
    PreGame,
    /// Time left to answer the current question.
    Question,
    /// Time left before the winner reveal ends.
    WinnerReveal,
}

impl CountdownPurpose {
    /// The only phase in which this countdown may run.
    pub fn governing_phase(self) -> GamePhase {
        match self {
            CountdownPurpose::PreGame => GamePhase::CountdownToStart,
            CountdownPurpose::Question => GamePhase::QuestionActive,
            CountdownPurpose::WinnerReveal => GamePhase::WinnerReveal,
        }
    }
}

/// Single countdown: a non-negative counter with a one-shot expiry flag.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    remaining: u32,
    generation: u64,
    expired: bool,
    next_tick: Option<Instant>,
}

impl Countdown {
    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Bumped on every seed so expiries can be attributed to one seed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the countdown is still ticking.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Instant of the next decrement, if running.
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Overwrite whatever is in flight and restart the cadence from `now`.
    ///
    /// A zero seed stops the countdown without producing an expiry.
    pub fn seed(&mut self, seconds: u32, now: Instant) {
        self.generation += 1;
        self.remaining = seconds;
        self.expired = false;
        self.next_tick = (seconds > 0).then(|| now + TICK);
    }

    /// Stop and zero the countdown.
    pub fn clear(&mut self, now: Instant) {
        self.seed(0, now);
    }

    /// Decrement once. Returns `true` exactly once per seed, on reaching zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            self.next_tick = None;
            return false;
        }

        self.remaining -= 1;
        self.next_tick = self.next_tick.map(|at| at + TICK);

        if self.remaining == 0 {
            self.next_tick = None;
            if !self.expired {
                self.expired = true;
                return true;
            }
        }
        false
    }
}

/// One decrement that happened while driving the countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Which countdown ticked.
    pub purpose: CountdownPurpose,
    /// Seconds left after the tick.
    pub remaining: u32,
    /// Set on the tick that reached zero.
    pub expired: bool,
}

/// The three countdowns a client drives.
#[derive(Debug, Clone, Default)]
pub struct Countdowns {
    pre_game: Countdown,
    question: Countdown,
    winner_reveal: Countdown,
}

impl Countdowns {
    /// Borrow a countdown by purpose.
    pub fn get(&self, purpose: CountdownPurpose) -> &Countdown {
        match purpose {
            CountdownPurpose::PreGame => &self.pre_game,
            CountdownPurpose::Question => &self.question,
            CountdownPurpose::WinnerReveal => &self.winner_reveal,
        }
    }

    fn get_mut(&mut self, purpose: CountdownPurpose) -> &mut Countdown {
        match purpose {
            CountdownPurpose::PreGame => &mut self.pre_game,
            CountdownPurpose::Question => &mut self.question,
            CountdownPurpose::WinnerReveal => &mut self.winner_reveal,
        }
    }

    /// Seconds left on a countdown.
    pub fn remaining(&self, purpose: CountdownPurpose) -> u32 {
        self.get(purpose).remaining()
    }

    /// Reseed one countdown.
    pub fn seed(&mut self, purpose: CountdownPurpose, seconds: u32, now: Instant) {
        self.get_mut(purpose).seed(seconds, now);
    }

    /// Stop one countdown.
    pub fn clear(&mut self, purpose: CountdownPurpose, now: Instant) {
        self.get_mut(purpose).clear(now);
    }

    /// Stop every countdown.
    pub fn clear_all(&mut self, now: Instant) {
        for purpose in Self::PURPOSES {
            self.clear(purpose, now);
        }
    }

    /// Stop every countdown not governed by `phase`.
    pub fn retain_phase(&mut self, phase: GamePhase, now: Instant) {
        for purpose in Self::PURPOSES {
            if purpose.governing_phase() != phase && self.get(purpose).is_running() {
                self.clear(purpose, now);
            }
        }
    }

    /// Earliest pending decrement across all countdowns.
    pub fn next_deadline(&self) -> Option<Instant> {
        Self::PURPOSES
            .iter()
            .filter_map(|purpose| self.get(*purpose).next_tick())
            .min()
    }

    /// Apply every decrement due at `now`, in purpose order.
    pub fn advance(&mut self, now: Instant) -> Vec<CountdownTick> {
        let mut ticks = Vec::new();
        for purpose in Self::PURPOSES {
            let countdown = self.get_mut(purpose);
            while countdown.next_tick().is_some_and(|at| at <= now) {
                let expired = countdown.tick();
                ticks.push(CountdownTick {
                    purpose,
                    remaining: countdown.remaining(),
                    expired,
                });
            }
        }
        ticks
    }

    const PURPOSES: [CountdownPurpose; 3] = [
        CountdownPurpose::PreGame,
        CountdownPurpose::Question,
        CountdownPurpose::WinnerReveal,
    ];
}
