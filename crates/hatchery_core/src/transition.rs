//! Breed transition timer.
//!
//! A short countdown nested inside an egg. While it runs, replicas show a
//! ramping burst of the target breed's particles; when it reaches zero the
//! authoritative side commits the target as the egg's breed.
//!
//! # States
//!
//! - **Idle**: no target, zero ticks remaining.
//! - **Transitioning**: a target with `ticks_remaining > 0`.
//!
//! The target exists exactly while ticks remain, so the state is an enum
//! rather than a pair of nullable fields.

use crate::breeds::BreedId;
use crate::sync::{FieldSync, SyncedField};

/// State of a breed transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TransitionState {
    /// No transition.
    #[default]
    Idle,
    /// Counting down toward `target`.
    Transitioning {
        /// Breed being transitioned to.
        target: BreedId,
        /// Ticks left, always positive.
        ticks_remaining: u32,
    },
}

/// Replica-side result of one transition tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionFeedback {
    /// Breed whose cosmetics the particles use.
    pub target: BreedId,
    /// Particles to emit this tick.
    pub particles: u32,
}

/// Breed transition countdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TransitionTimer {
    state: TransitionState,
}

impl TransitionTimer {
    /// Create an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// Whether a transition is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning { .. })
    }

    /// Target breed, while transitioning.
    #[must_use]
    pub fn target(&self) -> Option<&BreedId> {
        match &self.state {
            TransitionState::Transitioning { target, .. } => Some(target),
            TransitionState::Idle => None,
        }
    }

    /// Ticks left, zero when idle.
    #[must_use]
    pub fn ticks_remaining(&self) -> u32 {
        match self.state {
            TransitionState::Transitioning {
                ticks_remaining, ..
            } => ticks_remaining,
            TransitionState::Idle => 0,
        }
    }

    /// Start (or restart) a transition and publish the target.
    ///
    /// Overwrites any transition already running. A zero duration aborts.
    pub fn begin<S: FieldSync + ?Sized>(&mut self, target: BreedId, duration: u32, sync: &mut S) {
        self.begin_local(target, duration);
        let published = self
            .target()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        sync.write_field(SyncedField::TransitionBreed(published));
    }

    /// Start (or restart) a transition without publishing it.
    ///
    /// Used by replicas reacting to a synced target, and when restoring
    /// saved state.
    pub fn begin_local(&mut self, target: BreedId, duration: u32) {
        if duration == 0 {
            self.abort();
            return;
        }
        tracing::debug!(target_breed = %target, duration, "Breed transition started");
        self.state = TransitionState::Transitioning {
            target,
            ticks_remaining: duration,
        };
    }

    /// Drop any transition without committing it.
    pub fn abort(&mut self) {
        if let TransitionState::Transitioning { target, .. } = &self.state {
            tracing::debug!(target_breed = %target, "Breed transition aborted");
        }
        self.state = TransitionState::Idle;
    }

    /// Authoritative tick. Returns the target once the countdown reaches
    /// zero; the synced target is cleared and the caller commits the breed.
    pub fn advance_authoritative<S: FieldSync + ?Sized>(
        &mut self,
        sync: &mut S,
    ) -> Option<BreedId> {
        let TransitionState::Transitioning {
            ticks_remaining, ..
        } = &mut self.state
        else {
            return None;
        };

        *ticks_remaining -= 1;
        if *ticks_remaining > 0 {
            return None;
        }

        let TransitionState::Transitioning { target, .. } = std::mem::take(&mut self.state) else {
            return None;
        };
        sync.write_field(SyncedField::TransitionBreed(String::new()));
        tracing::debug!(target_breed = %target, "Breed transition committed");
        Some(target)
    }

    /// Replica tick. Counts down locally without committing and reports how
    /// many particles to show: `duration - ticks_remaining`, so the burst
    /// grows as the transition nears completion.
    pub fn advance_replica(&mut self, duration: u32) -> Option<TransitionFeedback> {
        let TransitionState::Transitioning {
            target,
            ticks_remaining,
        } = &mut self.state
        else {
            return None;
        };

        *ticks_remaining -= 1;
        let feedback = TransitionFeedback {
            target: target.clone(),
            particles: duration.saturating_sub(*ticks_remaining),
        };

        if *ticks_remaining == 0 {
            self.state = TransitionState::Idle;
        }

        Some(feedback)
    }
}
