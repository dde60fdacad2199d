use std::time::{Duration, Instant};

use crate::predictions::PredictionState;
use crate::schedule::{
    GROUP_LETTERS, QUARTERFINAL_MATCHES, ROUND_OF_16_MATCHES, ROUND_OF_32_MATCHES,
    SEMIFINAL_MATCHES,
};

pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(500);

/// The seven sequential phases of the prediction flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StagePhase {
    GroupStage,
    RoundOf32,
    RoundOf16,
    Quarterfinals,
    Semifinals,
    ThirdPlace,
    Final,
}

impl StagePhase {
    pub const ALL: [StagePhase; 7] = [
        StagePhase::GroupStage,
        StagePhase::RoundOf32,
        StagePhase::RoundOf16,
        StagePhase::Quarterfinals,
        StagePhase::Semifinals,
        StagePhase::ThirdPlace,
        StagePhase::Final,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StagePhase::GroupStage => "Group Stage",
            StagePhase::RoundOf32 => "Round of 32",
            StagePhase::RoundOf16 => "Round of 16",
            StagePhase::Quarterfinals => "Quarterfinals",
            StagePhase::Semifinals => "Semifinals",
            StagePhase::ThirdPlace => "Third Place",
            StagePhase::Final => "Final",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<StagePhase> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

pub fn stage_complete(phase: StagePhase, state: &PredictionState) -> bool {
    match phase {
        StagePhase::GroupStage => {
            let tops_picked = GROUP_LETTERS.iter().all(|g| {
                state
                    .group_stage
                    .get(g)
                    .is_some_and(|p| p.first.is_some() && p.second.is_some())
            });
            tops_picked && state.third_place_qualifiers.len() == 8
        }
        StagePhase::RoundOf32 => ROUND_OF_32_MATCHES
            .iter()
            .all(|n| state.round_of_32.contains_key(n)),
        StagePhase::RoundOf16 => ROUND_OF_16_MATCHES
            .iter()
            .all(|n| state.round_of_16.contains_key(n)),
        StagePhase::Quarterfinals => QUARTERFINAL_MATCHES
            .iter()
            .all(|n| state.quarterfinals.contains_key(n)),
        StagePhase::Semifinals => SEMIFINAL_MATCHES
            .iter()
            .all(|n| state.semifinals.contains_key(n)),
        StagePhase::ThirdPlace => state.third_place.is_some(),
        StagePhase::Final => state.final_winner.is_some(),
    }
}

/// Strict linear chain: a stage opens only once its predecessor is complete,
/// whether or not its own inputs happen to be resolvable already.
pub fn stage_unlocked(phase: StagePhase, state: &PredictionState) -> bool {
    match phase.index() {
        0 => true,
        i => stage_complete(StagePhase::ALL[i - 1], state),
    }
}

pub fn first_incomplete_stage(state: &PredictionState) -> Option<StagePhase> {
    StagePhase::ALL
        .into_iter()
        .find(|p| !stage_complete(*p, state))
}

/// Where the view should move after a mutation: the next stage, once the
/// current one is complete.
pub fn advance_target(current: StagePhase, state: &PredictionState) -> Option<StagePhase> {
    if stage_complete(current, state) {
        current.next()
    } else {
        None
    }
}

/// Single-shot debounced stage transition, polled from the UI tick loop.
/// Re-arming replaces any pending transition; a state change inside the
/// delay window re-arms or cancels rather than stacking.
#[derive(Debug)]
pub struct AutoAdvance {
    delay: Duration,
    pending: Option<(StagePhase, Instant)>,
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoAdvance {
    pub fn new() -> Self {
        Self::with_delay(AUTO_ADVANCE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        AutoAdvance {
            delay,
            pending: None,
        }
    }

    pub fn arm(&mut self, target: StagePhase, now: Instant) {
        self.pending = Some((target, now + self.delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<StagePhase> {
        self.pending.map(|(target, _)| target)
    }

    /// Returns the due transition at most once.
    pub fn poll(&mut self, now: Instant) -> Option<StagePhase> {
        match self.pending {
            Some((target, deadline)) if now >= deadline => {
                self.pending = None;
                Some(target)
            }
            _ => None,
        }
    }
}
