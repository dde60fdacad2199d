use crate::predictions::PredictionState;
use crate::schedule::{MatchRecord, Schedule, Stage, TeamSlot, third_place_rank};

/// A match record with both slots resolved against the current predictions.
/// The original symbolic slots are kept for display next to the names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMatch {
    pub match_no: u32,
    pub stage: Stage,
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub slot1: TeamSlot,
    pub slot2: TeamSlot,
    pub location: String,
    pub kickoff_edt: String,
    pub kickoff_ist: String,
}

impl ResolvedMatch {
    pub fn both_resolved(&self) -> bool {
        self.team1.is_some() && self.team2.is_some()
    }
}

/// Resolve a slot to a concrete team name, or `None` while the predictions
/// it depends on are still missing. Total: malformed codes and absent data
/// both come back as `None`, never an error.
pub fn resolve_slot(
    slot: &TeamSlot,
    schedule: &Schedule,
    state: &PredictionState,
) -> Option<String> {
    resolve_slot_at(slot, schedule, state, 0)
}

fn resolve_slot_at(
    slot: &TeamSlot,
    schedule: &Schedule,
    state: &PredictionState,
    depth: u8,
) -> Option<String> {
    match slot {
        TeamSlot::Literal(name) => Some(name.clone()),
        TeamSlot::GroupCode { position, group } => {
            let pred = state.group_stage.get(group)?;
            match *position {
                1 => pred.first.clone(),
                2 => pred.second.clone(),
                3 => pred.third.clone(),
                _ => None,
            }
        }
        TeamSlot::ThirdPlaceCode(code) => {
            let rank = third_place_rank(code)?;
            state.third_place_qualifiers.get(rank).cloned()
        }
        TeamSlot::WinnerCode(match_no) => match *match_no {
            73..=102 => state.match_winner(*match_no).map(str::to_string),
            _ => None,
        },
        // Only the two semifinals feed a loser anywhere (the third-place
        // match). Recursion is bounded: a semifinal's own slots are at most
        // winner codes one round back.
        TeamSlot::LoserCode(match_no) => {
            if !matches!(*match_no, 101 | 102) || depth >= 2 {
                return None;
            }
            let winner = state.match_winner(*match_no)?.to_string();
            let semi = schedule.match_by_number(*match_no)?;
            let team1 = resolve_slot_at(&semi.team1, schedule, state, depth + 1);
            let team2 = resolve_slot_at(&semi.team2, schedule, state, depth + 1);
            match (
                team1.as_deref() == Some(winner.as_str()),
                team2.as_deref() == Some(winner.as_str()),
            ) {
                (true, false) => team2,
                (false, true) => team1,
                // Neither or both equal the recorded winner: the manual
                // state is inconsistent, leave the slot unresolved.
                _ => None,
            }
        }
    }
}

pub fn resolve_match(
    record: &MatchRecord,
    schedule: &Schedule,
    state: &PredictionState,
) -> ResolvedMatch {
    ResolvedMatch {
        match_no: record.match_no,
        stage: record.stage,
        team1: resolve_slot(&record.team1, schedule, state),
        team2: resolve_slot(&record.team2, schedule, state),
        slot1: record.team1.clone(),
        slot2: record.team2.clone(),
        location: record.location.clone(),
        kickoff_edt: record.kickoff_edt.clone(),
        kickoff_ist: record.kickoff_ist.clone(),
    }
}

pub fn resolve_stage(
    schedule: &Schedule,
    state: &PredictionState,
    stage: Stage,
) -> Vec<ResolvedMatch> {
    schedule
        .matches_in_stage(stage)
        .into_iter()
        .map(|m| resolve_match(m, schedule, state))
        .collect()
}
