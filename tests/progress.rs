use std::time::{Duration, Instant};

use wc26_bracket::predictions::PredictionState;
use wc26_bracket::progress::{
    AutoAdvance, StagePhase, advance_target, first_incomplete_stage, stage_complete,
    stage_unlocked,
};
use wc26_bracket::schedule::{
    GROUP_LETTERS, QUARTERFINAL_MATCHES, ROUND_OF_16_MATCHES, ROUND_OF_32_MATCHES,
    SEMIFINAL_MATCHES,
};

fn complete_group_stage(state: &mut PredictionState) {
    for (i, g) in GROUP_LETTERS.into_iter().enumerate() {
        let pred = state.group_stage.entry(g).or_default();
        pred.first = Some(format!("first-{i}"));
        pred.second = Some(format!("second-{i}"));
        pred.third = Some(format!("third-{i}"));
    }
    state.third_place_qualifiers = (0..8).map(|i| format!("third-{i}")).collect();
}

fn complete_through(state: &mut PredictionState, phase: StagePhase) {
    if phase >= StagePhase::GroupStage {
        complete_group_stage(state);
    }
    if phase >= StagePhase::RoundOf32 {
        for n in ROUND_OF_32_MATCHES {
            state.round_of_32.insert(n, format!("w{n}"));
        }
    }
    if phase >= StagePhase::RoundOf16 {
        for n in ROUND_OF_16_MATCHES {
            state.round_of_16.insert(n, format!("w{n}"));
        }
    }
    if phase >= StagePhase::Quarterfinals {
        for n in QUARTERFINAL_MATCHES {
            state.quarterfinals.insert(n, format!("w{n}"));
        }
    }
    if phase >= StagePhase::Semifinals {
        for n in SEMIFINAL_MATCHES {
            state.semifinals.insert(n, format!("w{n}"));
        }
    }
    if phase >= StagePhase::ThirdPlace {
        state.third_place = Some("w103".to_string());
    }
    if phase >= StagePhase::Final {
        state.final_winner = Some("w104".to_string());
    }
}

#[test]
fn group_stage_completeness_needs_all_25_facts() {
    let mut state = PredictionState::new();
    complete_group_stage(&mut state);
    assert!(stage_complete(StagePhase::GroupStage, &state));

    // Dropping any single group's first or second pick flips it.
    for g in GROUP_LETTERS {
        let kept = state.group_stage[&g].clone();

        state.group_stage.get_mut(&g).unwrap().first = None;
        assert!(!stage_complete(StagePhase::GroupStage, &state));
        state.group_stage.insert(g, kept.clone());

        state.group_stage.get_mut(&g).unwrap().second = None;
        assert!(!stage_complete(StagePhase::GroupStage, &state));
        state.group_stage.insert(g, kept);
    }
    assert!(stage_complete(StagePhase::GroupStage, &state));

    // Exactly eight qualifiers: one fewer or one more both fail.
    let full = state.third_place_qualifiers.clone();
    state.third_place_qualifiers.pop();
    assert!(!stage_complete(StagePhase::GroupStage, &state));
    state.third_place_qualifiers = full.clone();
    state.third_place_qualifiers.push("extra".to_string());
    assert!(!stage_complete(StagePhase::GroupStage, &state));
    state.third_place_qualifiers = full;
    assert!(stage_complete(StagePhase::GroupStage, &state));
}

#[test]
fn knockout_completeness_needs_every_fixed_match() {
    let mut state = PredictionState::new();
    complete_through(&mut state, StagePhase::Final);
    for phase in StagePhase::ALL {
        assert!(stage_complete(phase, &state), "{}", phase.label());
    }

    for n in ROUND_OF_32_MATCHES {
        let kept = state.round_of_32.remove(&n).unwrap();
        assert!(!stage_complete(StagePhase::RoundOf32, &state));
        state.round_of_32.insert(n, kept);
    }
    for n in SEMIFINAL_MATCHES {
        let kept = state.semifinals.remove(&n).unwrap();
        assert!(!stage_complete(StagePhase::Semifinals, &state));
        state.semifinals.insert(n, kept);
    }

    state.third_place = None;
    assert!(!stage_complete(StagePhase::ThirdPlace, &state));
    state.third_place = Some("w103".to_string());
    state.final_winner = None;
    assert!(!stage_complete(StagePhase::Final, &state));
}

#[test]
fn unlock_chain_is_strictly_linear() {
    let state = PredictionState::new();
    assert!(stage_unlocked(StagePhase::GroupStage, &state));
    for phase in StagePhase::ALL.into_iter().skip(1) {
        assert!(!stage_unlocked(phase, &state), "{}", phase.label());
    }

    // Completing each phase unlocks exactly the next one.
    for (i, phase) in StagePhase::ALL.into_iter().enumerate() {
        let mut state = PredictionState::new();
        complete_through(&mut state, phase);
        for (j, other) in StagePhase::ALL.into_iter().enumerate() {
            let expected = j <= i + 1;
            assert_eq!(
                stage_unlocked(other, &state),
                expected,
                "after {} complete, {} unlock",
                phase.label(),
                other.label()
            );
        }
    }
}

#[test]
fn unlocked_stage_implies_all_predecessors_complete() {
    let mut state = PredictionState::new();
    complete_through(&mut state, StagePhase::Quarterfinals);
    for phase in StagePhase::ALL {
        if stage_unlocked(phase, &state) {
            for earlier in StagePhase::ALL.into_iter().filter(|p| *p < phase) {
                assert!(stage_complete(earlier, &state));
            }
        }
    }
}

#[test]
fn first_incomplete_stage_walks_forward() {
    let mut state = PredictionState::new();
    assert_eq!(first_incomplete_stage(&state), Some(StagePhase::GroupStage));
    complete_through(&mut state, StagePhase::RoundOf16);
    assert_eq!(
        first_incomplete_stage(&state),
        Some(StagePhase::Quarterfinals)
    );
    complete_through(&mut state, StagePhase::Final);
    assert_eq!(first_incomplete_stage(&state), None);
}

#[test]
fn advance_target_fires_only_on_completion() {
    let mut state = PredictionState::new();
    assert_eq!(advance_target(StagePhase::GroupStage, &state), None);

    complete_group_stage(&mut state);
    assert_eq!(
        advance_target(StagePhase::GroupStage, &state),
        Some(StagePhase::RoundOf32)
    );

    // The last stage has nowhere to advance to.
    complete_through(&mut state, StagePhase::Final);
    assert_eq!(advance_target(StagePhase::Final, &state), None);
}

#[test]
fn auto_advance_debounces_single_shot() {
    let delay = Duration::from_millis(100);
    let mut auto = AutoAdvance::with_delay(delay);
    let t0 = Instant::now();

    auto.arm(StagePhase::RoundOf32, t0);
    assert_eq!(auto.pending(), Some(StagePhase::RoundOf32));
    assert_eq!(auto.poll(t0), None);
    assert_eq!(auto.poll(t0 + delay), Some(StagePhase::RoundOf32));
    // Fires at most once.
    assert_eq!(auto.poll(t0 + delay * 2), None);
    assert_eq!(auto.pending(), None);
}

#[test]
fn rearming_replaces_the_pending_transition() {
    let delay = Duration::from_millis(100);
    let mut auto = AutoAdvance::with_delay(delay);
    let t0 = Instant::now();

    auto.arm(StagePhase::RoundOf32, t0);
    let t1 = t0 + Duration::from_millis(60);
    auto.arm(StagePhase::RoundOf16, t1);

    // The first deadline no longer exists.
    assert_eq!(auto.poll(t0 + delay), None);
    assert_eq!(auto.poll(t1 + delay), Some(StagePhase::RoundOf16));
}

#[test]
fn cancel_discards_the_pending_transition() {
    let delay = Duration::from_millis(100);
    let mut auto = AutoAdvance::with_delay(delay);
    let t0 = Instant::now();

    auto.arm(StagePhase::Final, t0);
    auto.cancel();
    assert_eq!(auto.pending(), None);
    assert_eq!(auto.poll(t0 + delay * 2), None);
}
