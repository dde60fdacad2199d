use wc26_bracket::predictions::{
    GroupPosition, KnockoutRound, PredictionStore,
};
use wc26_bracket::resolve::{resolve_match, resolve_slot, resolve_stage};
use wc26_bracket::schedule::{Schedule, Stage, TeamSlot, next_match};

/// Every group fully placed in roster order, with the first eight groups'
/// third-place teams as the ordered qualifier list.
fn predicted_group_stage(schedule: &Schedule) -> PredictionStore {
    let mut store = PredictionStore::in_memory();
    for g in schedule.group_letters() {
        let roster = schedule.group_teams(g);
        for (team, position) in roster.iter().zip(GroupPosition::ALL) {
            assert!(store.set_group_position(schedule, g, position, Some(team.clone())));
        }
    }
    let qualifiers: Vec<String> = "ABCDEFGH"
        .chars()
        .map(|g| schedule.group_teams(g)[2].clone())
        .collect();
    store.set_third_place_qualifiers(qualifiers);
    store
}

#[test]
fn literal_always_resolves() {
    let schedule = Schedule::bundled();
    let store = PredictionStore::in_memory();
    let slot = TeamSlot::Literal("Mexico".to_string());
    assert_eq!(
        resolve_slot(&slot, schedule, store.state()),
        Some("Mexico".to_string())
    );
}

#[test]
fn group_codes_resolve_after_picks() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();
    let first = TeamSlot::GroupCode {
        position: 1,
        group: 'A',
    };
    let second = TeamSlot::GroupCode {
        position: 2,
        group: 'A',
    };
    assert_eq!(resolve_slot(&first, schedule, store.state()), None);

    store.set_group_position(schedule, 'A', GroupPosition::First, Some("Mexico".into()));
    store.set_group_position(schedule, 'A', GroupPosition::Second, Some("Poland".into()));
    assert_eq!(
        resolve_slot(&first, schedule, store.state()),
        Some("Mexico".to_string())
    );
    assert_eq!(
        resolve_slot(&second, schedule, store.state()),
        Some("Poland".to_string())
    );
}

#[test]
fn third_place_codes_use_qualifier_ranks() {
    let schedule = Schedule::bundled();
    let store = predicted_group_stage(schedule);
    let qualifiers = store.state().third_place_qualifiers.clone();
    assert_eq!(qualifiers.len(), 8);

    let best = TeamSlot::ThirdPlaceCode("3ABCDF".to_string());
    let worst = TeamSlot::ThirdPlaceCode("3DEIJL".to_string());
    assert_eq!(
        resolve_slot(&best, schedule, store.state()),
        Some(qualifiers[0].clone())
    );
    assert_eq!(
        resolve_slot(&worst, schedule, store.state()),
        Some(qualifiers[7].clone())
    );

    // Unknown group-set strings are unresolved, never an error.
    let unknown = TeamSlot::ThirdPlaceCode("3ABCDE".to_string());
    assert_eq!(resolve_slot(&unknown, schedule, store.state()), None);
}

#[test]
fn third_place_code_resolves_group_a_third() {
    // Group A roster order puts Poland third; ranked first among qualifiers
    // it must surface wherever 3ABCDF appears in the Round of 32.
    let schedule = Schedule::bundled();
    let mut store = predicted_group_stage(schedule);
    let mut qualifiers = store.state().third_place_qualifiers.clone();
    let poland = schedule.group_teams('A')[2].clone();
    assert_eq!(poland, "Poland");
    qualifiers.retain(|t| *t != poland);
    qualifiers.insert(0, poland.clone());
    qualifiers.truncate(8);
    store.set_third_place_qualifiers(qualifiers);

    let code = TeamSlot::ThirdPlaceCode("3ABCDF".to_string());
    let host = schedule
        .matches_in_stage(Stage::RoundOf32)
        .into_iter()
        .find(|m| m.team1 == code || m.team2 == code)
        .expect("3ABCDF appears in the round of 32");
    let resolved = resolve_match(host, schedule, store.state());
    let side = if host.team1 == code {
        resolved.team1
    } else {
        resolved.team2
    };
    assert_eq!(side, Some("Poland".to_string()));
}

#[test]
fn winner_codes_gate_on_recorded_winners() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();

    let fed = next_match(73).unwrap();
    let record = schedule.match_by_number(fed).unwrap();
    assert_eq!(record.team1, TeamSlot::WinnerCode(73));
    assert_eq!(resolve_slot(&record.team1, schedule, store.state()), None);

    store.set_match_winner(KnockoutRound::RoundOf32, 73, "Mexico".to_string());
    assert_eq!(
        resolve_slot(&record.team1, schedule, store.state()),
        Some("Mexico".to_string())
    );
}

#[test]
fn winner_codes_cover_every_mapped_range() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();
    store.set_match_winner(KnockoutRound::RoundOf32, 88, "A".to_string());
    store.set_match_winner(KnockoutRound::RoundOf16, 89, "B".to_string());
    store.set_match_winner(KnockoutRound::Quarterfinals, 100, "C".to_string());
    store.set_match_winner(KnockoutRound::Semifinals, 102, "D".to_string());

    let cases = [(88, "A"), (89, "B"), (100, "C"), (102, "D")];
    for (match_no, expected) in cases {
        let slot = TeamSlot::WinnerCode(match_no);
        assert_eq!(
            resolve_slot(&slot, schedule, store.state()),
            Some(expected.to_string())
        );
    }
}

#[test]
fn winner_codes_outside_known_ranges_stay_unresolved() {
    let schedule = Schedule::bundled();
    let store = PredictionStore::in_memory();
    for match_no in [1, 42, 72, 103, 104, 999] {
        let slot = TeamSlot::WinnerCode(match_no);
        assert_eq!(resolve_slot(&slot, schedule, store.state()), None);
    }
}

#[test]
fn loser_code_returns_the_beaten_semifinalist() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();
    // Semifinal 101 is W97 vs W98; resolve both sides one round down.
    store.set_match_winner(KnockoutRound::Quarterfinals, 97, "Argentina".to_string());
    store.set_match_winner(KnockoutRound::Quarterfinals, 98, "Brazil".to_string());

    let loser = TeamSlot::LoserCode(101);
    // No semifinal winner recorded yet.
    assert_eq!(resolve_slot(&loser, schedule, store.state()), None);

    store.set_match_winner(KnockoutRound::Semifinals, 101, "Argentina".to_string());
    assert_eq!(
        resolve_slot(&loser, schedule, store.state()),
        Some("Brazil".to_string())
    );

    store.set_match_winner(KnockoutRound::Semifinals, 101, "Brazil".to_string());
    assert_eq!(
        resolve_slot(&loser, schedule, store.state()),
        Some("Argentina".to_string())
    );
}

#[test]
fn loser_code_with_inconsistent_state_stays_unresolved() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();
    store.set_match_winner(KnockoutRound::Quarterfinals, 97, "Argentina".to_string());
    store.set_match_winner(KnockoutRound::Quarterfinals, 98, "Brazil".to_string());

    // Recorded winner matches neither participant.
    store.set_match_winner(KnockoutRound::Semifinals, 101, "France".to_string());
    let loser = TeamSlot::LoserCode(101);
    assert_eq!(resolve_slot(&loser, schedule, store.state()), None);

    // Both participants resolve to the recorded winner.
    let mut both = PredictionStore::in_memory();
    both.set_match_winner(KnockoutRound::Quarterfinals, 97, "Spain".to_string());
    both.set_match_winner(KnockoutRound::Quarterfinals, 98, "Spain".to_string());
    both.set_match_winner(KnockoutRound::Semifinals, 101, "Spain".to_string());
    assert_eq!(resolve_slot(&loser, schedule, both.state()), None);
}

#[test]
fn loser_codes_only_cover_the_semifinals() {
    let schedule = Schedule::bundled();
    let mut store = PredictionStore::in_memory();
    store.set_match_winner(KnockoutRound::Quarterfinals, 99, "Germany".to_string());
    for match_no in [73, 97, 99, 103, 104] {
        let slot = TeamSlot::LoserCode(match_no);
        assert_eq!(resolve_slot(&slot, schedule, store.state()), None);
    }
}

#[test]
fn resolved_match_keeps_original_slots() {
    let schedule = Schedule::bundled();
    let store = predicted_group_stage(schedule);
    let record = schedule.match_by_number(73).unwrap();
    let resolved = resolve_match(record, schedule, store.state());

    assert_eq!(resolved.match_no, 73);
    assert_eq!(resolved.stage, Stage::RoundOf32);
    assert_eq!(resolved.slot1, record.team1);
    assert_eq!(resolved.slot2, record.team2);
    assert_eq!(resolved.location, record.location);
    // Group A winner in roster order.
    assert_eq!(resolved.team1, Some("Mexico".to_string()));
    assert!(resolved.both_resolved());
}

#[test]
fn full_round_of_32_resolves_once_groups_are_set() {
    let schedule = Schedule::bundled();
    let store = predicted_group_stage(schedule);
    let resolved = resolve_stage(schedule, store.state(), Stage::RoundOf32);
    assert_eq!(resolved.len(), 16);
    for m in &resolved {
        assert!(m.both_resolved(), "match {} unresolved", m.match_no);
    }
}
