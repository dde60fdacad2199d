use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schedule::{GROUP_LETTERS, Schedule};

const STATE_DIR: &str = "wc26_bracket";
const STATE_FILE: &str = "predictions.json";
const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPosition {
    First,
    Second,
    Third,
    Fourth,
}

impl GroupPosition {
    pub const ALL: [GroupPosition; 4] = [
        GroupPosition::First,
        GroupPosition::Second,
        GroupPosition::Third,
        GroupPosition::Fourth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GroupPosition::First => "1st",
            GroupPosition::Second => "2nd",
            GroupPosition::Third => "3rd",
            GroupPosition::Fourth => "4th",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPrediction {
    pub first: Option<String>,
    pub second: Option<String>,
    pub third: Option<String>,
    pub fourth: Option<String>,
}

impl GroupPrediction {
    pub fn slot(&self, position: GroupPosition) -> &Option<String> {
        match position {
            GroupPosition::First => &self.first,
            GroupPosition::Second => &self.second,
            GroupPosition::Third => &self.third,
            GroupPosition::Fourth => &self.fourth,
        }
    }

    fn slot_mut(&mut self, position: GroupPosition) -> &mut Option<String> {
        match position {
            GroupPosition::First => &mut self.first,
            GroupPosition::Second => &mut self.second,
            GroupPosition::Third => &mut self.third,
            GroupPosition::Fourth => &mut self.fourth,
        }
    }

    pub fn filled(&self) -> usize {
        GroupPosition::ALL
            .iter()
            .filter(|p| self.slot(**p).is_some())
            .count()
    }

    fn holds(&self, team: &str) -> Option<GroupPosition> {
        GroupPosition::ALL
            .into_iter()
            .find(|p| self.slot(*p).as_deref() == Some(team))
    }
}

/// The four knockout stages whose winners are keyed by match number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockoutRound {
    RoundOf32,
    RoundOf16,
    Quarterfinals,
    Semifinals,
}

/// The two single-match picks stored as scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodiumSlot {
    ThirdPlace,
    Final,
}

/// Every user pick across the tournament. All-null by default; serialized
/// wholesale after each mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionState {
    #[serde(default)]
    pub group_stage: BTreeMap<char, GroupPrediction>,
    #[serde(default)]
    pub third_place_qualifiers: Vec<String>,
    #[serde(default)]
    pub round_of_32: BTreeMap<u32, String>,
    #[serde(default)]
    pub round_of_16: BTreeMap<u32, String>,
    #[serde(default)]
    pub quarterfinals: BTreeMap<u32, String>,
    #[serde(default)]
    pub semifinals: BTreeMap<u32, String>,
    #[serde(default)]
    pub third_place: Option<String>,
    #[serde(default, rename = "final")]
    pub final_winner: Option<String>,
}

impl Default for PredictionState {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionState {
    pub fn new() -> Self {
        let group_stage = GROUP_LETTERS
            .into_iter()
            .map(|g| (g, GroupPrediction::default()))
            .collect();
        PredictionState {
            group_stage,
            third_place_qualifiers: Vec::new(),
            round_of_32: BTreeMap::new(),
            round_of_16: BTreeMap::new(),
            quarterfinals: BTreeMap::new(),
            semifinals: BTreeMap::new(),
            third_place: None,
            final_winner: None,
        }
    }

    pub fn round_map(&self, round: KnockoutRound) -> &BTreeMap<u32, String> {
        match round {
            KnockoutRound::RoundOf32 => &self.round_of_32,
            KnockoutRound::RoundOf16 => &self.round_of_16,
            KnockoutRound::Quarterfinals => &self.quarterfinals,
            KnockoutRound::Semifinals => &self.semifinals,
        }
    }

    fn round_map_mut(&mut self, round: KnockoutRound) -> &mut BTreeMap<u32, String> {
        match round {
            KnockoutRound::RoundOf32 => &mut self.round_of_32,
            KnockoutRound::RoundOf16 => &mut self.round_of_16,
            KnockoutRound::Quarterfinals => &mut self.quarterfinals,
            KnockoutRound::Semifinals => &mut self.semifinals,
        }
    }

    /// Recorded winner of any knockout match, unifying the mapped stages and
    /// the two scalar picks behind one match-number lookup.
    pub fn match_winner(&self, match_no: u32) -> Option<&str> {
        match match_no {
            73..=88 => self.round_of_32.get(&match_no).map(String::as_str),
            89..=96 => self.round_of_16.get(&match_no).map(String::as_str),
            97..=100 => self.quarterfinals.get(&match_no).map(String::as_str),
            101 | 102 => self.semifinals.get(&match_no).map(String::as_str),
            103 => self.third_place.as_deref(),
            104 => self.final_winner.as_deref(),
            _ => None,
        }
    }

    // Old serialized states may miss group letters; construction fills them.
    fn ensure_groups(&mut self) {
        for g in GROUP_LETTERS {
            self.group_stage.entry(g).or_default();
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    state: PredictionState,
}

/// Owns the prediction aggregate and mirrors every mutation to a JSON file.
/// Persistence is best-effort: write failures never roll back the in-memory
/// state, and a missing or corrupt file loads as defaults.
#[derive(Debug)]
pub struct PredictionStore {
    state: PredictionState,
    path: Option<PathBuf>,
}

impl PredictionStore {
    /// Load from the default cache location, falling back to defaults.
    pub fn open_default() -> Self {
        Self::with_path(state_path())
    }

    pub fn with_path(path: Option<PathBuf>) -> Self {
        let state = path
            .as_deref()
            .and_then(load_state_file)
            .map(|mut s| {
                s.ensure_groups();
                s
            })
            .unwrap_or_default();
        PredictionStore { state, path }
    }

    /// Unpersisted store, mostly for tests and headless use.
    pub fn in_memory() -> Self {
        PredictionStore {
            state: PredictionState::new(),
            path: None,
        }
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    /// Set one group slot. Refuses a team already placed in another position
    /// of the same group; placing a team that fills the third position
    /// auto-fills the fourth with the remaining roster member. Clearing a
    /// slot never triggers the auto-fill.
    pub fn set_group_position(
        &mut self,
        schedule: &Schedule,
        group: char,
        position: GroupPosition,
        team: Option<String>,
    ) -> bool {
        let Some(pred) = self.state.group_stage.get_mut(&group) else {
            return false;
        };
        if let Some(name) = team.as_deref() {
            if matches!(pred.holds(name), Some(p) if p != position) {
                return false;
            }
        }
        let setting = team.is_some();
        *pred.slot_mut(position) = team;

        // Auto-fill only while placing a team. Clearing a slot of a full
        // group must leave it cleared, not hand the team straight back.
        if setting && pred.filled() == 3 {
            let placed: Vec<&str> = GroupPosition::ALL
                .iter()
                .filter_map(|p| pred.slot(*p).as_deref())
                .collect();
            let remaining_team = schedule
                .group_teams(group)
                .into_iter()
                .find(|t| !placed.contains(&t.as_str()));
            let open = GroupPosition::ALL
                .into_iter()
                .find(|p| pred.slot(*p).is_none());
            if let (Some(team), Some(open)) = (remaining_team, open) {
                *pred.slot_mut(open) = Some(team);
            }
        }
        self.persist();
        true
    }

    /// Exchange two slots verbatim, empty values included.
    pub fn swap_group_positions(
        &mut self,
        group: char,
        pos_a: GroupPosition,
        pos_b: GroupPosition,
    ) {
        let Some(pred) = self.state.group_stage.get_mut(&group) else {
            return;
        };
        let a = pred.slot(pos_a).clone();
        let b = pred.slot(pos_b).clone();
        *pred.slot_mut(pos_a) = b;
        *pred.slot_mut(pos_b) = a;
        self.persist();
    }

    /// Replace the ordered qualifier list wholesale. The caller keeps the
    /// ≤8 / uniqueness invariant; the store does not re-derive it.
    pub fn set_third_place_qualifiers(&mut self, qualifiers: Vec<String>) {
        self.state.third_place_qualifiers = qualifiers;
        self.persist();
    }

    pub fn set_match_winner(&mut self, round: KnockoutRound, match_no: u32, team: String) {
        self.state.round_map_mut(round).insert(match_no, team);
        self.persist();
    }

    pub fn set_podium(&mut self, slot: PodiumSlot, team: String) {
        match slot {
            PodiumSlot::ThirdPlace => self.state.third_place = Some(team),
            PodiumSlot::Final => self.state.final_winner = Some(team),
        }
        self.persist();
    }

    /// Restore the all-null aggregate and delete the persisted file, so a
    /// future load reconstructs defaults structurally instead of reading
    /// stale serialized nulls.
    pub fn reset(&mut self) {
        self.state = PredictionState::new();
        if let Some(path) = &self.path {
            let _ = fs::remove_file(path);
        }
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        let file = StateFile {
            version: STATE_VERSION,
            state: self.state.clone(),
        };
        if let Ok(json) = serde_json::to_string(&file) {
            let tmp = path.with_extension("json.tmp");
            if fs::write(&tmp, json).is_ok() {
                let _ = fs::rename(&tmp, path);
            }
        }
    }
}

fn load_state_file(path: &Path) -> Option<PredictionState> {
    let raw = fs::read_to_string(path).ok()?;
    let file = serde_json::from_str::<StateFile>(&raw).ok()?;
    if file.version != STATE_VERSION {
        return None;
    }
    Some(file.state)
}

fn state_path() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(STATE_DIR).join(STATE_FILE));
        }
    }
    // Fallback to ~/.cache on linux-like systems.
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(STATE_DIR)
            .join(STATE_FILE),
    )
}
