use std::collections::BTreeMap;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub const GROUP_LETTERS: [char; 12] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L',
];

pub const ROUND_OF_32_MATCHES: [u32; 16] = [
    73, 74, 75, 76, 77, 78, 79, 80, 81, 82, 83, 84, 85, 86, 87, 88,
];
pub const ROUND_OF_16_MATCHES: [u32; 8] = [89, 90, 91, 92, 93, 94, 95, 96];
pub const QUARTERFINAL_MATCHES: [u32; 4] = [97, 98, 99, 100];
pub const SEMIFINAL_MATCHES: [u32; 2] = [101, 102];
pub const THIRD_PLACE_MATCH: u32 = 103;
pub const FINAL_MATCH: u32 = 104;

// FIFA ranks the 8 best third-place teams and assigns each rank to a fixed
// group-set code in the Round of 32.
const THIRD_PLACE_RANKS: [(&str, usize); 8] = [
    ("3ABCDF", 0),
    ("3CDFGH", 1),
    ("3CEFHI", 2),
    ("3EHIJK", 3),
    ("3AEHIJ", 4),
    ("3BEFIJ", 5),
    ("3EFGIJ", 6),
    ("3DEIJL", 7),
];

pub fn third_place_rank(code: &str) -> Option<usize> {
    THIRD_PLACE_RANKS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rank)| *rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Group(char),
    RoundOf32,
    RoundOf16,
    Quarterfinals,
    Semifinals,
    ThirdPlace,
    Final,
}

impl Stage {
    pub fn label(self) -> String {
        match self {
            Stage::Group(g) => format!("Group {g}"),
            Stage::RoundOf32 => "Round of 32".to_string(),
            Stage::RoundOf16 => "Round of 16".to_string(),
            Stage::Quarterfinals => "Quarterfinals".to_string(),
            Stage::Semifinals => "Semifinals".to_string(),
            Stage::ThirdPlace => "Third Place".to_string(),
            Stage::Final => "Final".to_string(),
        }
    }

    fn parse(raw: &str) -> Option<Stage> {
        if let Some(letter) = raw.strip_prefix("Group ") {
            let mut chars = letter.chars();
            let g = chars.next()?;
            if chars.next().is_none() && GROUP_LETTERS.contains(&g) {
                return Some(Stage::Group(g));
            }
            return None;
        }
        match raw {
            "Round of 32" => Some(Stage::RoundOf32),
            "Round of 16" => Some(Stage::RoundOf16),
            "Quarterfinals" => Some(Stage::Quarterfinals),
            "Semifinals" => Some(Stage::Semifinals),
            "Third Place" => Some(Stage::ThirdPlace),
            "Final" => Some(Stage::Final),
            _ => None,
        }
    }
}

/// One of a match's two team positions. Built once when the schedule is
/// loaded; the resolver never re-parses code strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamSlot {
    Literal(String),
    GroupCode { position: u8, group: char },
    ThirdPlaceCode(String),
    WinnerCode(u32),
    LoserCode(u32),
}

impl TeamSlot {
    /// Anything that matches no code pattern is a literal team name.
    pub fn parse(raw: &str) -> TeamSlot {
        let bytes = raw.as_bytes();
        if bytes.len() == 2
            && (b'1'..=b'3').contains(&bytes[0])
            && (b'A'..=b'L').contains(&bytes[1])
        {
            return TeamSlot::GroupCode {
                position: bytes[0] - b'0',
                group: bytes[1] as char,
            };
        }
        if bytes.len() >= 3
            && bytes[0] == b'3'
            && bytes[1..].iter().all(|b| (b'A'..=b'L').contains(b))
        {
            return TeamSlot::ThirdPlaceCode(raw.to_string());
        }
        if let Some(rest) = raw.strip_prefix('W') {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(match_no) = rest.parse::<u32>() {
                    return TeamSlot::WinnerCode(match_no);
                }
            }
        }
        if let Some(rest) = raw.strip_prefix('L') {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(match_no) = rest.parse::<u32>() {
                    return TeamSlot::LoserCode(match_no);
                }
            }
        }
        TeamSlot::Literal(raw.to_string())
    }

    /// Original code text, for display next to the resolved name.
    pub fn label(&self) -> String {
        match self {
            TeamSlot::Literal(name) => name.clone(),
            TeamSlot::GroupCode { position, group } => format!("{position}{group}"),
            TeamSlot::ThirdPlaceCode(code) => code.clone(),
            TeamSlot::WinnerCode(n) => format!("W{n}"),
            TeamSlot::LoserCode(n) => format!("L{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_no: u32,
    pub stage: Stage,
    pub team1: TeamSlot,
    pub team2: TeamSlot,
    pub location: String,
    pub kickoff_edt: String,
    pub kickoff_ist: String,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(rename = "MatchNo")]
    match_no: u32,
    #[serde(rename = "Stage")]
    stage: String,
    #[serde(rename = "Team1")]
    team1: String,
    #[serde(rename = "Team2")]
    team2: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "DateTimeEDT", default)]
    kickoff_edt: String,
    #[serde(rename = "DateTimeIST", default)]
    kickoff_ist: String,
}

static BUNDLED: Lazy<Schedule> = Lazy::new(|| {
    Schedule::from_json(include_str!("../data/schedule.json"))
        .expect("bundled schedule is valid")
});

/// Immutable, ordered match schedule shared by every consumer.
#[derive(Debug, Clone)]
pub struct Schedule {
    matches: Vec<MatchRecord>,
    by_number: BTreeMap<u32, usize>,
}

impl Schedule {
    pub fn from_json(raw: &str) -> Result<Schedule> {
        let rows: Vec<RawMatch> =
            serde_json::from_str(raw).context("parse schedule json")?;
        let mut matches = Vec::with_capacity(rows.len());
        for row in rows {
            let stage = Stage::parse(&row.stage)
                .with_context(|| format!("match {}: unknown stage {:?}", row.match_no, row.stage))?;
            matches.push(MatchRecord {
                match_no: row.match_no,
                stage,
                team1: TeamSlot::parse(&row.team1),
                team2: TeamSlot::parse(&row.team2),
                location: row.location,
                kickoff_edt: row.kickoff_edt,
                kickoff_ist: row.kickoff_ist,
            });
        }
        let mut by_number = BTreeMap::new();
        for (idx, m) in matches.iter().enumerate() {
            if by_number.insert(m.match_no, idx).is_some() {
                anyhow::bail!("duplicate match number {}", m.match_no);
            }
        }
        Ok(Schedule { matches, by_number })
    }

    pub fn bundled() -> &'static Schedule {
        &BUNDLED
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn match_by_number(&self, match_no: u32) -> Option<&MatchRecord> {
        self.by_number.get(&match_no).map(|idx| &self.matches[*idx])
    }

    pub fn matches_in_stage(&self, stage: Stage) -> Vec<&MatchRecord> {
        self.matches.iter().filter(|m| m.stage == stage).collect()
    }

    /// Teams drawn into a group, in first-appearance order.
    pub fn group_teams(&self, group: char) -> Vec<String> {
        let mut teams = Vec::new();
        for m in self.matches.iter().filter(|m| m.stage == Stage::Group(group)) {
            for slot in [&m.team1, &m.team2] {
                if let TeamSlot::Literal(name) = slot {
                    if !teams.contains(name) {
                        teams.push(name.clone());
                    }
                }
            }
        }
        teams
    }

    pub fn group_letters(&self) -> Vec<char> {
        let mut letters: Vec<char> = self
            .matches
            .iter()
            .filter_map(|m| match m.stage {
                Stage::Group(g) => Some(g),
                _ => None,
            })
            .collect();
        letters.sort_unstable();
        letters.dedup();
        letters
    }
}

/// Successor match in the fixed knockout topology. Both semifinal winners
/// feed the final; the third-place match takes their losers.
pub fn next_match(match_no: u32) -> Option<u32> {
    match match_no {
        73..=88 => Some(89 + (match_no - 73) / 2),
        89..=96 => Some(97 + (match_no - 89) / 2),
        97..=100 => Some(101 + (match_no - 97) / 2),
        101 | 102 => Some(FINAL_MATCH),
        _ => None,
    }
}
