//! Offline counter helper: bumps a team's pick count in a local JSON
//! snapshot and mirrors the table into a spreadsheet. Development
//! convenience only; the app itself talks to the remote service.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::Workbook;

use wc26_bracket::counter::WinCount;

const DEFAULT_SNAPSHOT: &str = "win_counter.json";
const DEFAULT_SHEET: &str = "win_counter.xlsx";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let team = parse_value_arg(&args, "--team")
        .or_else(|| args.first().filter(|a| !a.starts_with("--")).cloned())
        .ok_or_else(|| anyhow!("usage: counter_sync <team> [--snapshot path] [--sheet path]"))?;
    let snapshot_path = parse_value_arg(&args, "--snapshot")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT));
    let sheet_path = parse_value_arg(&args, "--sheet")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SHEET));

    let mut counts = load_snapshot(&snapshot_path)?;
    match counts.iter_mut().find(|c| c.team == team) {
        Some(entry) => entry.wins += 1,
        None => counts.push(WinCount { team: team.clone(), wins: 1 }),
    }
    counts.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.team.cmp(&b.team)));

    save_snapshot(&snapshot_path, &counts)?;
    write_sheet(&sheet_path, &counts)?;

    println!("Incremented {team}");
    println!("Snapshot: {}", snapshot_path.display());
    println!("Sheet: {}", sheet_path.display());
    for c in &counts {
        println!("  {:<24} {}", c.team, c.wins);
    }
    Ok(())
}

fn parse_value_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn load_snapshot(path: &PathBuf) -> Result<Vec<WinCount>> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn save_snapshot(path: &PathBuf, counts: &[WinCount]) -> Result<()> {
    let json = serde_json::to_string_pretty(counts).context("serialize snapshot")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).context("swap snapshot")?;
    Ok(())
}

fn write_sheet(path: &PathBuf, counts: &[WinCount]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("WinCounter")?;
    sheet.write_string(0, 0, "TeamName")?;
    sheet.write_string(0, 1, "NumberOfWins")?;
    for (idx, c) in counts.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet
            .write_string(row, 0, &c.team)
            .with_context(|| format!("write cell ({row},0)"))?;
        sheet
            .write_number(row, 1, c.wins as f64)
            .with_context(|| format!("write cell ({row},1)"))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(())
}
