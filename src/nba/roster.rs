use crate::nba::error::Result;
use crate::nba::pivot::{pivot, GroupTable};
use crate::nba::record::Record;

pub const TEAM_ID: &str = "TeamId";
pub const PLAYER_ID: &str = "PlayerId";
pub const POSITION: &str = "Position";
pub const PLAYER_NAME: &str = "Player";
pub const PLAYER_IMG: &str = "PlayerImg";
pub const DIVISION: &str = "Division";
pub const CONFERENCE: &str = "Conference";
pub const TEAM_CODE: &str = "TeamCode";

pub const DEFAULT_IMAGE: &str = "https://cdn.nba.com/headshots/nba/latest/1040x760/fallback.png";
pub const MISSING_NAME: &str = "Name Missing";

pub const CARD_METRICS: [&str; 7] = [
    "Height",
    "Weight",
    "Position",
    "DoB",
    "Age",
    "Experience",
    "School",
];

/// Rows belonging to `team_id`, or every row when no team is given.
pub fn roster_stats(records: &[Record], team_id: Option<&str>) -> Vec<Record> {
    match team_id {
        Some(team) => records
            .iter()
            .filter(|r| r.matches(TEAM_ID, team))
            .cloned()
            .collect(),
        None => records.to_vec(),
    }
}

/// Player ids laid out one column per position.
pub fn roster_by_position(records: &[Record], team_id: Option<&str>) -> Result<GroupTable> {
    let team_rows = roster_stats(records, team_id);
    pivot(&team_rows, POSITION, PLAYER_ID)
}

/// Player ids laid out one column per team.
pub fn roster_by_team(records: &[Record]) -> Result<GroupTable> {
    pivot(records, TEAM_ID, PLAYER_ID)
}

/// Team codes laid out one column per division, optionally for one conference.
/// Rows without a team code are skipped.
pub fn teams_by_division(teams: &[Record], conference: Option<&str>) -> Result<GroupTable> {
    let selected = teams
        .iter()
        .filter(|r| conference.map_or(true, |c| r.matches(CONFERENCE, c)))
        .filter(|r| r.get(TEAM_CODE).map_or(true, |v| !v.is_null()))
        .cloned()
        .collect::<Vec<_>>();
    pivot(&selected, DIVISION, TEAM_CODE)
}

/// Bio metrics of a player, read from the last row carrying their id.
pub fn player_card(records: &[Record], player_id: &str) -> Result<Vec<(String, String)>> {
    let latest = match records.iter().rev().find(|r| r.matches(PLAYER_ID, player_id)) {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };
    CARD_METRICS
        .iter()
        .map(|&metric| Ok((metric.to_string(), latest.require(metric)?.to_string())))
        .collect()
}

/// Headshot url and display name for a player, with fallbacks.
pub fn player_image(records: &[Record], player_id: &str) -> (String, String) {
    let first = records.iter().find(|r| r.matches(PLAYER_ID, player_id));
    let field = |column: &str, fallback: &str| {
        first
            .and_then(|r| r.get(column))
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .unwrap_or_else(|| fallback.to_string())
    };
    (field(PLAYER_IMG, DEFAULT_IMAGE), field(PLAYER_NAME, MISSING_NAME))
}
