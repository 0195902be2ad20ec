pub const TEAM_ROSTER_QUERY: &str = "SELECT * FROM rosters";

pub const TEAM_QUERY: &str = "SELECT * FROM teams ORDER BY Division, TeamCode";

pub const SHOT_CHART_QUERY: &str =
    "SELECT PlayerId, GameId, EType, LocationX, LocationY FROM shots WHERE PlayerId = ?1";

pub const TEAM_SEASON_STATS_QUERY: &str = "SELECT * FROM team_season_stats";
