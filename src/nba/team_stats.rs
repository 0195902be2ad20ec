use crate::nba::error::Result;
use crate::nba::params::StatsOption;
use crate::nba::record::Record;

use std::cmp::Ordering;
use tabled::Tabled;

pub const TEAM_ID: &str = "teamid";
pub const TEAM_CODE: &str = "teamcode";
pub const SEASON: &str = "season";

#[derive(Debug, Clone, PartialEq)]
pub struct StatSeries {
    pub title: String,
    pub x: Vec<String>,
    pub y: Vec<f64>,
}

#[derive(Tabled)]
struct StatRow {
    label: String,
    value: f64,
}

impl StatSeries {
    pub fn table(&self) -> String {
        let rows = self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(label, value)| StatRow {
                label: label.clone(),
                value: *value,
            })
            .collect::<Vec<_>>();
        tabled::Table::new(rows).to_string()
    }
}

fn metric_value(r: &Record, metric: &str) -> Result<f64> {
    Ok(r.require(metric)?.as_f64().unwrap_or(0.0))
}

/// Compare: every team in `season` ordered by `metric`.
/// Trend: `team_id` across seasons.
pub fn team_stats_series(
    records: &[Record],
    option: StatsOption,
    team_id: &str,
    metric: &str,
    season: &str,
) -> Result<StatSeries> {
    let mut points: Vec<(String, f64)> = Vec::new();
    match option {
        StatsOption::Compare => {
            for r in records.iter().filter(|r| r.matches(SEASON, season)) {
                points.push((r.require(TEAM_CODE)?.to_string(), metric_value(r, metric)?));
            }
            points.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        }
        StatsOption::Trend => {
            for r in records.iter().filter(|r| r.matches(TEAM_ID, team_id)) {
                points.push((r.require(SEASON)?.to_string(), metric_value(r, metric)?));
            }
            points.sort_by(|a, b| a.0.cmp(&b.0));
        }
    }
    let team_label = records
        .iter()
        .find(|r| r.matches(TEAM_ID, team_id))
        .and_then(|r| r.get(TEAM_CODE))
        .map(|v| v.to_string())
        .unwrap_or_else(|| team_id.to_string());
    let (x, y) = points.into_iter().unzip();
    Ok(StatSeries {
        title: format!("Team: {} | Metric: {}", team_label, metric),
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nba::error::DashError;
    use crate::nba::record::{rec, Scalar};

    fn row(team: i64, code: &str, season: &str, pts: f64) -> Record {
        rec(&[
            (TEAM_ID, Scalar::Int(team)),
            (TEAM_CODE, code.into()),
            (SEASON, season.into()),
            ("pts", Scalar::Float(pts)),
        ])
    }

    fn sample() -> Vec<Record> {
        vec![
            row(1, "GSW", "2018-19", 117.7),
            row(2, "LAL", "2018-19", 111.8),
            row(1, "GSW", "2017-18", 113.5),
            row(3, "BOS", "2018-19", 112.4),
        ]
    }

    #[test]
    fn compare_sorts_season_by_metric() {
        let s = team_stats_series(&sample(), StatsOption::Compare, "1", "pts", "2018-19").unwrap();
        assert_eq!(s.x, vec!["LAL", "BOS", "GSW"]);
        assert_eq!(s.y, vec![111.8, 112.4, 117.7]);
        assert_eq!(s.title, "Team: GSW | Metric: pts");
    }

    #[test]
    fn trend_orders_by_season() {
        let s = team_stats_series(&sample(), StatsOption::Trend, "1", "pts", "").unwrap();
        assert_eq!(s.x, vec!["2017-18", "2018-19"]);
        assert_eq!(s.y, vec![113.5, 117.7]);
        assert!(s.table().contains("2017-18"));
    }

    #[test]
    fn unknown_metric_is_reported() {
        let err = team_stats_series(&sample(), StatsOption::Trend, "1", "ast", "").unwrap_err();
        assert!(matches!(err, DashError::MissingField { column } if column == "ast"));
    }
}
