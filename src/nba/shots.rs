use crate::nba::error::Result;
use crate::nba::record::Record;

use tabled::Tabled;

pub const ETYPE: &str = "EType";
pub const LOCATION_X: &str = "LocationX";
pub const LOCATION_Y: &str = "LocationY";

const MADE_SHOT: i64 = 1;
const MISSED_SHOT: i64 = 2;

/// Half-court plot bounds, in tenths of a foot from the rim.
pub const X_RANGE: (f64, f64) = (-300.0, 300.0);
pub const Y_RANGE: (f64, f64) = (-100.0, 500.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotPoint {
    pub x: f64,
    pub y: f64,
}

impl ShotPoint {
    pub fn in_court(&self) -> bool {
        self.x >= X_RANGE.0 && self.x <= X_RANGE.1 && self.y >= Y_RANGE.0 && self.y <= Y_RANGE.1
    }
}

#[derive(Tabled)]
pub struct ShotSummary {
    series: String,
    attempts: usize,
    on_court: usize,
    share: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShotChart {
    pub made: Vec<ShotPoint>,
    pub missed: Vec<ShotPoint>,
}

impl ShotChart {
    /// Splits shot events into made and missed points. Other event types are skipped.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut chart = ShotChart::default();
        for r in records {
            let etype = r.require(ETYPE)?.as_f64().map(|v| v as i64);
            let point = ShotPoint {
                x: r.require(LOCATION_X)?.as_f64().unwrap_or(0.0),
                y: r.require(LOCATION_Y)?.as_f64().unwrap_or(0.0),
            };
            match etype {
                Some(MADE_SHOT) => chart.made.push(point),
                Some(MISSED_SHOT) => chart.missed.push(point),
                _ => {}
            }
        }
        Ok(chart)
    }

    pub fn attempts(&self) -> usize {
        self.made.len() + self.missed.len()
    }

    pub fn field_goal_pct(&self) -> Option<f64> {
        match self.attempts() {
            0 => None,
            n => Some(self.made.len() as f64 / n as f64 * 100.0),
        }
    }

    pub fn summary(&self) -> Vec<ShotSummary> {
        let row = |series: &str, points: &[ShotPoint]| ShotSummary {
            series: series.to_string(),
            attempts: points.len(),
            on_court: points.iter().filter(|p| p.in_court()).count(),
            share: match self.attempts() {
                0 => "-".to_string(),
                n => format!("{:.1}%", points.len() as f64 / n as f64 * 100.0),
            },
        };
        vec![row("Made Shot", &self.made[..]), row("Missed Shot", &self.missed[..])]
    }
}
