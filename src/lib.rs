//! Roster, shot chart and team stat reshaping for the NBA dashboards, plus
//! the bulk upsert statement builder used to load their tables.

pub mod nba;
