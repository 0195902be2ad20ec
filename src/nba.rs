pub mod db;
pub mod error;
pub mod params;
pub mod pivot;
pub mod queries;
pub mod record;
pub mod roster;
pub mod shots;
pub mod team_stats;
pub mod upsert;
