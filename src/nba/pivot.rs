use crate::nba::error::Result;
use crate::nba::record::{Record, Scalar};

use anyhow::Context;
use indexmap::IndexMap;
use polars::prelude::*;

/// Placeholder for cells below the end of a shorter bucket.
pub const PAD: &str = "";

/// Records bucketed by a group column. Buckets keep first-seen order and
/// members keep encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupTable {
    buckets: IndexMap<String, Vec<Scalar>>,
}

impl GroupTable {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(|k| k.as_str())
    }

    pub fn column(&self, key: &str) -> Option<&[Scalar]> {
        self.buckets.get(key).map(|v| v.as_slice())
    }

    pub fn width(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest bucket.
    pub fn height(&self) -> usize {
        self.buckets.values().map(|v| v.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// A bucket rendered as text and padded to `height()`.
    pub fn padded_column(&self, key: &str) -> Option<Vec<String>> {
        let height = self.height();
        self.buckets.get(key).map(|members| {
            let mut cells: Vec<String> = members.iter().map(|m| m.to_string()).collect();
            cells.resize(height, PAD.to_string());
            cells
        })
    }

    /// Row-major view; every row has `width()` cells.
    pub fn rows(&self) -> Vec<Vec<String>> {
        (0..self.height())
            .map(|i| {
                self.buckets
                    .values()
                    .map(|members| members.get(i).map(|m| m.to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn to_dataframe(&self) -> anyhow::Result<DataFrame> {
        let mut df_series: Vec<Series> = Vec::with_capacity(self.width());
        for key in self.columns() {
            let cells = self.padded_column(key).unwrap_or_default();
            df_series.push(Series::new(key, cells));
        }
        DataFrame::new(df_series).context("building group table frame")
    }
}

/// Buckets `value` by `group_by` in a single pass over `records`.
pub fn pivot(records: &[Record], group_by: &str, value: &str) -> Result<GroupTable> {
    let mut buckets: IndexMap<String, Vec<Scalar>> = IndexMap::new();
    for r in records {
        let key = r.require(group_by)?.to_string();
        let member = r.require(value)?.clone();
        buckets.entry(key).or_insert_with(Vec::new).push(member);
    }
    log::debug!(
        "pivoted {} records on {} into {} columns",
        records.len(),
        group_by,
        buckets.len()
    );
    Ok(GroupTable { buckets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nba::error::DashError;
    use crate::nba::record::rec;

    fn team_player(team: &str, player: i64) -> Record {
        rec(&[("team", team.into()), ("player", Scalar::Int(player))])
    }

    #[test]
    fn pads_short_buckets_with_empty_text() {
        let records = vec![team_player("X", 1), team_player("X", 2), team_player("Y", 3)];
        let table = pivot(&records, "team", "player").unwrap();
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["X", "Y"]);
        assert_eq!(table.padded_column("X").unwrap(), vec!["1", "2"]);
        assert_eq!(table.padded_column("Y").unwrap(), vec!["3", ""]);
        assert_eq!(
            table.rows(),
            vec![vec!["1".to_string(), "3".to_string()], vec!["2".to_string(), String::new()]]
        );
    }

    #[test]
    fn keeps_encounter_order_within_bucket() {
        let records = vec![
            team_player("B", 9),
            team_player("A", 4),
            team_player("B", 7),
            team_player("A", 1),
            team_player("B", 8),
        ];
        let table = pivot(&records, "team", "player").unwrap();
        assert_eq!(table.columns().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(
            table.column("B").unwrap(),
            &[Scalar::Int(9), Scalar::Int(7), Scalar::Int(8)]
        );
        assert_eq!(table.column("A").unwrap(), &[Scalar::Int(4), Scalar::Int(1)]);
        assert_eq!(table.height(), 3);
        for key in ["A", "B"].iter() {
            assert_eq!(table.padded_column(key).unwrap().len(), 3);
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = pivot(&[], "team", "player").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.height(), 0);
        assert!(table.rows().is_empty());
    }

    #[test]
    fn missing_group_column_is_reported() {
        let records = vec![team_player("X", 1), rec(&[("player", Scalar::Int(2))])];
        match pivot(&records, "team", "player") {
            Err(DashError::MissingField { column }) => assert_eq!(column, "team"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn frame_has_one_column_per_group() {
        let records = vec![team_player("X", 1), team_player("X", 2), team_player("Y", 3)];
        let df = pivot(&records, "team", "player").unwrap().to_dataframe().unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 2);
    }
}
