    use core::fmt;
    use std::fmt::Display;
    use clap::ArgEnum;
    use chrono::{Datelike, NaiveDate};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
    pub enum RosterView {
        Position,
        Team,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
    pub enum StatsOption {
        Compare,
        Trend,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Season(pub String);

    impl Display for Season {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Display for RosterView {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                RosterView::Position => write!(f, "position"),
                RosterView::Team => write!(f, "team"),
            }
        }
    }

    impl Display for StatsOption {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                StatsOption::Compare => write!(f, "Compare"),
                StatsOption::Trend => write!(f, "Trend"),
            }
        }
    }

    impl Season {
        /// Seasons tip off in October, so from then on the date belongs to
        /// the season that ends next year.
        pub fn for_date(date: NaiveDate) -> Self {
            let start = if date.month() >= 10 { date.year() } else { date.year() - 1 };
            Season(format!("{}-{:02}", start, (start + 1) % 100))
        }
    }

    impl Default for Season {
        fn default() -> Self {
            Season::for_date(chrono::Utc::now().naive_utc().date())
        }
    }

    impl From<String> for Season {
        fn from(s: String) -> Self {
            Season(s)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn october_starts_the_new_season() {
            let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
            assert_eq!(Season::for_date(date), Season("2026-27".to_string()));
        }

        #[test]
        fn january_belongs_to_the_running_season() {
            let date = NaiveDate::from_ymd_opt(2027, 1, 5).unwrap();
            assert_eq!(Season::for_date(date).to_string(), "2026-27");
            let date = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
            assert_eq!(Season::for_date(date).to_string(), "2025-26");
        }

        #[test]
        fn century_rollover_keeps_two_digits() {
            let date = NaiveDate::from_ymd_opt(2099, 11, 1).unwrap();
            assert_eq!(Season::for_date(date).to_string(), "2099-00");
        }
    }
