use nbadash::nba::db::{fetch_json_records, QueryExecutor, SqliteStore};
use nbadash::nba::error::DashError;
use nbadash::nba::params::{RosterView, Season, StatsOption};
use nbadash::nba::record::{dedup_records, records_from_json, Record, Scalar};
use nbadash::nba::upsert::{Dialect, UpsertBuilder};
use nbadash::nba::{queries, roster, shots::ShotChart, team_stats};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct NBACli {
    /// SQLite database holding the dashboard tables
    #[clap(long, env = "NBA_DASH_DB", default_value = "nba_dash.db", global = true)]
    db: String,

    #[clap(subcommand)]
    cmd: Commands
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Current roster, one column per position or per team
    Roster {
        #[clap(short, long, required = false)]
        team_id: Option<String>,

        #[clap(short, long, arg_enum, default_value = "position")]
        view: RosterView,
    },
    /// Team codes grouped by division
    Teams {
        #[clap(short, long)]
        conference: Option<String>,
    },
    Player {
        player_id: String,

        #[clap(short, long)]
        open_image: bool,
    },
    Shots {
        player_id: String,
    },
    TeamStats {
        team_id: String,

        #[clap(short, long, arg_enum, default_value = "compare")]
        option: StatsOption,

        #[clap(short, long, default_value = "pts")]
        metric: String,

        #[clap(short, long)]
        season: Option<String>,
    },
    /// Print (or run against the local db) an upsert for a JSON records file
    Upsert {
        table: String,

        file: String,

        #[clap(short, long, required = true)]
        keys: Vec<String>,

        /// Statement dialect to print: mssql (default) or sqlite
        #[clap(short, long)]
        dialect: Option<Dialect>,

        /// Run against the local SQLite db instead of printing; only the sqlite dialect applies
        #[clap(short, long)]
        execute: bool,
    },
    /// Load JSON records from a file or url into a table
    Import {
        table: String,

        #[clap(short, long, required_unless_present = "url")]
        file: Option<String>,

        #[clap(short, long)]
        url: Option<String>,

        #[clap(short, long)]
        keys: Vec<String>,
    },
    Search {
        table: String,

        keyword: String,

        #[clap(short, long)]
        select: Vec<String>,

        #[clap(short = 'c', long, required = true)]
        columns: Vec<String>,

        #[clap(short, long)]
        json: bool,
    },
}

#[derive(Tabled)]
struct CardRow {
    metric: String,
    value: String,
}

fn read_records(file: &str) -> Result<Vec<Record>> {
    let data = std::fs::read_to_string(file)?;
    Ok(records_from_json(&data)?)
}

/// `--execute` runs against SQLite, so an explicit mssql dialect cannot apply.
fn check_execute_dialect(dialect: Option<Dialect>) -> Result<()> {
    match dialect {
        Some(Dialect::MsSql) => bail!("--execute runs against the local SQLite db; drop --dialect mssql"),
        _ => Ok(()),
    }
}

fn print_records(records: &[Record]) {
    for r in records {
        let line = r
            .columns()
            .zip(r.values())
            .map(|(c, v)| format!("{} : {}", c, v))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}", line);
    }
}

fn run(args: NBACli) -> Result<()> {
    let store = SqliteStore::open(&args.db)?;
    match args.cmd {
        Commands::Roster { team_id, view } => {
            let rosters = store.fetch(queries::TEAM_ROSTER_QUERY, &[])?;
            let table = match view {
                RosterView::Position => roster::roster_by_position(&rosters, team_id.as_deref())?,
                RosterView::Team => roster::roster_by_team(&roster::roster_stats(&rosters, team_id.as_deref()))?,
            };
            if table.is_empty() {
                println!("No players found");
            } else {
                println!("roster by {}\n{}", view, table.to_dataframe()?);
            }
        }
        Commands::Teams { conference } => {
            let teams = store.fetch(queries::TEAM_QUERY, &[])?;
            let table = roster::teams_by_division(&teams, conference.as_deref())?;
            if table.is_empty() {
                println!("No teams found");
            } else {
                println!("teams by division\n{}", table.to_dataframe()?);
            }
        }
        Commands::Player { player_id, open_image } => {
            let rosters = store.fetch(queries::TEAM_ROSTER_QUERY, &[])?;
            let (img, name) = roster::player_image(&rosters, &player_id);
            let card = roster::player_card(&rosters, &player_id)?
                .into_iter()
                .map(|(metric, value)| CardRow { metric, value })
                .collect::<Vec<_>>();
            println!("{}", name);
            println!("{}", Table::new(card).to_string());
            if open_image {
                webbrowser::open(&img)?;
            }
            println!("{}", img);
        }
        Commands::Shots { player_id } => {
            let shot_rows = store.fetch(queries::SHOT_CHART_QUERY, &[Scalar::Text(player_id)])?;
            let chart = ShotChart::from_records(&shot_rows)?;
            println!("Made & Missed Shots");
            println!("{}", Table::new(chart.summary()).to_string());
            if let Some(pct) = chart.field_goal_pct() {
                println!("FG%: {:.1}", pct);
            }
        }
        Commands::TeamStats { team_id, option, metric, season } => {
            let season = season.map(Season::from).unwrap_or_default();
            let stats = store.fetch(queries::TEAM_SEASON_STATS_QUERY, &[])?;
            let series = team_stats::team_stats_series(&stats, option, &team_id, &metric, &season.to_string())?;
            println!("{} ({})", series.title, option);
            println!("{}", series.table());
        }
        Commands::Upsert { table, file, keys, dialect, execute } => {
            let records = dedup_records(read_records(&file)?);
            let key_columns: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
            if execute {
                check_execute_dialect(dialect)?;
                store.create_table(&table, &records)?;
                let n = store.upsert(&table, &records, &key_columns)?;
                println!("Table {} updated: {} records", table, n);
            } else {
                let stmt = UpsertBuilder::new(&table, &key_columns).dialect(dialect.unwrap_or_default()).build(&records)?;
                println!("{}", stmt);
            }
        }
        Commands::Import { table, file, url, keys } => {
            let records = match (file, url) {
                (Some(f), _) => read_records(&f)?,
                (None, Some(u)) => fetch_json_records(&u)?,
                (None, None) => bail!("either --file or --url is required"),
            };
            let records = dedup_records(records);
            store.create_table(&table, &records)?;
            let n = if keys.is_empty() {
                store.insert_records(&table, &records)?
            } else {
                let key_columns: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
                store.upsert(&table, &records, &key_columns)?
            };
            println!("Table {} updated: {} records", table, n);
        }
        Commands::Search { table, keyword, select, columns, json } => {
            let select: Vec<&str> = select.iter().map(|c| c.as_str()).collect();
            let columns: Vec<&str> = columns.iter().map(|c| c.as_str()).collect();
            let res = store.search_table(&table, &select, &columns, &keyword)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                print_records(&res);
            }
        }
    }
    Ok(())
}

fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DashError>() {
        Some(DashError::MissingField { column }) => format!("The data has no `{}` column.", column),
        Some(DashError::SchemaMismatch { row, expected, found }) => format!(
            "Record {} does not match the others: expected [{}], found [{}].",
            row, expected, found
        ),
        Some(DashError::EmptyInput) => "No records to work with.".to_string(),
        _ => format!("{:#}", err),
    }
}

fn main() {
    pretty_env_logger::init();
    let args = NBACli::parse();
    log::debug!("{:?}", args);
    if let Err(e) = run(args) {
        log::error!("{:?}", e);
        eprintln!("{}", describe(&e));
        std::process::exit(1);
    }
}
