use thiserror::Error;

/// Failures raised while reshaping records or building statements.
#[derive(Error, Debug)]
pub enum DashError {
    /// A record lacks a column the operation reads.
    #[error("record is missing column `{column}`")]
    MissingField { column: String },

    /// A record in a batch disagrees with the first record's column set.
    #[error("record {row} has columns [{found}], expected [{expected}]")]
    SchemaMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    #[error("no records supplied")]
    EmptyInput,

    #[error("key-equality merge needs at least one key column")]
    NoKeyColumns,

    #[error("sqlite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl DashError {
    pub fn missing(column: &str) -> Self {
        DashError::MissingField {
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
