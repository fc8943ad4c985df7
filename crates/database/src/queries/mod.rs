use route_shaping::StoreError;

pub mod route;

/// Postgres error code of a missing relation.
const UNDEFINED_TABLE: &str = "42P01";

pub(crate) fn convert_error(why: sqlx::Error) -> StoreError {
    match why {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
            StoreError::NotFound
        }
        _ => StoreError::other(why),
    }
}
