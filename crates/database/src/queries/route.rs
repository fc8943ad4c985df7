use model::{
    route::{RouteChanges, RouteRecord},
    user::User,
    WithId,
};
use route_shaping::{store::Result, StoreError};
use sqlx::{types::Json, Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::route::RouteRow;

use super::convert_error;

pub async fn insert<'c, E>(executor: E, record: RouteRecord) -> Result<Id<RouteRecord>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "
        INSERT INTO shape_routes(
            user_id,
            name,
            original_shape,
            snapped_route,
            directions,
            mode,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id;
        ",
    )
    .bind(record.user_id.into_raw())
    .bind(record.name)
    .bind(Json(record.route.geometry))
    .bind(Json(record.route.snapped))
    .bind(Json(record.route.directions))
    .bind(record.route.mode.to_string())
    .bind(record.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|id: i64| Id::new(id))
}

pub async fn get_by_user<'c, E>(
    executor: E,
    user: &Id<User>,
) -> Result<Vec<WithId<RouteRecord>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id,
            user_id,
            name,
            original_shape,
            snapped_route,
            directions,
            mode,
            created_at
        FROM
            shape_routes
        WHERE
            user_id = $1
        ORDER BY
            created_at ASC,
            id ASC;
        ",
    )
    .bind(user.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .into_iter()
    .map(|row: RouteRow| row.to_model())
    .collect::<Vec<_>>()
    .let_owned(Ok)
}

pub async fn get<'c, E>(
    executor: E,
    user: &Id<User>,
    id: &Id<RouteRecord>,
) -> Result<WithId<RouteRecord>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id,
            user_id,
            name,
            original_shape,
            snapped_route,
            directions,
            mode,
            created_at
        FROM
            shape_routes
        WHERE
            id = $1 AND user_id = $2;
        ",
    )
    .bind(id.raw())
    .bind(user.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: RouteRow| row.to_model())
}

pub async fn update<'c, E>(
    executor: E,
    user: &Id<User>,
    id: &Id<RouteRecord>,
    changes: RouteChanges,
) -> Result<WithId<RouteRecord>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        UPDATE shape_routes SET
            name = COALESCE($3, name),
            mode = COALESCE($4, mode),
            original_shape = COALESCE($5, original_shape),
            snapped_route = COALESCE($6, snapped_route),
            directions = COALESCE($7, directions)
        WHERE
            id = $1 AND user_id = $2
        RETURNING
            id,
            user_id,
            name,
            original_shape,
            snapped_route,
            directions,
            mode,
            created_at;
        ",
    )
    .bind(id.raw())
    .bind(user.raw())
    .bind(changes.name)
    .bind(changes.mode.map(|mode| mode.to_string()))
    .bind(changes.geometry.map(Json))
    .bind(changes.snapped.map(Json))
    .bind(changes.directions.map(Json))
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: RouteRow| row.to_model())
}

pub async fn delete<'c, E>(
    executor: E,
    user: &Id<User>,
    id: &Id<RouteRecord>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM shape_routes WHERE id = $1 AND user_id = $2;")
        .bind(id.raw())
        .bind(user.raw())
        .execute(executor)
        .await
        .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}
