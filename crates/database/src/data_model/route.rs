use chrono::{DateTime, Utc};
use model::{
    coordinate::Coordinate,
    route::{DirectionStep, RouteRecord, SnappedRoute, TravelMode},
    WithId,
};
use sqlx::{prelude::FromRow, types::Json};
use utility::id::Id;

#[derive(Debug, Clone, FromRow)]
pub struct RouteRow {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub original_shape: Json<Vec<Coordinate>>,
    pub snapped_route: Json<Vec<Coordinate>>,
    pub directions: Json<Vec<DirectionStep>>,
    pub mode: String,
    pub created_at: DateTime<Utc>,
}

impl RouteRow {
    pub fn to_model(self) -> WithId<RouteRecord> {
        WithId::new(
            Id::new(self.id),
            RouteRecord {
                user_id: Id::new(self.user_id),
                name: self.name,
                created_at: self.created_at,
                route: SnappedRoute {
                    geometry: self.original_shape.0,
                    snapped: self.snapped_route.0,
                    directions: self.directions.0,
                    mode: TravelMode::new(self.mode),
                },
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use model::ExampleData;

    use super::*;

    #[test]
    fn rows_become_records() {
        let example = RouteRecord::example_data();
        let row = RouteRow {
            id: 12,
            user_id: example.user_id.raw(),
            name: example.name.clone(),
            original_shape: Json(example.route.geometry.clone()),
            snapped_route: Json(example.route.snapped.clone()),
            directions: Json(example.route.directions.clone()),
            mode: "foot-walking".to_owned(),
            created_at: Utc.with_ymd_and_hms(2024, 8, 1, 7, 30, 0).unwrap(),
        };

        let record = row.to_model();
        assert_eq!(record.id, Id::new(12));
        assert_eq!(record.content, example);
    }
}
