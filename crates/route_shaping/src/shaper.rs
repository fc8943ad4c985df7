use chrono::Utc;
use model::{
    coordinate::{path_length_km, Coordinate},
    route::{DirectionStep, RouteChanges, RoutePatch, RouteRecord, SnappedRoute, TravelMode},
    shape::{ShapeInput, ShapeRequest, ShapeSource},
    user::User,
    ExampleData, WithId,
};
use schemars::JsonSchema;
use serde::Serialize;
use utility::id::Id;

use crate::{
    generator,
    snapper::{self, RoutingProvider, Snapped},
    store::{not_found_to_default, RouteStore},
    validate, waypoints, ShapingError, ShapingResult,
};

/// A snapped route as handed out to clients.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ShapedRoute {
    pub original_shape: Vec<Coordinate>,
    pub snapped: Vec<Coordinate>,
    pub directions: Vec<DirectionStep>,
    pub mode: TravelMode,
    pub export_url: Option<String>,
    pub length_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_id: Option<Id<RouteRecord>>,
}

impl ShapedRoute {
    pub fn new(route: SnappedRoute, shape_id: Option<Id<RouteRecord>>) -> Self {
        Self {
            export_url: waypoints::to_map_link(&route.snapped),
            length_km: path_length_km(&route.snapped),
            original_shape: route.geometry,
            snapped: route.snapped,
            directions: route.directions,
            mode: route.mode,
            shape_id,
        }
    }
}

/// A stored route with its freshly derived map link.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct StoredRoute {
    pub id: Id<RouteRecord>,
    #[serde(flatten)]
    pub record: RouteRecord,
    pub export_url: Option<String>,
    pub length_km: f64,
}

impl From<WithId<RouteRecord>> for StoredRoute {
    fn from(value: WithId<RouteRecord>) -> Self {
        Self {
            export_url: waypoints::to_map_link(&value.content.route.snapped),
            length_km: path_length_km(&value.content.route.snapped),
            id: value.id,
            record: value.content,
        }
    }
}

impl ExampleData for StoredRoute {
    fn example_data() -> Self {
        WithId::new(Id::new(1), RouteRecord::example_data()).into()
    }
}

/// Runs shape requests through generation, snapping and storage.
///
/// Holds no state besides its collaborators, so clones are cheap when they
/// are and requests can run concurrently.
#[derive(Debug, Clone)]
pub struct RouteShaper<P, S> {
    provider: P,
    store: S,
}

impl<P, S> RouteShaper<P, S>
where
    P: RoutingProvider,
    S: RouteStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    /// The path to snap: the given geometry, or the generated shape.
    pub fn resolve(request: &ShapeRequest) -> Vec<Coordinate> {
        match &request.source {
            ShapeSource::Geometry(path) => path.clone(),
            ShapeSource::Generated {
                start,
                shape,
                distance_m,
            } => generator::generate(*shape, *start, *distance_m),
        }
    }

    async fn snap_request(&self, request: ShapeRequest) -> ShapingResult<SnappedRoute> {
        let geometry = Self::resolve(&request);
        let Snapped {
            snapped,
            directions,
        } = snapper::snap(&self.provider, &geometry, &request.mode)
            .await
            .map_err(|why| {
                log::warn!("snapping {} points failed: {}", geometry.len(), why);
                ShapingError::Upstream(why)
            })?;
        log::info!(
            "snapped {} points to {} points ({}, {} steps)",
            geometry.len(),
            snapped.len(),
            request.mode,
            directions.len()
        );
        Ok(SnappedRoute {
            geometry,
            snapped,
            directions,
            mode: request.mode,
        })
    }

    /// Snaps without storing anything.
    pub async fn snap(&self, input: &ShapeInput) -> ShapingResult<ShapedRoute> {
        let request = validate::shape_request(input)?;
        let route = self.snap_request(request).await?;
        Ok(ShapedRoute::new(route, None))
    }

    /// Snaps and stores the route for `user`. A route that comes with its
    /// `snapped_route` is stored as is.
    pub async fn snap_and_save(
        &self,
        user: &Id<User>,
        input: &ShapeInput,
    ) -> ShapingResult<ShapedRoute> {
        let request = validate::shape_request(input)?;
        let presnapped = validate::presnapped(input)?;
        let name = validate::name(input.name.as_deref())?;

        let route = match (request, presnapped) {
            (
                ShapeRequest {
                    source: ShapeSource::Geometry(geometry),
                    mode,
                },
                Some(snapped),
            ) => SnappedRoute {
                geometry,
                snapped,
                directions: vec![],
                mode,
            },
            (request, _) => self.snap_request(request).await?,
        };

        let record = RouteRecord {
            user_id: user.clone(),
            name,
            created_at: Utc::now(),
            route: route.clone(),
        };
        match self.store.insert(record).await {
            Ok(id) => {
                log::info!("saved route {} of user {}", id, user);
                Ok(ShapedRoute::new(route, Some(id)))
            }
            Err(cause) => {
                log::error!("could not save route of user {}: {}", user, cause);
                Err(ShapingError::NotSaved {
                    route: Box::new(ShapedRoute::new(route, None)),
                    cause,
                })
            }
        }
    }

    pub async fn routes(&self, user: &Id<User>) -> ShapingResult<Vec<StoredRoute>> {
        Ok(not_found_to_default(self.store.find_by_user(user).await)?
            .into_iter()
            .map(StoredRoute::from)
            .collect())
    }

    pub async fn route(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
    ) -> ShapingResult<StoredRoute> {
        Ok(self.store.find(user, id).await?.into())
    }

    /// Renames a route or changes its travel mode. The stored paths are kept.
    pub async fn patch(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        patch: &RoutePatch,
    ) -> ShapingResult<StoredRoute> {
        let name = validate::name(patch.name.as_deref())?;
        let mode = match patch.mode.as_deref() {
            Some(mode) => Some(validate::travel_mode(Some(mode))?),
            None => None,
        };
        let changes = RouteChanges::patch(name, mode);
        if changes.is_empty() {
            return Err(ShapingError::bad_request(
                "name",
                "Nothing to update, provide 'name' and/or 'mode'.",
            ));
        }
        Ok(self.store.update(user, id, changes).await?.into())
    }

    /// Snaps a new path and stores it over an existing route.
    pub async fn replace(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        input: &ShapeInput,
    ) -> ShapingResult<StoredRoute> {
        let request = validate::shape_request(input)?;
        let name = validate::name(input.name.as_deref())?;

        // fail before asking the provider about a route that is not there
        self.store.find(user, id).await?;

        let route = self.snap_request(request).await?;
        match self
            .store
            .update(user, id, RouteChanges::replace(name, route.clone()))
            .await
        {
            Ok(updated) => {
                log::info!("replaced route {} of user {}", id, user);
                Ok(updated.into())
            }
            Err(cause) => {
                log::error!("could not replace route {} of user {}: {}", id, user, cause);
                Err(ShapingError::NotSaved {
                    route: Box::new(ShapedRoute::new(route, Some(id.clone()))),
                    cause,
                })
            }
        }
    }

    pub async fn delete(&self, user: &Id<User>, id: &Id<RouteRecord>) -> ShapingResult<()> {
        self.store.delete(user, id).await?;
        log::info!("deleted route {} of user {}", id, user);
        Ok(())
    }
}
