use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use model::{
    route::{RouteChanges, RouteRecord},
    user::User,
    WithId,
};
use tokio::sync::RwLock;
use utility::id::Id;

use crate::store::{Result, RouteStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    routes: BTreeMap<i64, RouteRecord>,
}

/// A process local store, used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn insert(&self, record: RouteRecord) -> Result<Id<RouteRecord>> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let id = state.last_id;
        state.routes.insert(id, record);
        Ok(Id::new(id))
    }

    async fn find_by_user(&self, user: &Id<User>) -> Result<Vec<WithId<RouteRecord>>> {
        let state = self.state.read().await;
        Ok(state
            .routes
            .iter()
            .filter(|(_, record)| &record.user_id == user)
            .map(|(id, record)| WithId::new(Id::new(*id), record.clone()))
            .collect())
    }

    async fn find(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
    ) -> Result<WithId<RouteRecord>> {
        let state = self.state.read().await;
        state
            .routes
            .get(&id.raw())
            .filter(|record| &record.user_id == user)
            .map(|record| WithId::new(id.clone(), record.clone()))
            .ok_or(StoreError::NotFound)
    }

    async fn update(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        changes: RouteChanges,
    ) -> Result<WithId<RouteRecord>> {
        let mut state = self.state.write().await;
        let record = state
            .routes
            .get_mut(&id.raw())
            .filter(|record| &record.user_id == user)
            .ok_or(StoreError::NotFound)?;
        record.apply(changes);
        Ok(WithId::new(id.clone(), record.clone()))
    }

    async fn delete(&self, user: &Id<User>, id: &Id<RouteRecord>) -> Result<()> {
        let mut state = self.state.write().await;
        let owned = state
            .routes
            .get(&id.raw())
            .is_some_and(|record| &record.user_id == user);
        if !owned {
            return Err(StoreError::NotFound);
        }
        state.routes.remove(&id.raw());
        Ok(())
    }
}
