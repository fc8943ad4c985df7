use std::{error, fmt, result, sync::Arc};

use async_trait::async_trait;
use model::{
    route::{RouteChanges, RouteRecord},
    user::User,
    WithId,
};
use utility::id::Id;

#[derive(Debug)]
pub enum StoreError {
    /// The route does not exist or belongs to someone else.
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl StoreError {
    pub fn other<T: error::Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "route not found"),
            Self::Other(why) => write!(f, "{why}"),
        }
    }
}

pub type Result<T> = result::Result<T, StoreError>;

/// Persistence of route records. Every operation is scoped to the owning user,
/// records of other users behave as if they did not exist.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Stores a new record and returns its id.
    async fn insert(&self, record: RouteRecord) -> Result<Id<RouteRecord>>;

    async fn find_by_user(&self, user: &Id<User>) -> Result<Vec<WithId<RouteRecord>>>;

    async fn find(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
    ) -> Result<WithId<RouteRecord>>;

    async fn update(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        changes: RouteChanges,
    ) -> Result<WithId<RouteRecord>>;

    async fn delete(&self, user: &Id<User>, id: &Id<RouteRecord>) -> Result<()>;
}

#[async_trait]
impl<T> RouteStore for Arc<T>
where
    T: RouteStore + ?Sized,
{
    async fn insert(&self, record: RouteRecord) -> Result<Id<RouteRecord>> {
        (**self).insert(record).await
    }

    async fn find_by_user(&self, user: &Id<User>) -> Result<Vec<WithId<RouteRecord>>> {
        (**self).find_by_user(user).await
    }

    async fn find(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
    ) -> Result<WithId<RouteRecord>> {
        (**self).find(user, id).await
    }

    async fn update(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        changes: RouteChanges,
    ) -> Result<WithId<RouteRecord>> {
        (**self).update(user, id, changes).await
    }

    async fn delete(&self, user: &Id<User>, id: &Id<RouteRecord>) -> Result<()> {
        (**self).delete(user, id).await
    }
}

/// Treats a missing collection as an empty one.
pub fn not_found_to_default<O: Default>(result: Result<O>) -> Result<O> {
    match result {
        Err(StoreError::NotFound) => Ok(O::default()),
        result => result,
    }
}
