use std::{env, error::Error};

use async_trait::async_trait;
use model::{
    route::{RouteChanges, RouteRecord},
    user::User,
    WithId,
};
use route_shaping::{store::Result, RouteStore};
use utility::id::Id;

pub mod data_model;
pub mod queries;

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    pub(self) fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// Route storage in PostgreSQL.
#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
}

impl PgDatabase {
    pub async fn connect(
        database_connection_info: DatabaseConnectionInfo,
    ) -> std::result::Result<Self, Box<dyn Error>> {
        let hostname = database_connection_info.hostname.clone();
        let url = database_connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("connected to database at {hostname}, migrations applied.");

        Ok(Self { connection: pool })
    }
}

#[async_trait]
impl RouteStore for PgDatabase {
    async fn insert(&self, record: RouteRecord) -> Result<Id<RouteRecord>> {
        queries::route::insert(&self.connection, record).await
    }

    async fn find_by_user(&self, user: &Id<User>) -> Result<Vec<WithId<RouteRecord>>> {
        queries::route::get_by_user(&self.connection, user).await
    }

    async fn find(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
    ) -> Result<WithId<RouteRecord>> {
        queries::route::get(&self.connection, user, id).await
    }

    async fn update(
        &self,
        user: &Id<User>,
        id: &Id<RouteRecord>,
        changes: RouteChanges,
    ) -> Result<WithId<RouteRecord>> {
        queries::route::update(&self.connection, user, id, changes).await
    }

    async fn delete(&self, user: &Id<User>, id: &Id<RouteRecord>) -> Result<()> {
        queries::route::delete(&self.connection, user, id).await
    }
}
