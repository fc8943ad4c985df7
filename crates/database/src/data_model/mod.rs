pub mod route;

pub type Result<O> = core::result::Result<O, sqlx::Error>;
