//! Shared helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;
use uuid::Uuid;

/// Environment variable naming the test server.
pub const DATABASE_URL_ENV: &str = "ARCHWARDEN_TEST_DATABASE_URL";

/// Migrations in application order.
pub const MIGRATIONS: [&str; 3] = [
    include_str!("../../migrations/2026-10-01-000000_create_registry_tables/up.sql"),
    include_str!("../../migrations/2026-10-01-000001_create_task_tables/up.sql"),
    include_str!("../../migrations/2026-10-01-000002_create_governance_tables/up.sql"),
];

/// Pool type shared by every adapter.
pub type TestPool = Pool<ConnectionManager<PgConnection>>;

/// Provides a [`DefaultClock`] for test fixtures.
#[fixture]
pub fn clock() -> DefaultClock {
    DefaultClock
}

#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SearchPath {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a fresh schema with every migration applied and returns a pool
/// bound to it, or `None` when no test server is configured.
///
/// # Errors
///
/// Returns an error when the server cannot be reached or a migration fails.
pub fn isolated_pool() -> eyre::Result<Option<TestPool>> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        return Ok(None);
    };
    let schema = format!("archwarden_test_{}", Uuid::new_v4().simple());
    let mut admin = PgConnection::establish(&url).wrap_err("connect to test server")?;
    admin
        .batch_execute(&format!("CREATE SCHEMA {schema}"))
        .wrap_err("create test schema")?;
    admin
        .batch_execute(&format!("SET search_path TO {schema}"))
        .wrap_err("select test schema")?;
    for migration in MIGRATIONS {
        admin.batch_execute(migration).wrap_err("apply migration")?;
    }

    let pool = Pool::builder()
        .max_size(2)
        .connection_customizer(Box::new(SearchPath(schema)))
        .build(ConnectionManager::<PgConnection>::new(url))
        .wrap_err("build pool")?;
    Ok(Some(pool))
}
