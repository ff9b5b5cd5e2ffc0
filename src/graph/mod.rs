/// Catalog reflection into the stable schema shape.
pub mod schema;

/// Connection liveness reporting.
pub mod health;

pub use health::HealthReporter;
pub use schema::SchemaReflector;

/// Catalog probe listing every table; shared by reflection and health checks.
pub const SHOW_TABLES: &str = "CALL show_tables() RETURN *;";
