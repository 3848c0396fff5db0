pub mod migration;
pub mod persistence;
pub mod schema;
pub mod tables;
