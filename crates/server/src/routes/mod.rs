pub mod health;
pub mod metadata;
pub mod metrics;
pub mod operation_definition;
