pub mod draft;
pub mod filters;
pub mod metrics;
pub mod property;
pub mod search;
