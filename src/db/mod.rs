pub mod audit;
pub mod brokerages;
pub mod connection;
pub mod email_changes;
pub mod properties;
pub mod settings;
pub mod users;

pub use connection::Database;
