pub mod email_change;
pub mod flow;
pub mod password;
pub mod sessions;
pub mod token;
