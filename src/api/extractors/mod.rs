pub mod auth;
pub mod guards;
pub mod validated;
