pub mod handlers;
pub mod models;
pub mod registration;
pub mod router;

pub use router::auth_routes;
