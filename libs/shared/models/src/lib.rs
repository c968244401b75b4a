pub mod auth;
pub mod error;
pub mod formats;
pub mod pagination;
