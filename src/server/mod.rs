mod admin;
mod auth;
pub mod dto;
mod expenses;
pub mod response;
mod router;
pub mod validation;

pub use admin::admin_router;
pub use auth::auth_router;
pub use expenses::expense_router;
pub use router::{AppState, cors_layer, create_router};
