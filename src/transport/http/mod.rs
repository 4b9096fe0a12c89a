pub mod router;
pub mod types;
pub mod handlers {
    pub mod blobs;
    pub mod claims;
    pub mod common;
    pub mod health;
    pub mod registration;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
