pub mod decoder;
pub mod handler;
pub mod models;
pub mod remover;

pub use handler::create_removal_router;
pub use models::ImageRequest;
pub use remover::{BackgroundRemover, HttpRemover, RemovalError};
