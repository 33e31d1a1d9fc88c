pub mod handlers;
pub mod service;

pub use service::{ProfileError, ProfileService, ProfileUpdate, ProfileView};
