pub mod handlers;
pub mod registry;

pub use registry::{Ack, SavedJobError, SavedJobRegistry, SavedJobView};
