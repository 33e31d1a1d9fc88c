pub mod decision;
pub mod handlers;
pub mod in_flight;
pub mod submission;
