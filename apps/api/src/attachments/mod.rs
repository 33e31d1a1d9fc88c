pub mod form;
pub mod handlers;
pub mod profile_set;
pub mod reference;
pub mod resolver;
