pub mod duration;
pub mod form;
pub mod models;
