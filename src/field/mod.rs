pub mod detector;
pub mod field_model;
