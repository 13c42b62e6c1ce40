pub mod persona_model;
pub mod store;
