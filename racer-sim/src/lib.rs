pub mod physics;
pub mod script;
