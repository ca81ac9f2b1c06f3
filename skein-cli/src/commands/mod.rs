pub mod application;
pub mod container;
pub mod kill;
pub mod kv;
pub mod status;
pub mod submit;
