pub mod common;
pub mod env;
pub mod launcher;
pub mod runtime_resolver;
