pub mod common;
pub mod domain;

pub use domain::*;
