pub mod aggregate;
pub mod dedup;
pub mod normalize;
pub mod rules;
