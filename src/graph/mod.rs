//! Graph representation and traversal module

pub mod weighted;
pub mod builder;
pub mod traversal;

pub use weighted::{Direction, Graph};
pub use builder::GraphBuilder;
