//! Graph input

pub mod edgelist;

pub use edgelist::{load_edge_list, read_edge_list};
