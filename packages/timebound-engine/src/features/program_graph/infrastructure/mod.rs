pub mod builder;
pub mod dot;

pub use builder::{elect_start_function, GraphBuilder};
pub use dot::{dump_dot, write_dot};
