pub mod common;
pub mod students;

pub use common::*;
pub use students::*;
