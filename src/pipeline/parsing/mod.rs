pub mod brands;
pub mod parser;

pub use brands::*;
pub use parser::*;
