pub mod cache;
pub mod enrichment;
pub mod resolver;

pub use cache::*;
pub use enrichment::*;
pub use resolver::*;
