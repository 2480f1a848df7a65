pub mod enums;
pub mod product;
pub mod project;
pub mod project_item;

pub use enums::*;
pub use product::*;
pub use project::*;
pub use project_item::*;
