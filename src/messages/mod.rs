pub mod cache;
pub mod defaults;
pub mod editor;
pub mod resolver;
pub mod types;

pub use cache::*;
pub use editor::*;
pub use resolver::*;
pub use types::*;
