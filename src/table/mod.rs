//! Table module - Loading simulator artifacts and resolving column roles.

mod resolver;
mod store;

pub use resolver::*;
pub use store::*;
