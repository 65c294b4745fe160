mod env;
mod interface;

pub use env::*;
pub use interface::*;
