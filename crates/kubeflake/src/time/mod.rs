mod interface;
mod mono_clock;
mod step;
mod system;

pub use interface::*;
pub use mono_clock::*;
pub use step::*;
pub use system::*;
