mod alphabet;
mod codec;

pub use codec::*;
