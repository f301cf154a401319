pub mod interface;
pub mod tcp;

pub use interface::*;
pub use tcp::*;
