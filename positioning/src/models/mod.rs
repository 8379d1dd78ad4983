pub mod enums;
pub use enums::*;

pub mod signal;
pub use signal::*;

pub mod position;
pub use position::*;
