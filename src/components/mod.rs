mod media_stage;
mod showcase;

pub use media_stage::*;
pub use showcase::*;
