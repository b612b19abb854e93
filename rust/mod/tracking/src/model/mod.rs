mod attribute;
mod project;
mod step;
mod unit;

pub use attribute::*;
pub use project::*;
pub use step::*;
pub use unit::*;
