mod value;
mod source;
mod format;
mod order;

pub use value::*;
pub use source::*;
pub use format::*;
