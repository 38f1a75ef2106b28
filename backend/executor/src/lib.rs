pub mod executor;
pub mod writer;

pub use executor::{DispatchOptions, Executor};
pub use writer::{render, OutputWriter, Rendered};
