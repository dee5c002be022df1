pub mod confscan;

pub use confscan::*;
