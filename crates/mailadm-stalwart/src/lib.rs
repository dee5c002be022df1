pub mod stalwart;

pub use stalwart::*;
