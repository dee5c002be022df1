pub mod managesieve;

pub use managesieve::*;
