pub mod rspamd;

pub use rspamd::*;
