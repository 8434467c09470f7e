pub mod digest;

pub use digest::*;
