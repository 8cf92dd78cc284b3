mod demo;
mod export;
mod import;

pub use demo::*;
pub use export::*;
pub use import::*;
