//! Request handlers.

pub mod export;
pub mod health;
pub mod phrases;
pub mod projects;
pub mod sequence;
pub mod uploads;
pub mod user;
pub mod videos;

pub use export::*;
pub use health::*;
pub use phrases::*;
pub use projects::*;
pub use sequence::*;
pub use uploads::*;
pub use videos::*;
