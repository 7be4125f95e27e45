pub mod bot;
pub mod event;

pub use bot::Bot;
pub use event::{Event, OutOfBoundError};
