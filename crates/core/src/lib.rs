#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod model;
pub mod time;

pub use generator::QuestionGenerator;
pub use time::Clock;
