pub mod analyzer;
pub mod fuzzy;
pub mod lines;
pub mod matcher;
pub mod normalizer;
pub mod odds;
pub mod sports;

pub use matcher::{EventMatcher, MatchRecord, Orientation};
pub use sports::Sport;
