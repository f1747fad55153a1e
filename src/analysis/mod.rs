pub mod pattern;

pub use pattern::{find_similar_patterns, HorizonReturn, PatternFinder, PatternMatch, PatternParams, PatternSummary};
