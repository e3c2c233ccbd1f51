pub mod diff;
pub mod range;

pub use diff::{Severity, VersionDiff, classify, classify_current};
pub use range::{NpmRange, leading_wildcard, max_satisfying, newest_first, satisfies};
