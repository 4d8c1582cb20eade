pub mod fallback;
pub mod normalize;
pub mod selector;
pub mod types;

pub use fallback::{select_with_fallback, with_fallback, FallbackOutcome};
pub use normalize::records_from_value;
pub use selector::select_picks;
pub use types::{FixtureRecord, LenientVec, LiveSelection, OddValue, SelectionReport, SkipCounts};
