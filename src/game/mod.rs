pub mod controller;
pub mod fetch;
pub mod round;
pub mod shuffle;
pub mod summary;

pub use controller::{GameController, Phase};
pub use fetch::{FetchTicket, TrackSource, fetch_tracks};
pub use round::{RoundState, ScoringRules};
pub use shuffle::shuffle;
pub use summary::{GameSummary, RoundResult};
