pub mod config;
pub mod error;
pub mod game;
pub mod matcher;
pub mod spotify;

pub use config::Config;
pub use error::{AppError, Result};
pub use game::{GameController, GameSummary, Phase, RoundState, ScoringRules, TrackSource};
pub use spotify::{SpotifyClient, Track, TrackSelection, WebApiSource};
