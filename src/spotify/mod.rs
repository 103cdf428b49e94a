pub mod client;
pub mod models;
pub mod web;

pub use client::{SpotifyClient, SpotifyTrackSource};
pub use models::{PlaylistSummary, Track, TrackSelection, parse_playlist_id};
pub use web::WebApiSource;
