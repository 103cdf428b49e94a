use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matcher::{artist_in_answer, is_title_match};
use crate::spotify::Track;

const DEFAULT_TITLE_THRESHOLD: f64 = 80.0;
const DEFAULT_TITLE_BONUS: f64 = 100.0;

/// Points and thresholds applied to each answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Minimum title match percentage (0-100) for the title to count as found.
    pub title_threshold: f64,
    /// Flat points awarded when the title is found.
    pub title_bonus: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            title_bonus: DEFAULT_TITLE_BONUS,
        }
    }
}

/// State of one track-guessing episode, from deal to completion.
#[derive(Debug, Clone)]
pub struct RoundState {
    track: Track,
    artists_found: Vec<String>,
    artists_found_count: usize,
    title_found: bool,
    total_artists: usize,
    points: f64,
}

impl RoundState {
    pub fn new(track: Track) -> Self {
        let total_artists = track.artist_names.len();
        Self {
            track,
            artists_found: Vec::new(),
            artists_found_count: 0,
            title_found: false,
            total_artists,
            points: 0.0,
        }
    }

    /// Score one answer and return the points it earned.
    ///
    /// The title is checked first; a title match awards the bonus and skips
    /// artist evaluation for this answer. Otherwise every artist slot whose
    /// name appears in the answer and was not found yet earns its share of
    /// 100 points.
    pub fn submit(&mut self, answer: &str, rules: &ScoringRules) -> f64 {
        if !self.title_found && is_title_match(&self.track.title, answer, rules.title_threshold) {
            self.title_found = true;
            self.points += rules.title_bonus;
            debug!("Title found: {}", self.track.title);
            return rules.title_bonus;
        }

        let new_artists: Vec<String> = self
            .track
            .artist_names
            .iter()
            .filter(|artist| artist_in_answer(artist, answer))
            .filter(|artist| !self.has_found_artist(artist))
            .cloned()
            .collect();

        if new_artists.is_empty() {
            return 0.0;
        }

        let new_matches = new_artists.len();
        let awarded = (new_matches as f64 / self.total_artists as f64) * 100.0;

        debug!(
            "Artists found: {:?} ({}/{}, +{:.2})",
            new_artists,
            self.artists_found_count + new_matches,
            self.total_artists,
            awarded
        );

        self.artists_found.extend(new_artists);
        self.artists_found_count += new_matches;
        self.points += awarded;

        awarded
    }

    fn has_found_artist(&self, artist: &str) -> bool {
        self.artists_found
            .iter()
            .any(|found| found.to_lowercase() == artist.to_lowercase())
    }

    /// All artists and the title have been found.
    pub fn is_complete(&self) -> bool {
        self.artists_found_count == self.total_artists && self.title_found
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn artists_found(&self) -> &[String] {
        &self.artists_found
    }

    pub fn artists_found_count(&self) -> usize {
        self.artists_found_count
    }

    pub fn total_artists(&self) -> usize {
        self.total_artists
    }

    pub fn title_found(&self) -> bool {
        self.title_found
    }

    /// The title once it has been guessed.
    pub fn title_revealed(&self) -> Option<&str> {
        self.title_found.then_some(self.track.title.as_str())
    }

    pub fn points(&self) -> f64 {
        self.points
    }
}
