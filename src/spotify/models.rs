use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist_names: Vec<String>,
    pub preview_url: Option<String>,
    pub cover_image_url: Option<String>,
}

impl Track {
    /// A track can be dealt only if it has a title to guess.
    pub fn is_playable(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn artists_label(&self) -> String {
        self.artist_names.join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub total_tracks: usize,
    pub owner: String,
    pub owned: bool,
}

/// Where the tracks of a game come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelection {
    Library,
    Playlist(String),
}

impl TrackSelection {
    pub fn from_arg(playlist: Option<&str>) -> Result<Self> {
        match playlist {
            None => Ok(Self::Library),
            Some(raw) => Ok(Self::Playlist(parse_playlist_id(raw)?)),
        }
    }
}

impl std::fmt::Display for TrackSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSelection::Library => write!(f, "saved tracks"),
            TrackSelection::Playlist(id) => write!(f, "playlist {}", id),
        }
    }
}

/// Extract a playlist ID from user input.
/// Supports formats:
/// - https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH
/// - https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH?si=...
/// - spotify:playlist:37i9dQZF1E8NC99vGqLsaH
/// - 37i9dQZF1E8NC99vGqLsaH
pub fn parse_playlist_id(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return non_empty_id(id);
    }

    if !input.contains("://") {
        if input.chars().all(|c| c.is_ascii_alphanumeric()) {
            return non_empty_id(input);
        }
        return Err(AppError::Config(format!("Invalid playlist ID: {}", input)));
    }

    let url = Url::parse(input).map_err(|e| AppError::Config(format!("Invalid URL: {}", e)))?;

    let path_segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(|| AppError::Config("Invalid Spotify URL".into()))?
        .collect();

    // Expect /playlist/{id}
    if path_segments.len() >= 2 && path_segments[0] == "playlist" {
        non_empty_id(path_segments[1])
    } else {
        Err(AppError::Config(
            "URL does not appear to be a Spotify playlist URL".into(),
        ))
    }
}

fn non_empty_id(id: &str) -> Result<String> {
    if id.is_empty() {
        Err(AppError::Config("Playlist ID is empty".into()))
    } else {
        Ok(id.to_string())
    }
}

#[cfg(test)]
impl Track {
    pub fn mock(title: &str, artists: &[&str]) -> Self {
        Self {
            id: format!("mock_{}", title.to_lowercase().replace(' ', "_")),
            title: title.to_string(),
            artist_names: artists.iter().map(|a| a.to_string()).collect(),
            preview_url: Some("https://p.scdn.co/mp3-preview/mock".to_string()),
            cover_image_url: None,
        }
    }
}
