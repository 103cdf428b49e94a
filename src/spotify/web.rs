use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::game::TrackSource;
use crate::spotify::models::{Track, TrackSelection};

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

#[derive(Debug, Deserialize)]
struct WebPage {
    items: Vec<WebItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebItem {
    track: Option<WebTrack>,
}

#[derive(Debug, Deserialize)]
struct WebTrack {
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<WebArtist>,
    preview_url: Option<String>,
    album: Option<WebAlbum>,
    #[serde(default)]
    is_local: bool,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WebAlbum {
    #[serde(default)]
    images: Vec<WebImage>,
}

#[derive(Debug, Deserialize)]
struct WebImage {
    url: String,
}

/// Fetches tracks from the Spotify Web API with an already issued bearer token.
pub struct WebApiSource {
    http_client: Client,
    access_token: String,
    selection: TrackSelection,
    base_url: String,
}

impl WebApiSource {
    pub fn new(access_token: &str, selection: TrackSelection) -> Self {
        Self::with_base_url(access_token, selection, SPOTIFY_API_BASE)
    }

    pub fn with_base_url(access_token: &str, selection: TrackSelection, base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            access_token: access_token.to_string(),
            selection,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn first_page_url(&self) -> String {
        match &self.selection {
            TrackSelection::Library => format!("{}/me/tracks?limit=50", self.base_url),
            TrackSelection::Playlist(id) => format!(
                "{}/playlists/{}/tracks?limit=100",
                self.base_url,
                urlencoding::encode(id)
            ),
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<WebPage> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Spotify request failed ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    AppError::Auth("Spotify access token is invalid or expired".into())
                }
                StatusCode::NOT_FOUND => AppError::NotFound(self.selection.to_string()),
                _ => AppError::SpotifyWeb(format!("{}: {}", status, error_text)),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_all(&self) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut next = Some(self.first_page_url());

        while let Some(url) = next {
            let page = self.fetch_page(&url).await?;
            next = page.next.clone();
            tracks.extend(tracks_from_page(page));
        }

        info!("Fetched {} tracks from {}", tracks.len(), self.selection);
        Ok(tracks)
    }
}

impl TrackSource for WebApiSource {
    async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        self.fetch_all().await
    }

    fn describe(&self) -> String {
        self.selection.to_string()
    }
}

fn tracks_from_page(page: WebPage) -> Vec<Track> {
    page.items
        .into_iter()
        .filter_map(|item| item.track)
        .filter_map(|track| {
            if track.kind.as_deref().is_some_and(|kind| kind != "track") {
                debug!("Skipping non-track item: {}", track.name);
                return None;
            }
            let id = match track.id {
                Some(id) if !track.is_local => id,
                _ => {
                    debug!("Skipping local track: {}", track.name);
                    return None;
                }
            };

            Some(Track {
                id,
                title: track.name,
                artist_names: track.artists.into_iter().map(|a| a.name).collect(),
                preview_url: track.preview_url,
                cover_image_url: track
                    .album
                    .and_then(|album| album.images.into_iter().next())
                    .map(|image| image.url),
            })
        })
        .collect()
}
