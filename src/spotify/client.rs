use rspotify::{
    AuthCodeSpotify, Credentials, OAuth,
    model::{FullTrack, PlayableItem, PlaylistId},
    prelude::*,
    scopes,
};
use std::io::{self, Write};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::game::TrackSource;
use crate::spotify::models::{PlaylistSummary, Track, TrackSelection};

pub struct SpotifyClient {
    client: AuthCodeSpotify,
    user_id: String,
}

impl SpotifyClient {
    pub async fn new(config: &Config) -> Result<Self> {
        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);

        let oauth = OAuth {
            redirect_uri: config.spotify_redirect_uri.clone(),
            scopes: scopes!(
                "user-library-read",
                "playlist-read-private",
                "playlist-read-collaborative"
            ),
            ..Default::default()
        };

        let client = AuthCodeSpotify::new(creds, oauth);

        // Get authorization URL
        let auth_url = client.get_authorize_url(false)?;
        println!("\nOpen this URL in your browser to authorize Spotify:");
        println!("{}\n", auth_url);

        print!("Enter the URL you were redirected to: ");
        io::stdout().flush()?;

        let mut redirect_url = String::new();
        io::stdin().read_line(&mut redirect_url)?;

        let code = client
            .parse_response_code(redirect_url.trim())
            .ok_or_else(|| AppError::Auth("Failed to parse authorization code".into()))?;

        client.request_token(&code).await?;

        let user = client.current_user().await?;
        let user_id = user.id.to_string();
        let display_name = user.display_name.unwrap_or_else(|| user_id.clone());

        info!("Successfully authenticated as Spotify user: {}", display_name);

        Ok(Self { client, user_id })
    }

    /// Tracks saved in the user's library.
    pub async fn saved_tracks(&self) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut offset = 0;
        let limit = 50;

        loop {
            let page = self
                .client
                .current_user_saved_tracks_manual(None, Some(limit), Some(offset))
                .await?;

            tracks.extend(page.items.iter().filter_map(|saved| track_from_full(&saved.track)));

            if page.next.is_none() {
                break;
            }
            offset += limit;
        }

        info!("Fetched {} saved tracks", tracks.len());
        Ok(tracks)
    }

    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let id = PlaylistId::from_id(playlist_id)
            .map_err(|e| AppError::Config(format!("Invalid playlist ID: {}", e)))?;

        let mut tracks = Vec::new();
        let mut offset = 0;
        let limit = 100;

        loop {
            let page = self
                .client
                .playlist_items_manual(id.clone_static(), None, None, Some(limit), Some(offset))
                .await?;

            for item in &page.items {
                if let Some(PlayableItem::Track(track)) = &item.track {
                    tracks.extend(track_from_full(track));
                }
            }

            if page.next.is_none() {
                break;
            }
            offset += limit;
        }

        info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);
        Ok(tracks)
    }

    /// Playlists the user owns or follows.
    pub async fn user_playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let mut playlists = Vec::new();
        let mut offset = 0;
        let limit = 50;

        loop {
            let page = self
                .client
                .current_user_playlists_manual(Some(limit), Some(offset))
                .await?;

            for playlist in page.items {
                let owner = playlist
                    .owner
                    .display_name
                    .clone()
                    .unwrap_or_else(|| playlist.owner.id.to_string());
                playlists.push(PlaylistSummary {
                    id: playlist.id.id().to_string(),
                    name: playlist.name,
                    total_tracks: playlist.tracks.total as usize,
                    owned: playlist.owner.id.to_string() == self.user_id,
                    owner,
                });
            }

            if page.next.is_none() {
                break;
            }
            offset += limit;
        }

        info!("Found {} playlists", playlists.len());
        Ok(playlists)
    }

    pub fn source(&self, selection: TrackSelection) -> SpotifyTrackSource<'_> {
        SpotifyTrackSource {
            client: self,
            selection,
        }
    }
}

/// Tracks fetched through an authenticated `SpotifyClient`.
pub struct SpotifyTrackSource<'a> {
    client: &'a SpotifyClient,
    selection: TrackSelection,
}

impl TrackSource for SpotifyTrackSource<'_> {
    async fn fetch_tracks(&self) -> Result<Vec<Track>> {
        match &self.selection {
            TrackSelection::Library => self.client.saved_tracks().await,
            TrackSelection::Playlist(id) => self.client.playlist_tracks(id).await,
        }
    }

    fn describe(&self) -> String {
        self.selection.to_string()
    }
}

fn track_from_full(track: &FullTrack) -> Option<Track> {
    // Skip local tracks (they don't have an ID)
    let Some(id) = &track.id else {
        debug!("Skipping local track: {}", track.name);
        return None;
    };

    Some(Track {
        id: id.id().to_string(),
        title: track.name.clone(),
        artist_names: track.artists.iter().map(|a| a.name.clone()).collect(),
        preview_url: track.preview_url.clone(),
        cover_image_url: track.album.images.first().map(|image| image.url.clone()),
    })
}
