use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::spotify::Track;

/// A provider of tracks for a game: a user's library or a playlist.
pub trait TrackSource {
    fn fetch_tracks(&self) -> impl Future<Output = Result<Vec<Track>>> + Send;

    fn describe(&self) -> String;
}

/// Handle for one in-flight fetch. A newer ticket supersedes it.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    token: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Issues fetch tickets; only the most recent one is current.
#[derive(Debug, Default)]
pub(crate) struct FetchGate {
    generation: u64,
    pending: Option<CancellationToken>,
}

impl FetchGate {
    pub(crate) fn begin(&mut self) -> FetchTicket {
        self.supersede();
        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        FetchTicket {
            generation: self.generation,
            token,
        }
    }

    /// Cancel the pending fetch, if any, and invalidate every issued ticket.
    pub(crate) fn supersede(&mut self) {
        if let Some(token) = self.pending.take() {
            debug!("Cancelling pending track fetch #{}", self.generation);
            token.cancel();
        }
        self.generation += 1;
    }

    /// Consume the ticket if it is still the current one.
    pub(crate) fn accept(&mut self, ticket: &FetchTicket) -> bool {
        if ticket.generation != self.generation || ticket.is_cancelled() {
            return false;
        }
        self.pending = None;
        true
    }
}

/// Fetch tracks unless the ticket gets cancelled first.
///
/// Returns `None` when superseded. Source failures are logged and reported as
/// an empty batch so the game can end gracefully.
pub async fn fetch_tracks<S: TrackSource>(source: &S, ticket: &FetchTicket) -> Option<Vec<Track>> {
    let description = source.describe();
    info!("Fetching tracks from {}", description);

    tokio::select! {
        _ = ticket.token.cancelled() => {
            debug!("Fetch #{} from {} was superseded", ticket.generation, description);
            None
        }
        result = source.fetch_tracks() => match result {
            Ok(tracks) => {
                info!("Fetched {} tracks from {}", tracks.len(), description);
                Some(tracks)
            }
            Err(e) => {
                warn!("Failed to fetch tracks from {}: {}", description, e);
                Some(Vec::new())
            }
        }
    }
}
