use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::game::fetch::{FetchGate, FetchTicket};
use crate::game::round::{RoundState, ScoringRules};
use crate::game::shuffle::shuffle;
use crate::game::summary::RoundResult;
use crate::spotify::Track;

/// Externally visible phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingAuth,
    SelectingSource,
    Playing,
    RoundComplete,
    GameComplete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::AwaitingAuth => write!(f, "Awaiting authentication"),
            Phase::SelectingSource => write!(f, "Selecting a source"),
            Phase::Playing => write!(f, "Playing"),
            Phase::RoundComplete => write!(f, "Round complete"),
            Phase::GameComplete => write!(f, "Game complete"),
        }
    }
}

#[derive(Debug)]
enum Stage {
    AwaitingAuth,
    SelectingSource,
    InRound(RoundState),
    GameComplete,
}

/// Owns the state of a blind test session and applies player commands to it.
#[derive(Debug)]
pub struct GameController {
    rules: ScoringRules,
    authenticated: bool,
    stage: Stage,
    track_queue: Vec<Track>,
    queue_position: usize,
    score: f64,
    history: Vec<RoundResult>,
    fetch_gate: FetchGate,
}

impl GameController {
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            authenticated: false,
            stage: Stage::AwaitingAuth,
            track_queue: Vec::new(),
            queue_position: 0,
            score: 0.0,
            history: Vec::new(),
            fetch_gate: FetchGate::default(),
        }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    pub fn mark_authenticated(&mut self) {
        if !self.authenticated {
            info!("Session authenticated");
            self.authenticated = true;
            self.stage = Stage::SelectingSource;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Start a game over `tracks` in the given order.
    pub fn start_game(&mut self, tracks: Vec<Track>) -> Result<Phase> {
        if !self.is_authenticated() {
            return Err(AppError::AuthRequired);
        }

        self.fetch_gate.supersede();
        self.score = 0.0;
        self.history.clear();
        self.stage = Stage::SelectingSource;

        let fetched = tracks.len();
        self.track_queue = tracks
            .into_iter()
            .filter(|track| {
                let playable = track.is_playable();
                if !playable {
                    debug!("Skipping track without title: {}", track.id);
                }
                playable
            })
            .collect();
        self.queue_position = 0;

        let dropped = fetched - self.track_queue.len();
        info!(
            "Starting game with {} tracks ({} without title dropped)",
            self.track_queue.len(),
            dropped
        );

        if self.track_queue.is_empty() {
            warn!("No playable tracks available");
        }

        self.deal_from_queue();
        Ok(self.phase())
    }

    /// Start a game over a shuffled copy of `tracks`.
    pub fn start_game_shuffled<R: Rng + ?Sized>(
        &mut self,
        tracks: &[Track],
        rng: &mut R,
    ) -> Result<Phase> {
        self.start_game(shuffle(tracks, rng))
    }

    /// Deal the next track of the queue, or end the game when it is exhausted.
    /// Before a game has started there is nothing to deal and this returns `None`.
    pub fn deal_next_track(&mut self) -> Option<&RoundState> {
        if matches!(self.stage, Stage::AwaitingAuth | Stage::SelectingSource) {
            debug!("Ignoring deal, no game in progress");
            return None;
        }
        self.deal_from_queue()
    }

    fn deal_from_queue(&mut self) -> Option<&RoundState> {
        self.fetch_gate.supersede();
        self.close_round();

        let Some(track) = self.track_queue.get(self.queue_position).cloned() else {
            info!("Track queue exhausted, final score: {:.2}", self.score);
            self.stage = Stage::GameComplete;
            return None;
        };

        self.queue_position += 1;
        debug!(
            "Dealing track {}/{}: {}",
            self.queue_position,
            self.track_queue.len(),
            track.id
        );

        self.stage = Stage::InRound(RoundState::new(track));
        self.current_round()
    }

    /// Score an answer against the current track and return the points earned.
    /// Without an active round the answer is ignored.
    pub fn submit_answer(&mut self, answer: &str) -> f64 {
        let Stage::InRound(round) = &mut self.stage else {
            debug!("Ignoring answer, no active round");
            return 0.0;
        };

        let awarded = round.submit(answer, &self.rules);
        self.score += awarded;

        if awarded > 0.0 && round.is_complete() {
            info!("Round complete: {}", round.track().title);
        }

        awarded
    }

    pub fn is_round_complete(&self) -> bool {
        self.current_round().is_some_and(RoundState::is_complete)
    }

    /// Move past a completed round. Does nothing while the round is in progress.
    pub fn advance(&mut self) -> Phase {
        if self.is_round_complete() {
            self.deal_next_track();
        }
        self.phase()
    }

    /// Give up on the current track and deal the next one.
    pub fn skip(&mut self) -> Phase {
        if let Some(round) = self.current_round() {
            info!("Skipping track: {}", round.track().title);
            self.deal_from_queue();
        }
        self.phase()
    }

    /// Stop the game early, keeping the score. An unfinished round counts as skipped.
    pub fn end_game(&mut self) -> Phase {
        self.fetch_gate.supersede();
        if self.current_round().is_some() {
            self.close_round();
            self.queue_position = self.track_queue.len();
            self.stage = Stage::GameComplete;
        }
        self.phase()
    }

    /// Abandon the session and go back to source selection.
    pub fn reset(&mut self) {
        self.fetch_gate.supersede();
        self.track_queue.clear();
        self.queue_position = 0;
        self.score = 0.0;
        self.history.clear();
        if self.authenticated {
            self.stage = Stage::SelectingSource;
        }
    }

    /// Start tracking a new fetch; any fetch still in flight is cancelled.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_gate.begin()
    }

    /// Start a game from fetched tracks unless a newer command superseded the fetch.
    pub fn finish_fetch(&mut self, ticket: &FetchTicket, tracks: Vec<Track>) -> Result<bool> {
        if !self.fetch_gate.accept(ticket) {
            debug!("Discarding stale fetch #{}", ticket.generation());
            return Ok(false);
        }

        self.start_game(tracks)?;
        Ok(true)
    }

    fn close_round(&mut self) {
        if let Stage::InRound(round) = &self.stage {
            self.history.push(RoundResult::from_round(round));
            self.stage = Stage::SelectingSource;
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.stage {
            Stage::AwaitingAuth => Phase::AwaitingAuth,
            Stage::SelectingSource => Phase::SelectingSource,
            Stage::InRound(round) if round.is_complete() => Phase::RoundComplete,
            Stage::InRound(_) => Phase::Playing,
            Stage::GameComplete => Phase::GameComplete,
        }
    }

    pub fn current_round(&self) -> Option<&RoundState> {
        match &self.stage {
            Stage::InRound(round) => Some(round),
            _ => None,
        }
    }

    pub fn current_score(&self) -> f64 {
        self.score
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_round().map(RoundState::track)
    }

    pub fn artists_found_count(&self) -> usize {
        self.current_round()
            .map_or(0, RoundState::artists_found_count)
    }

    pub fn artists_found(&self) -> &[String] {
        self.current_round()
            .map(RoundState::artists_found)
            .unwrap_or_default()
    }

    pub fn total_artists_count(&self) -> usize {
        self.current_round().map_or(0, RoundState::total_artists)
    }

    pub fn title_revealed(&self) -> Option<&str> {
        self.current_round().and_then(RoundState::title_revealed)
    }

    pub fn tracks_remaining(&self) -> usize {
        self.track_queue.len().saturating_sub(self.queue_position)
    }

    pub fn tracks_dealt(&self) -> usize {
        self.queue_position
    }

    pub fn history(&self) -> &[RoundResult] {
        &self.history
    }
}

impl Default for GameController {
    fn default() -> Self {
        Self::new(ScoringRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn playing(tracks: Vec<Track>) -> GameController {
        let mut game = GameController::default();
        game.mark_authenticated();
        game.start_game(tracks).unwrap();
        game
    }

    fn beatles() -> Track {
        Track::mock("Yesterday", &["The Beatles"])
    }

    #[test]
    fn test_new_controller_awaits_auth() {
        let mut game = GameController::default();

        assert_eq!(game.phase(), Phase::AwaitingAuth);
        assert!(matches!(
            game.start_game(vec![beatles()]),
            Err(AppError::AuthRequired)
        ));

        game.mark_authenticated();
        assert_eq!(game.phase(), Phase::SelectingSource);
    }

    #[test]
    fn test_start_game_deals_first_track() {
        let game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);

        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.current_track().unwrap().title, "Yesterday");
        assert_eq!(game.current_score(), 0.0);
        assert_eq!(game.total_artists_count(), 1);
        assert_eq!(game.artists_found_count(), 0);
        assert_eq!(game.title_revealed(), None);
        assert_eq!(game.tracks_remaining(), 1);
    }

    #[test]
    fn test_empty_source_completes_immediately() {
        let game = playing(Vec::new());

        assert_eq!(game.phase(), Phase::GameComplete);
        assert_eq!(game.current_score(), 0.0);
        assert!(game.current_track().is_none());
    }

    #[test]
    fn test_unplayable_tracks_are_dropped() {
        let game = playing(vec![Track::mock("", &["Ghost"]), beatles()]);

        assert_eq!(game.current_track().unwrap().title, "Yesterday");
        assert_eq!(game.tracks_remaining(), 0);
    }

    #[test]
    fn test_full_round_then_game_complete() {
        let mut game = playing(vec![beatles()]);

        assert_eq!(game.submit_answer("yesterday"), 100.0);
        assert_eq!(game.title_revealed(), Some("Yesterday"));
        assert!(!game.is_round_complete());
        assert_eq!(game.advance(), Phase::Playing);

        assert_eq!(game.submit_answer("the beatles"), 100.0);
        assert!(game.is_round_complete());
        assert_eq!(game.phase(), Phase::RoundComplete);

        assert_eq!(game.advance(), Phase::GameComplete);
        assert_eq!(game.current_score(), 200.0);
        assert_eq!(game.history().len(), 1);
        assert!(game.history()[0].completed);
    }

    #[test]
    fn test_score_carries_across_rounds() {
        let mut game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);

        game.submit_answer("yesterday");
        game.submit_answer("the beatles");
        game.advance();

        assert_eq!(game.current_track().unwrap().title, "Help!");
        assert_eq!(game.artists_found_count(), 0);
        assert_eq!(game.current_score(), 200.0);

        game.submit_answer("help!");
        assert_eq!(game.current_score(), 300.0);
    }

    #[test]
    fn test_resubmitting_title_scores_once() {
        let mut game = playing(vec![beatles()]);

        assert_eq!(game.submit_answer("Yesterday"), 100.0);
        assert_eq!(game.submit_answer("Yesterday"), 0.0);
        assert_eq!(game.current_score(), 100.0);
    }

    #[test]
    fn test_submit_without_round_is_noop() {
        let mut game = GameController::default();
        assert_eq!(game.submit_answer("yesterday"), 0.0);

        let mut finished = playing(Vec::new());
        assert_eq!(finished.submit_answer("yesterday"), 0.0);
        assert_eq!(finished.current_score(), 0.0);
    }

    #[test]
    fn test_skip_deals_next_track() {
        let mut game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);

        game.submit_answer("the beatles");
        assert_eq!(game.skip(), Phase::Playing);
        assert_eq!(game.current_track().unwrap().title, "Help!");
        assert_eq!(game.current_score(), 100.0);

        assert_eq!(game.skip(), Phase::GameComplete);
        assert_eq!(game.history().len(), 2);
        assert!(game.history().iter().all(|r| !r.completed));
        assert_eq!(game.history()[0].points, 100.0);
    }

    #[test]
    fn test_end_game_keeps_score() {
        let mut game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);
        game.submit_answer("yesterday");

        assert_eq!(game.end_game(), Phase::GameComplete);
        assert_eq!(game.current_score(), 100.0);
        assert_eq!(game.tracks_remaining(), 0);
        assert!(!game.history()[0].completed);
        assert!(game.history()[0].title_found);
    }

    #[test]
    fn test_deal_before_auth_is_noop() {
        let mut game = GameController::default();

        assert!(game.deal_next_track().is_none());
        assert_eq!(game.phase(), Phase::AwaitingAuth);
        assert!(!game.is_authenticated());
        assert!(matches!(
            game.start_game(vec![beatles()]),
            Err(AppError::AuthRequired)
        ));
    }

    #[test]
    fn test_deal_before_game_start_is_noop() {
        let mut game = GameController::default();
        game.mark_authenticated();

        assert!(game.deal_next_track().is_none());
        assert_eq!(game.phase(), Phase::SelectingSource);

        game.start_game(vec![beatles()]).unwrap();
        game.reset();
        assert!(game.deal_next_track().is_none());
        assert_eq!(game.phase(), Phase::SelectingSource);
        assert!(game.is_authenticated());
    }

    #[test]
    fn test_deal_mid_round_records_unfinished_round() {
        let mut game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);
        game.submit_answer("yesterday");

        let next = game.deal_next_track().unwrap();
        assert_eq!(next.track().title, "Help!");

        let result = &game.history()[0];
        assert!(!result.completed);
        assert!(result.title_found);
        assert_eq!(result.points, 100.0);
    }

    #[test]
    fn test_deal_past_end_completes_game() {
        let mut game = playing(vec![beatles()]);

        assert!(game.deal_next_track().is_none());
        assert_eq!(game.phase(), Phase::GameComplete);
        assert!(game.deal_next_track().is_none());
    }

    #[test]
    fn test_start_game_resets_score() {
        let mut game = playing(vec![beatles()]);
        game.submit_answer("yesterday");

        game.start_game(vec![beatles()]).unwrap();
        assert_eq!(game.current_score(), 0.0);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_reset_returns_to_source_selection() {
        let mut game = playing(vec![beatles()]);
        game.submit_answer("yesterday");

        game.reset();
        assert_eq!(game.phase(), Phase::SelectingSource);
        assert_eq!(game.current_score(), 0.0);
        assert_eq!(game.tracks_remaining(), 0);
    }

    #[test]
    fn test_shuffled_start_uses_every_track() {
        let tracks: Vec<Track> = (0..10)
            .map(|i| Track::mock(&format!("Song {}", i), &["Band"]))
            .collect();
        let mut game = GameController::default();
        game.mark_authenticated();
        game.start_game_shuffled(&tracks, &mut StdRng::seed_from_u64(5))
            .unwrap();

        let mut dealt = vec![game.current_track().unwrap().title.clone()];
        while let Some(round) = game.deal_next_track() {
            dealt.push(round.track().title.clone());
        }

        dealt.sort();
        let mut expected: Vec<String> = tracks.iter().map(|t| t.title.clone()).collect();
        expected.sort();
        assert_eq!(dealt, expected);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut game = GameController::default();
        game.mark_authenticated();

        let stale = game.begin_fetch();
        let current = game.begin_fetch();

        assert!(!game.finish_fetch(&stale, vec![Track::mock("Old", &[])]).unwrap());
        assert_eq!(game.phase(), Phase::SelectingSource);

        assert!(game.finish_fetch(&current, vec![beatles()]).unwrap());
        assert_eq!(game.current_track().unwrap().title, "Yesterday");
    }

    #[test]
    fn test_command_supersedes_pending_fetch() {
        let mut game = playing(vec![beatles(), Track::mock("Help!", &["The Beatles"])]);

        let ticket = game.begin_fetch();
        game.skip();
        assert!(ticket.is_cancelled());

        assert!(!game.finish_fetch(&ticket, vec![Track::mock("Old", &[])]).unwrap());
        assert_eq!(game.current_track().unwrap().title, "Help!");
    }

    #[tokio::test]
    async fn test_fetch_then_play() {
        use crate::game::fetch::fetch_tracks;
        use crate::game::fetch::tests::StaticSource;

        let mut game = GameController::default();
        game.mark_authenticated();
        let source = StaticSource(vec![beatles()]);

        let ticket = game.begin_fetch();
        let tracks = fetch_tracks(&source, &ticket).await.unwrap();
        let tracks = shuffle(&tracks, &mut StdRng::seed_from_u64(0));
        assert!(game.finish_fetch(&ticket, tracks).unwrap());

        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.submit_answer("yesterday"), 100.0);
    }
}
