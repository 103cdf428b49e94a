use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::game::controller::GameController;
use crate::game::round::RoundState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub title: String,
    pub artists: Vec<String>,
    pub title_found: bool,
    pub artists_found: usize,
    pub total_artists: usize,
    pub points: f64,
    /// Title and every artist were found before moving on.
    pub completed: bool,
}

impl RoundResult {
    pub fn from_round(round: &RoundState) -> Self {
        let track = round.track();
        Self {
            title: track.title.clone(),
            artists: track.artist_names.clone(),
            title_found: round.title_found(),
            artists_found: round.artists_found_count(),
            total_artists: round.total_artists(),
            points: round.points(),
            completed: round.is_complete(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub source: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub score: f64,
    pub rounds_played: usize,
    pub rounds_completed: usize,
    pub rounds_skipped: usize,
    pub titles_found: usize,
    pub completion_rate: f64,
    pub rounds: Vec<RoundResult>,
}

impl GameSummary {
    pub fn new(source: String, started_at: DateTime<Local>, game: &GameController) -> Self {
        let rounds = game.history().to_vec();
        let rounds_played = rounds.len();
        let rounds_completed = rounds.iter().filter(|r| r.completed).count();
        let rounds_skipped = rounds_played - rounds_completed;
        let titles_found = rounds.iter().filter(|r| r.title_found).count();

        let mut summary = Self {
            source,
            started_at,
            finished_at: Local::now(),
            score: game.current_score(),
            rounds_played,
            rounds_completed,
            rounds_skipped,
            titles_found,
            completion_rate: 0.0,
            rounds,
        };
        summary.calculate_completion_rate();
        summary
    }

    pub fn calculate_completion_rate(&mut self) {
        if self.rounds_played > 0 {
            self.completion_rate =
                (self.rounds_completed as f64 / self.rounds_played as f64) * 100.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spotify::Track;

    #[test]
    fn test_summary_counts_rounds() {
        let mut game = GameController::default();
        game.mark_authenticated();
        game.start_game(vec![
            Track::mock("Yesterday", &["The Beatles"]),
            Track::mock("Help!", &["The Beatles"]),
            Track::mock("Let It Be", &["The Beatles"]),
        ])
        .unwrap();

        game.submit_answer("yesterday");
        game.submit_answer("the beatles");
        game.advance();
        game.submit_answer("help!");
        game.skip();
        game.skip();

        let summary = GameSummary::new("saved tracks".into(), Local::now(), &game);

        assert_eq!(summary.score, 300.0);
        assert_eq!(summary.rounds_played, 3);
        assert_eq!(summary.rounds_completed, 1);
        assert_eq!(summary.rounds_skipped, 2);
        assert_eq!(summary.titles_found, 2);
        assert!((summary.completion_rate - 100.0 / 3.0).abs() < 1e-9);
        assert!(summary.finished_at >= summary.started_at);
    }

    #[test]
    fn test_summary_counts_dealt_away_round_as_skipped() {
        let mut game = GameController::default();
        game.mark_authenticated();
        game.start_game(vec![
            Track::mock("Yesterday", &["The Beatles"]),
            Track::mock("Help!", &["The Beatles"]),
        ])
        .unwrap();

        game.deal_next_track();
        game.end_game();

        let summary = GameSummary::new("saved tracks".into(), Local::now(), &game);

        assert_eq!(summary.rounds_played, 2);
        assert_eq!(summary.rounds_completed, 0);
        assert_eq!(summary.rounds_skipped, 2);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn test_summary_serializes() {
        let game = GameController::default();
        let summary = GameSummary::new("playlist abc".into(), Local::now(), &game);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["source"], "playlist abc");
        assert_eq!(json["completion_rate"], 0.0);
        assert!(json["rounds"].as_array().unwrap().is_empty());
    }
}
