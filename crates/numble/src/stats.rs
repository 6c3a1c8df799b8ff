//! The stats collaborator hook.
//!
//! When a match finishes, the coordinator hands a [`GameResult`] to a
//! [`StatsRecorder`] off the room's critical path. Whatever persists player
//! statistics implements the trait; [`MemoryStats`] keeps them in memory.

use std::collections::HashMap;
use std::future::Future;

use numble_protocol::{GameMode, RoomCode, UserId};
use numble_room::MatchResult;
use serde::Serialize;
use tokio::sync::RwLock;

/// Errors a stats backend can report. Always logged and swallowed: the
/// match result already sent to players stands either way.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("stats backend unavailable: {0}")]
    Unavailable(String),
}

/// The outcome of one finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub room_code: RoomCode,
    pub mode: GameMode,
    pub winner: UserId,
    pub loser: UserId,
    pub winner_guesses: usize,
    pub loser_guesses: usize,
}

impl GameResult {
    pub fn from_match(room_code: RoomCode, mode: GameMode, result: &MatchResult) -> Self {
        Self {
            room_code,
            mode,
            winner: result.winner.user_id.clone(),
            loser: result.loser.user_id.clone(),
            winner_guesses: result.winner_guesses,
            loser_guesses: result.loser_guesses,
        }
    }
}

/// Aggregate statistics for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_guesses: u64,
    pub current_win_streak: u32,
    /// `total_guesses / games_played`, rounded half up.
    pub average_guesses: u64,
}

impl PlayerStats {
    /// Folds a won game into the totals. Only wins count towards the
    /// guess total, so the average is over every game played.
    pub fn record_win(&mut self, guesses: usize) {
        self.games_played += 1;
        self.games_won += 1;
        self.current_win_streak += 1;
        self.total_guesses += guesses as u64;
        let played = u64::from(self.games_played);
        self.average_guesses = (self.total_guesses + played / 2) / played;
    }

    /// Folds a lost game into the totals: one more game, streak broken.
    /// Guess totals and the stored average are left alone.
    pub fn record_loss(&mut self) {
        self.games_played += 1;
        self.current_win_streak = 0;
    }
}

/// Receives finished-match results.
pub trait StatsRecorder: Send + Sync + 'static {
    fn record_game_result(
        &self,
        result: GameResult,
    ) -> impl Future<Output = Result<(), StatsError>> + Send;
}

/// In-memory [`StatsRecorder`]: per-player totals plus a match history.
#[derive(Debug, Default)]
pub struct MemoryStats {
    players: RwLock<HashMap<UserId, PlayerStats>>,
    history: RwLock<Vec<GameResult>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// The player's current totals, if they have finished a game.
    pub async fn stats_for(&self, user: &UserId) -> Option<PlayerStats> {
        self.players.read().await.get(user).cloned()
    }

    /// Every recorded match, oldest first.
    pub async fn history(&self) -> Vec<GameResult> {
        self.history.read().await.clone()
    }
}

impl StatsRecorder for MemoryStats {
    async fn record_game_result(&self, result: GameResult) -> Result<(), StatsError> {
        {
            let mut players = self.players.write().await;
            players
                .entry(result.winner.clone())
                .or_default()
                .record_win(result.winner_guesses);
            players
                .entry(result.loser.clone())
                .or_default()
                .record_loss();
        }
        self.history.write().await.push(result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(winner: &str, loser: &str, winner_guesses: usize, loser_guesses: usize) -> GameResult {
        GameResult {
            room_code: RoomCode::parse("ABC123").unwrap(),
            mode: GameMode::Classic,
            winner: UserId::from(winner),
            loser: UserId::from(loser),
            winner_guesses,
            loser_guesses,
        }
    }

    #[test]
    fn test_player_stats_record_win_and_loss() {
        let mut stats = PlayerStats::default();
        stats.record_win(4);
        stats.record_win(5);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.games_won, 2);
        assert_eq!(stats.current_win_streak, 2);
        assert_eq!(stats.total_guesses, 9);
        // 4.5 rounds up
        assert_eq!(stats.average_guesses, 5);

        stats.record_loss();
        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.games_won, 2);
        assert_eq!(stats.current_win_streak, 0);
        assert_eq!(stats.total_guesses, 9);
        assert_eq!(stats.average_guesses, 5);

        // The next win averages over all three games played before it too.
        stats.record_win(3);
        assert_eq!(stats.total_guesses, 12);
        assert_eq!(stats.average_guesses, 3);
    }

    #[tokio::test]
    async fn test_memory_stats_loser_keeps_guess_totals() {
        let stats = MemoryStats::new();
        stats.record_game_result(result("a", "b", 3, 7)).await.unwrap();

        let loser = stats.stats_for(&UserId::from("b")).await.unwrap();
        assert_eq!(loser.games_played, 1);
        assert_eq!(loser.games_won, 0);
        assert_eq!(loser.current_win_streak, 0);
        assert_eq!(loser.total_guesses, 0);
        assert_eq!(loser.average_guesses, 0);

        let winner = stats.stats_for(&UserId::from("a")).await.unwrap();
        assert_eq!(winner.total_guesses, 3);
        assert_eq!(winner.average_guesses, 3);

        // The loser's guess count is still kept in the match history.
        assert_eq!(stats.history().await[0].loser_guesses, 7);
    }

    #[test]
    fn test_player_stats_serialize_camel_case() {
        let json = serde_json::to_value(PlayerStats::default()).unwrap();
        assert_eq!(json["gamesPlayed"], 0);
        assert_eq!(json["currentWinStreak"], 0);
        assert_eq!(json["averageGuesses"], 0);
    }

    #[tokio::test]
    async fn test_memory_stats_updates_both_players() {
        let stats = MemoryStats::new();
        stats.record_game_result(result("a", "b", 3, 2)).await.unwrap();
        stats.record_game_result(result("b", "a", 6, 6)).await.unwrap();

        let a = stats.stats_for(&UserId::from("a")).await.unwrap();
        assert_eq!((a.games_played, a.games_won, a.current_win_streak), (2, 1, 0));
        assert_eq!(a.total_guesses, 3);
        assert_eq!(a.average_guesses, 3);

        let b = stats.stats_for(&UserId::from("b")).await.unwrap();
        assert_eq!((b.games_played, b.games_won, b.current_win_streak), (2, 1, 1));
        assert_eq!(b.total_guesses, 6);
        assert_eq!(b.average_guesses, 3);

        assert_eq!(stats.history().await.len(), 2);
        assert!(stats.stats_for(&UserId::from("c")).await.is_none());
    }
}
