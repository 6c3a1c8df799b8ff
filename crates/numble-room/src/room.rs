//! The state machine for one match.
//!
//! A [`Room`] is plain data plus transitions; it does no I/O and never
//! blocks. The room actor owns exactly one and is the only thing that
//! mutates it, which is what linearizes intents for the same code.
//!
//! Players sit in fixed seats: the creator in [`Seat::First`], the joiner
//! in [`Seat::Second`]. Whose turn it is lives in `current_turn` as a seat,
//! so a player's id, secret and guess log never move between records.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use numble_protocol::{
    GameConfig, GameState, GuessRecord, Identity, PlayerSummary, PlayerView, RoomCode,
    RoomView, UserId, Verdict,
};
use tokio::time::Instant;

use crate::RoomError;
use crate::feedback::{evaluate, is_win};

/// One of the two fixed slots in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// The opponent's seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

#[derive(Debug, Clone)]
struct Player {
    identity: Identity,
    /// Committed secret. Read only by the evaluator.
    secret: Option<String>,
    guesses: Vec<GuessRecord>,
    score: usize,
}

impl Player {
    fn new(identity: Identity) -> Self {
        Self {
            identity,
            secret: None,
            guesses: Vec::new(),
            score: 0,
        }
    }

    fn view(&self) -> PlayerView {
        PlayerView {
            id: self.identity.user_id.clone(),
            username: self.identity.username.clone(),
            has_secret: self.secret.is_some(),
            guesses: self.guesses.clone(),
            score: self.score,
        }
    }
}

/// What a successful `join` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The caller took the free seat.
    Seated,
    /// The caller already had a seat; nothing changed.
    AlreadySeated,
}

/// The final tally of a finished match, for the stats hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub winner: Identity,
    pub loser: Identity,
    pub winner_guesses: usize,
    pub loser_guesses: usize,
}

/// The result of an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    pub feedback: Vec<Verdict>,
    pub is_win: bool,
    /// Set when this guess finished the match.
    pub result: Option<MatchResult>,
}

/// One match's complete state.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    config: GameConfig,
    players: Vec<Player>,
    state: GameState,
    current_turn: Option<Seat>,
    winner: Option<Seat>,
    created_at: Instant,
    expires_at: Instant,
}

impl Room {
    /// Opens a room with `creator` in the first seat.
    pub fn new(code: RoomCode, creator: Identity, config: GameConfig, ttl: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            code,
            config,
            players: vec![Player::new(creator)],
            state: GameState::Waiting,
            current_turn: None,
            winner: None,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns `true` once `now` has reached the room's expiry.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// The seat `user` occupies, if any.
    pub fn seat_of(&self, user: &UserId) -> Option<Seat> {
        self.players
            .iter()
            .position(|p| p.identity.user_id == *user)
            .map(|i| if i == 0 { Seat::First } else { Seat::Second })
    }

    /// The user in `seat`, if it is taken.
    pub fn user_at(&self, seat: Seat) -> Option<&UserId> {
        self.players.get(seat.index()).map(|p| &p.identity.user_id)
    }

    /// The seat whose turn it is, while playing.
    pub fn current_turn(&self) -> Option<Seat> {
        self.current_turn
    }

    /// The per-turn time limit, if this room's mode has one.
    pub fn time_per_turn(&self) -> Option<Duration> {
        self.config.time_per_turn.map(Duration::from_secs)
    }

    /// Seats `identity` in the free seat.
    ///
    /// A user who already has a seat gets [`JoinOutcome::AlreadySeated`].
    /// Otherwise a full room is reported before a started one.
    pub fn join(&mut self, identity: Identity) -> Result<JoinOutcome, RoomError> {
        if self.seat_of(&identity.user_id).is_some() {
            return Ok(JoinOutcome::AlreadySeated);
        }
        if self.players.len() >= 2 {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        if !self.state.is_joinable() {
            return Err(RoomError::GameInProgress);
        }

        self.players.push(Player::new(identity));
        self.state = GameState::Ready;
        Ok(JoinOutcome::Seated)
    }

    /// Commits (or replaces) `user`'s secret.
    ///
    /// Returns `true` if this secret started the game: both seats are taken
    /// and both secrets are in. The creator guesses first.
    pub fn submit_secret(&mut self, user: &UserId, secret: &str) -> Result<bool, RoomError> {
        let seat = self
            .seat_of(user)
            .ok_or_else(|| RoomError::PlayerNotInRoom(user.clone()))?;
        match self.state {
            GameState::Playing => return Err(RoomError::GameInProgress),
            GameState::Finished => return Err(RoomError::GameNotInProgress),
            GameState::Waiting | GameState::Ready => {}
        }
        check_digits(secret, &self.config, true)?;

        self.players[seat.index()].secret = Some(secret.to_string());

        let all_in = self.players.len() == 2 && self.players.iter().all(|p| p.secret.is_some());
        if all_in {
            self.state = GameState::Playing;
            self.current_turn = Some(Seat::First);
        }
        Ok(all_in)
    }

    /// Scores `user`'s guess against the opponent's secret and passes the
    /// turn, or finishes the match on a full match.
    pub fn submit_guess(&mut self, user: &UserId, guess: &str) -> Result<GuessOutcome, RoomError> {
        if self.state != GameState::Playing || self.players.len() != 2 {
            return Err(RoomError::GameNotInProgress);
        }
        let seat = self
            .seat_of(user)
            .ok_or_else(|| RoomError::PlayerNotInRoom(user.clone()))?;
        if self.current_turn != Some(seat) {
            return Err(RoomError::NotYourTurn);
        }
        check_digits(guess, &self.config, false)?;

        let secret = self.players[seat.other().index()]
            .secret
            .as_deref()
            .ok_or(RoomError::GameNotInProgress)?;
        let feedback = evaluate(guess, secret);
        let won = is_win(&feedback);

        let guesser = &mut self.players[seat.index()];
        guesser.guesses.push(GuessRecord {
            guess_number: guess.to_string(),
            feedback: feedback.clone(),
            submitted_at: unix_millis(),
        });
        guesser.score = guesser.guesses.len();

        let result = if won {
            self.state = GameState::Finished;
            self.winner = Some(seat);
            Some(self.match_result(seat))
        } else {
            self.current_turn = Some(seat.other());
            None
        };

        Ok(GuessOutcome {
            feedback,
            is_win: won,
            result,
        })
    }

    /// Passes the turn without recording a guess. Returns the seat that
    /// lost its turn, or `None` if no game is being played.
    pub fn forfeit_turn(&mut self) -> Option<Seat> {
        if self.state != GameState::Playing {
            return None;
        }
        let seat = self.current_turn?;
        self.current_turn = Some(seat.other());
        Some(seat)
    }

    /// The `{id, username}` listing used in `room-updated`.
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.players
            .iter()
            .map(|p| PlayerSummary {
                id: p.identity.user_id.clone(),
                username: p.identity.username.clone(),
            })
            .collect()
    }

    /// Public-safe snapshot. Contains no secrets.
    pub fn view(&self) -> RoomView {
        RoomView {
            room_code: self.code.clone(),
            players: self.players.iter().map(Player::view).collect(),
            game_mode: self.config.mode,
            game_state: self.state,
            game_config: self.config.clone(),
            current_turn: self.current_turn.and_then(|s| self.user_at(s).cloned()),
            winner: self.winner.and_then(|s| self.user_at(s).cloned()),
        }
    }

    fn match_result(&self, winner: Seat) -> MatchResult {
        let w = &self.players[winner.index()];
        let l = &self.players[winner.other().index()];
        MatchResult {
            winner: w.identity.clone(),
            loser: l.identity.clone(),
            winner_guesses: w.guesses.len(),
            loser_guesses: l.guesses.len(),
        }
    }
}

/// Validates a secret or guess against the room's digit rules. Guesses may
/// always repeat digits.
fn check_digits(value: &str, config: &GameConfig, is_secret: bool) -> Result<(), RoomError> {
    let found = value.chars().count();
    if found != config.digit_count {
        return Err(RoomError::InvalidInputLength {
            expected: config.digit_count,
            found,
        });
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RoomError::InvalidDigits);
    }
    if is_secret && !config.allow_duplicates {
        let mut seen = [false; 10];
        for b in value.bytes() {
            let slot = &mut seen[usize::from(b - b'0')];
            if *slot {
                return Err(RoomError::DuplicateDigits);
            }
            *slot = true;
        }
    }
    Ok(())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
