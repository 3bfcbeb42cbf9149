//! Masters-database explorer client.
//!
//! Queries the chess.com explorer endpoint for the known continuations
//! of a position, with win/draw/loss statistics from master games.
//! Network trouble degrades to an empty continuation list; the board is
//! always usable offline.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ExplorerError;

const EXPLORER_URL: &str = "https://www.chess.com/callback/explorer/move";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One known continuation of a position, with master-game statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    pub san: String,
    pub total: u64,
    pub white_wins: u64,
    pub draws: u64,
    pub black_wins: u64,
}

impl Continuation {
    fn fraction(&self, part: u64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        part as f64 / self.total as f64
    }

    pub fn white_percent(&self) -> u32 {
        (self.fraction(self.white_wins) * 100.0).round() as u32
    }

    pub fn draw_percent(&self) -> u32 {
        (self.fraction(self.draws) * 100.0).round() as u32
    }

    pub fn black_percent(&self) -> u32 {
        (self.fraction(self.black_wins) * 100.0).round() as u32
    }
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  |  {}%  {}%  {}% | {}",
            self.san,
            self.white_percent(),
            self.draw_percent(),
            self.black_percent(),
            self.total
        )
    }
}

#[derive(Serialize)]
struct ExplorerQuery<'a> {
    #[serde(rename = "gameSource")]
    game_source: &'a str,
    #[serde(rename = "nextFen")]
    next_fen: &'a str,
}

#[derive(Deserialize)]
struct ExplorerResponse {
    #[serde(rename = "suggestedMoves", default)]
    suggested_moves: Vec<SuggestedMove>,
}

#[derive(Deserialize)]
struct SuggestedMove {
    #[serde(rename = "sanMove")]
    san_move: String,
    #[serde(rename = "totalGames", default)]
    total_games: u64,
    #[serde(rename = "whiteWon", default)]
    white_won: u64,
    #[serde(rename = "blackWon", default)]
    black_won: u64,
    #[serde(default)]
    draw: u64,
}

impl From<SuggestedMove> for Continuation {
    fn from(m: SuggestedMove) -> Self {
        Self {
            san: m.san_move,
            total: m.total_games,
            white_wins: m.white_won,
            draws: m.draw,
            black_wins: m.black_won,
        }
    }
}

pub struct ExplorerClient {
    client: reqwest::Client,
}

impl ExplorerClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("WayChess/1.0")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    /// Master-game continuations of `fen`, best-effort. Any failure is
    /// logged and reported as no known continuations.
    pub async fn continuations(&self, fen: &str) -> Vec<Continuation> {
        match self.try_continuations(fen).await {
            Ok(moves) => moves,
            Err(e) => {
                warn!(fen, "explorer lookup failed: {e}");
                Vec::new()
            }
        }
    }

    async fn try_continuations(&self, fen: &str) -> Result<Vec<Continuation>, ExplorerError> {
        debug!(fen, "querying explorer");
        let response = self
            .client
            .post(EXPLORER_URL)
            .json(&ExplorerQuery {
                game_source: "master",
                next_fen: fen,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<ExplorerResponse>()
            .await?;

        Ok(response
            .suggested_moves
            .into_iter()
            .map(Continuation::from)
            .collect())
    }
}

impl Default for ExplorerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "suggestedMoves": [
                {"sanMove": "e4", "totalGames": 1000, "whiteWon": 400, "blackWon": 250, "draw": 350},
                {"sanMove": "d4", "totalGames": 800, "whiteWon": 320, "blackWon": 200, "draw": 280}
            ]
        }"#;
        let parsed: ExplorerResponse = serde_json::from_str(json).unwrap();
        let moves: Vec<Continuation> = parsed.suggested_moves.into_iter().map(Into::into).collect();
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].san, "e4");
        assert_eq!(moves[0].white_wins, 400);
        assert_eq!(moves[1].draws, 280);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let json = r#"{"suggestedMoves": [{"sanMove": "Nf3"}]}"#;
        let parsed: ExplorerResponse = serde_json::from_str(json).unwrap();
        let c: Continuation = parsed.suggested_moves.into_iter().next().unwrap().into();
        assert_eq!(c.total, 0);
        assert_eq!(c.white_percent(), 0);
    }

    #[test]
    fn test_display_line() {
        let c = Continuation {
            san: "e4".into(),
            total: 1000,
            white_wins: 400,
            draws: 350,
            black_wins: 250,
        };
        assert_eq!(c.to_string(), "e4  |  40%  35%  25% | 1000");
    }
}
