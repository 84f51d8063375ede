// src/board.rs

use std::io;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};

/// A chess position together with its provenance: the seed FEN it was grown
/// from and the ordered moves played since. The history is what makes
/// crossover possible, so every mutation path must go through [`Candidate::push`]
/// to keep position and history in sync.
#[derive(Clone, Debug)]
pub struct Candidate {
    pos: Chess,
    starting_fen: String,
    history: Vec<Move>,
}

impl Candidate {
    /// A candidate at the standard starting position with an empty history.
    pub fn from_start() -> Self {
        let pos = Chess::default();
        let starting_fen = Fen::from_position(&pos, EnPassantMode::Legal).to_string();
        Self {
            pos,
            starting_fen,
            history: Vec::new(),
        }
    }

    /// Parses a seed FEN into a fresh candidate with an empty history.
    pub fn from_fen(fen: &str) -> io::Result<Self> {
        let parsed: Fen = fen.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid FEN '{fen}': {e}"),
            )
        })?;
        let pos: Chess = parsed.into_position(CastlingMode::Standard).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("illegal position '{fen}': {e}"),
            )
        })?;
        Ok(Self {
            pos,
            starting_fen: fen.to_string(),
            history: Vec::new(),
        })
    }

    pub fn position(&self) -> &Chess {
        &self.pos
    }

    pub fn starting_fen(&self) -> &str {
        &self.starting_fen
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Plays a move and records it in the history. The move must be legal
    /// for the current position.
    pub fn push(&mut self, m: Move) {
        self.pos.play_unchecked(m);
        self.history.push(m);
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.pos.legal_moves().to_vec()
    }

    pub fn is_game_over(&self) -> bool {
        self.pos.is_game_over()
    }

    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }
}
