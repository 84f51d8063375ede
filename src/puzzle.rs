// src/puzzle.rs

use std::io;

use serde::Serialize;
use shakmaty::{CastlingMode, Color, Move};
use tracing::debug;

use crate::board::Candidate;
use crate::engine::Oracle;

/// Outcome of engine verification for one candidate. Only a verified
/// solution carries a mate distance and a move sequence; an unverified one
/// is all-empty rather than half-filled.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub is_mate_in_n: bool,
    pub mate_in: Option<u32>,
    pub first_move: Option<String>,
    pub solution_sequence: Vec<String>,
    pub board_after_first_move: Option<String>,
}

impl Solution {
    fn unverified() -> Self {
        Self {
            is_mate_in_n: false,
            mate_in: None,
            first_move: None,
            solution_sequence: Vec::new(),
            board_after_first_move: None,
        }
    }
}

/// The final generated puzzle, shaped for pretty-printed JSON output.
/// `mate_in` is `None` when the engine could not confirm any of the target
/// mate distances; `fitness` is the evolver's score and is informational.
#[derive(Debug, Clone, Serialize)]
pub struct Puzzle {
    pub fen: String,
    pub side_to_move: String,
    pub mate_in: Option<u32>,
    pub first_move: Option<String>,
    pub solution_sequence: Vec<String>,
    pub board_after_first_move: Option<String>,
    pub fitness: i32,
}

impl Puzzle {
    pub fn from_parts(best: &Candidate, fitness: i32, solution: Solution) -> Self {
        Self {
            fen: best.fen(),
            side_to_move: match best.side_to_move() {
                Color::White => "White",
                Color::Black => "Black",
            }
            .to_string(),
            mate_in: solution.mate_in,
            first_move: solution.first_move,
            solution_sequence: solution.solution_sequence,
            board_after_first_move: solution.board_after_first_move,
            fitness,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.mate_in.is_some()
    }
}

fn uci_string(m: Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

/// Checks the candidate against every target mate distance, shortest first,
/// and returns the solution for the first one the engine confirms. No
/// confirmation at any distance yields an unverified solution, never an
/// error.
pub fn verify_candidate(
    oracle: &mut dyn Oracle,
    cand: &Candidate,
    target_depths: &[u32],
) -> io::Result<Solution> {
    let mut depths = target_depths.to_vec();
    depths.sort_unstable();
    for n in depths {
        let solution = verify_mate_in_n(oracle, cand, n)?;
        if solution.is_mate_in_n {
            return Ok(solution);
        }
    }
    Ok(Solution::unverified())
}

/// Verifies that the candidate is mate in exactly `n` by fresh re-analysis,
/// independent of any fitness score seen during evolution. On success the
/// solution line is extracted move by move: the engine's key move, the
/// defender's reply when it is forced (exactly one legal move), and the
/// follow-up. Longer or branching defences keep only the confirmed prefix.
pub fn verify_mate_in_n(
    oracle: &mut dyn Oracle,
    cand: &Candidate,
    n: u32,
) -> io::Result<Solution> {
    let analysis = oracle.analyse(cand.position())?;
    if analysis.mate != Some(n as i32) {
        debug!(mate = ?analysis.mate, expected = n, "mate distance not confirmed");
        return Ok(Solution::unverified());
    }

    let Some(first) = oracle.best_move(cand.position())? else {
        return Ok(Solution::unverified());
    };

    let mut line = cand.clone();
    let mut sequence = vec![uci_string(first)];
    line.push(first);
    let board_after_first = line.fen();

    if !line.is_game_over() {
        let replies = line.legal_moves();
        if replies.len() == 1 {
            let reply = replies[0];
            sequence.push(uci_string(reply));
            line.push(reply);
            if !line.is_game_over() {
                if let Some(finisher) = oracle.best_move(line.position())? {
                    sequence.push(uci_string(finisher));
                    line.push(finisher);
                }
            }
        }
    }

    Ok(Solution {
        is_mate_in_n: true,
        mate_in: Some(n),
        first_move: sequence.first().cloned(),
        solution_sequence: sequence,
        board_after_first_move: Some(board_after_first),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Analysis, ScriptedOracle};
    use shakmaty::Position;

    // Back-rank mate in one: Ra8#.
    const MATE_IN_1_FEN: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";
    // Rd8+ forces the rook block Re8, then Rxe8#.
    const MATE_IN_2_FEN: &str = "6k1/4r1pp/8/4N3/8/8/5PPP/3R2K1 w - - 0 1";

    fn mate(m: i32) -> Analysis {
        Analysis {
            mate: Some(m),
            cp: None,
        }
    }

    #[test]
    fn test_mate_in_one_ends_after_key_move() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let mut oracle = ScriptedOracle::new()
            .with_analysis(&cand.fen(), mate(1))
            .with_best_move(&cand.fen(), "a1a8");

        let solution = verify_mate_in_n(&mut oracle, &cand, 1).unwrap();
        assert!(solution.is_mate_in_n);
        assert_eq!(solution.mate_in, Some(1));
        assert_eq!(solution.first_move.as_deref(), Some("a1a8"));
        assert_eq!(solution.solution_sequence, vec!["a1a8"]);

        // The reported board must already be the mated position.
        let after = Candidate::from_fen(solution.board_after_first_move.as_deref().unwrap())
            .unwrap();
        assert!(after.position().is_checkmate());
    }

    #[test]
    fn test_forced_mate_in_two_line_is_extracted() {
        let cand = Candidate::from_fen(MATE_IN_2_FEN).unwrap();

        // Position after Rd8+ and the forced block Re8.
        let mut mid = cand.clone();
        for uci in ["d1d8", "e7e8"] {
            let m = uci
                .parse::<shakmaty::uci::UciMove>()
                .unwrap()
                .to_move(mid.position())
                .unwrap();
            mid.push(m);
        }

        let mut oracle = ScriptedOracle::new()
            .with_analysis(&cand.fen(), mate(2))
            .with_best_move(&cand.fen(), "d1d8")
            .with_best_move(&mid.fen(), "d8e8");

        let solution = verify_mate_in_n(&mut oracle, &cand, 2).unwrap();
        assert_eq!(solution.solution_sequence, vec!["d1d8", "e7e8", "d8e8"]);

        // Replaying the tail from board_after_first_move reaches checkmate.
        let mut replay =
            Candidate::from_fen(solution.board_after_first_move.as_deref().unwrap()).unwrap();
        for uci in &solution.solution_sequence[1..] {
            let m = uci
                .parse::<shakmaty::uci::UciMove>()
                .unwrap()
                .to_move(replay.position())
                .unwrap();
            replay.push(m);
        }
        assert!(replay.position().is_checkmate());
    }

    #[test]
    fn test_wrong_mate_distance_is_rejected() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let mut oracle = ScriptedOracle::new().with_analysis(&cand.fen(), mate(1));
        let solution = verify_mate_in_n(&mut oracle, &cand, 2).unwrap();
        assert!(!solution.is_mate_in_n);
        assert!(solution.solution_sequence.is_empty());
    }

    #[test]
    fn test_verify_candidate_picks_shortest_confirmed_depth() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let mut oracle = ScriptedOracle::new()
            .with_analysis(&cand.fen(), mate(1))
            .with_best_move(&cand.fen(), "a1a8");

        // Depths deliberately unsorted; the check still runs 1 first.
        let solution = verify_candidate(&mut oracle, &cand, &[3, 1, 2]).unwrap();
        assert_eq!(solution.mate_in, Some(1));
    }

    #[test]
    fn test_verification_is_repeatable() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let mut oracle = ScriptedOracle::new()
            .with_analysis(&cand.fen(), mate(1))
            .with_best_move(&cand.fen(), "a1a8");

        let first = verify_candidate(&mut oracle, &cand, &[1, 2]).unwrap();
        let second = verify_candidate(&mut oracle, &cand, &[1, 2]).unwrap();
        assert_eq!(first.solution_sequence, second.solution_sequence);
        assert_eq!(first.mate_in, second.mate_in);
    }

    #[test]
    fn test_no_engine_confirmation_yields_unverified_solution() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let mut oracle = ScriptedOracle::new();
        let solution = verify_candidate(&mut oracle, &cand, &[1, 2, 3]).unwrap();
        assert!(!solution.is_mate_in_n);
        assert!(solution.mate_in.is_none());
        assert!(solution.board_after_first_move.is_none());
    }

    #[test]
    fn test_puzzle_record_reports_side_to_move() {
        let cand = Candidate::from_fen(MATE_IN_1_FEN).unwrap();
        let puzzle = Puzzle::from_parts(&cand, 990, Solution::unverified());
        assert_eq!(puzzle.side_to_move, "White");
        assert_eq!(puzzle.fen, cand.fen());
        assert!(!puzzle.is_verified());
    }
}
