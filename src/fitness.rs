// src/fitness.rs

use shakmaty::{attacks, Bitboard, Chess, Color, Position, Role, Square};
use tracing::warn;

use crate::board::Candidate;
use crate::config::GaConfig;
use crate::constants::{
    ATTACKED_PIECE_BONUS, BALANCED_CP_WINDOW, BALANCED_POSITION_BONUS, CHECK_BONUS,
    KING_ATTACKED_BONUS, MATE_DISTANCE_PENALTY, MATE_IN_TARGET_BASE, MATE_OUTSIDE_TARGET_BASE,
};
use crate::engine::{Analysis, Oracle};
use crate::sampler::gives_check;

/// Scores a candidate with one fixed-depth engine analysis. Finished games
/// are worthless as puzzle material and score 0, and any oracle failure is
/// downgraded to 0 so the evolver loop never sees it.
pub fn evaluate_board(oracle: &mut dyn Oracle, cand: &Candidate, config: &GaConfig) -> i32 {
    if cand.is_game_over() {
        return 0;
    }
    match oracle.analyse(cand.position()) {
        Ok(analysis) => score_position(cand.position(), analysis, config),
        Err(e) => {
            warn!(error = %e, fen = %cand.fen(), "analysis failed, scoring 0");
            0
        }
    }
}

/// Pure scoring over an engine verdict. Mates for the side to move dominate:
/// inside the target window they score `1000 - 10*distance`, outside it
/// `500 - 10*distance`. Everything else gets a small tactical-tension score,
/// so the bands never overlap.
pub fn score_position(pos: &Chess, analysis: Analysis, config: &GaConfig) -> i32 {
    if let Some(mate) = analysis.mate {
        if mate > 0 {
            if config.target_mate_depths.contains(&(mate as u32)) {
                return MATE_IN_TARGET_BASE - MATE_DISTANCE_PENALTY * mate;
            }
            return MATE_OUTSIDE_TARGET_BASE - MATE_DISTANCE_PENALTY * mate;
        }
    }
    tactical_tension(pos, analysis.cp)
}

/// Heuristic for non-mate positions: live checks, pieces en prise and an
/// exposed king all suggest tactics are in the air, and roughly balanced
/// engine evals are favoured over already-decided games.
fn tactical_tension(pos: &Chess, cp: Option<i32>) -> i32 {
    let mut score = 0;

    let checks = pos
        .legal_moves()
        .iter()
        .filter(|m| gives_check(pos, **m))
        .count() as i32;
    score += checks * CHECK_BONUS;

    let board = pos.board();
    let us = pos.turn();
    let them = !us;
    let occupied = board.occupied();

    let mut their_attacks = Bitboard::EMPTY;
    for sq in board.by_color(them) {
        if let Some(piece) = board.piece_at(sq) {
            their_attacks |= attacks_from(piece.role, sq, them, occupied);
        }
    }

    let our_king = board.king_of(us);
    let mut attacked_pieces = 0;
    for sq in occupied {
        if (their_attacks & Bitboard::from(sq)).is_empty() {
            continue;
        }
        if our_king == Some(sq) {
            score += KING_ATTACKED_BONUS;
        } else {
            attacked_pieces += 1;
        }
    }
    score += attacked_pieces * ATTACKED_PIECE_BONUS;

    if let Some(cp) = cp {
        if cp.abs() < BALANCED_CP_WINDOW {
            score += BALANCED_POSITION_BONUS;
        }
    }

    score
}

fn attacks_from(role: Role, sq: Square, color: Color, occupied: Bitboard) -> Bitboard {
    match role {
        Role::Pawn => attacks::pawn_attacks(color, sq),
        Role::Knight => attacks::knight_attacks(sq),
        Role::Bishop => attacks::bishop_attacks(sq, occupied),
        Role::Rook => attacks::rook_attacks(sq, occupied),
        Role::Queen => attacks::queen_attacks(sq, occupied),
        Role::King => attacks::king_attacks(sq),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedOracle;

    // Fool's mate: white is checkmated.
    const CHECKMATED_FEN: &str =
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    // Black to move with no legal moves and no check.
    const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

    fn mate(m: i32) -> Analysis {
        Analysis {
            mate: Some(m),
            cp: None,
        }
    }

    #[test]
    fn test_checkmated_board_scores_zero() {
        let cand = Candidate::from_fen(CHECKMATED_FEN).unwrap();
        let mut oracle = ScriptedOracle::new();
        assert_eq!(evaluate_board(&mut oracle, &cand, &GaConfig::default()), 0);
    }

    #[test]
    fn test_stalemated_board_scores_zero() {
        let cand = Candidate::from_fen(STALEMATE_FEN).unwrap();
        let mut oracle = ScriptedOracle::new();
        assert_eq!(evaluate_board(&mut oracle, &cand, &GaConfig::default()), 0);
    }

    #[test]
    fn test_oracle_failure_downgrades_to_zero() {
        let cand = Candidate::from_start();
        let mut oracle = ScriptedOracle::failing();
        assert_eq!(evaluate_board(&mut oracle, &cand, &GaConfig::default()), 0);
    }

    #[test]
    fn test_mate_bands_do_not_overlap() {
        let pos = Candidate::from_start();
        let config = GaConfig::default();

        let mate_in_1 = score_position(pos.position(), mate(1), &config);
        let mate_in_6 = score_position(pos.position(), mate(6), &config);
        let tactical = score_position(
            pos.position(),
            Analysis {
                mate: None,
                cp: Some(20),
            },
            &config,
        );

        assert_eq!(mate_in_1, 990);
        assert_eq!(mate_in_6, 940);
        assert!(mate_in_1 > mate_in_6);
        assert!(mate_in_6 > tactical);
        assert!(tactical >= 0);
    }

    #[test]
    fn test_mate_outside_window_scores_lower() {
        let pos = Candidate::from_start();
        let config = GaConfig {
            target_mate_depths: vec![1, 2, 3],
            ..GaConfig::default()
        };
        let inside = score_position(pos.position(), mate(3), &config);
        let outside = score_position(pos.position(), mate(4), &config);
        assert_eq!(inside, 970);
        assert_eq!(outside, 460);
    }

    #[test]
    fn test_getting_mated_is_not_rewarded_as_mate() {
        let pos = Candidate::from_start();
        let config = GaConfig::default();
        // Negative mate distance means the side to move is being mated;
        // that is tactical-tension territory, not a puzzle.
        let score = score_position(pos.position(), mate(-2), &config);
        assert!(score < MATE_OUTSIDE_TARGET_BASE - 6 * MATE_DISTANCE_PENALTY);
    }

    #[test]
    fn test_balanced_eval_bonus() {
        let pos = Candidate::from_start();
        let config = GaConfig::default();
        let balanced = score_position(
            pos.position(),
            Analysis {
                mate: None,
                cp: Some(50),
            },
            &config,
        );
        let decided = score_position(
            pos.position(),
            Analysis {
                mate: None,
                cp: Some(900),
            },
            &config,
        );
        assert_eq!(balanced - decided, BALANCED_POSITION_BONUS);
    }
}
