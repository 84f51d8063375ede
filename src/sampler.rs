// src/sampler.rs

use std::io;

use rand::seq::SliceRandom;
use rand::Rng;
use shakmaty::{Chess, Move, Position};

use crate::board::Candidate;
use crate::constants::{
    MAX_SAMPLE_CAPTURES, MAX_SAMPLE_PLIES, MIN_SAMPLE_PLIES, TACTICAL_MOVE_CHANCE,
};

pub fn gives_check(pos: &Chess, m: Move) -> bool {
    let mut next = pos.clone();
    next.play_unchecked(m);
    next.is_check()
}

/// A move is tactical if it captures or gives check.
pub fn is_tactical(pos: &Chess, m: Move) -> bool {
    m.is_capture() || gives_check(pos, m)
}

/// Grows a randomized candidate by 5-10 plies of semi-random play from the
/// seed FEN (standard start when `None`). Play is biased toward tactical
/// moves, but after three captures quiet moves are preferred so the board
/// does not strip itself bare. Always returns a legal board; if the seed is
/// already game over the candidate comes back untouched.
pub fn random_board(seed_fen: Option<&str>, rng: &mut impl Rng) -> io::Result<Candidate> {
    let mut cand = match seed_fen {
        Some(fen) => Candidate::from_fen(fen)?,
        None => Candidate::from_start(),
    };

    let plies = rng.gen_range(MIN_SAMPLE_PLIES..=MAX_SAMPLE_PLIES);
    let mut captures = 0;

    for _ in 0..plies {
        if cand.is_game_over() {
            break;
        }
        let legal = cand.legal_moves();
        if legal.is_empty() {
            break;
        }

        let tactical: Vec<Move> = legal
            .iter()
            .filter(|m| is_tactical(cand.position(), **m))
            .copied()
            .collect();

        let chosen = if captures >= MAX_SAMPLE_CAPTURES {
            // Enough material has come off; settle the position down.
            let quiet: Vec<Move> = legal
                .iter()
                .filter(|m| !tactical.contains(m))
                .copied()
                .collect();
            match quiet.choose(rng) {
                Some(m) => *m,
                None => legal[rng.gen_range(0..legal.len())],
            }
        } else if !tactical.is_empty() && rng.gen_bool(TACTICAL_MOVE_CHANCE) {
            let m = tactical[rng.gen_range(0..tactical.len())];
            if m.is_capture() {
                captures += 1;
            }
            m
        } else {
            legal[rng.gen_range(0..legal.len())]
        };

        cand.push(chosen);
    }

    Ok(cand)
}
