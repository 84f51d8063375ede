// src/ga.rs

use std::cmp::Reverse;
use std::collections::HashSet;
use std::io;

use rand::seq::SliceRandom;
use rand::Rng;
use shakmaty::Move;
use tracing::{debug, info};

use crate::board::Candidate;
use crate::config::GaConfig;
use crate::constants::STARTING_POSITIONS;
use crate::engine::Oracle;
use crate::fitness::evaluate_board;
use crate::puzzle::{verify_candidate, Puzzle};
use crate::sampler::{is_tactical, random_board};

/// Drives the genetic search over one shared engine oracle.
/// One run is one seed FEN, a fixed-size population and a bounded number of
/// generations; the best candidate ever seen is the result, whichever
/// generation produced it.
pub struct Evolution<'e> {
    oracle: &'e mut dyn Oracle,
    config: GaConfig,
}

impl<'e> Evolution<'e> {
    pub fn new(oracle: &'e mut dyn Oracle, config: GaConfig) -> Self {
        Self { oracle, config }
    }

    /// Runs the full genetic search from one seed FEN and returns the
    /// best-ever `(fitness, candidate)` pair across all generations.
    pub fn run(&mut self, seed_fen: &str, rng: &mut impl Rng) -> io::Result<(i32, Candidate)> {
        if self.config.population_size == 0 || self.config.generations == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "population size and generation count must be at least 1",
            ));
        }

        let mut population = self.initial_population(seed_fen, rng)?;
        let mut best_overall: Option<(i32, Candidate)> = None;

        for generation in 0..self.config.generations {
            let scored = self.evaluate(&population);
            let best_fitness = scored[0].0;
            info!(
                generation,
                best_fitness,
                total = self.config.generations,
                "generation evaluated"
            );

            if best_overall
                .as_ref()
                .map_or(true, |(fitness, _)| best_fitness > *fitness)
            {
                debug!(best_fitness, "new best candidate");
                best_overall = Some((best_fitness, scored[0].1.clone()));
            }

            if best_fitness >= self.config.excellent_fitness {
                info!(best_fitness, "excellent candidate found, stopping early");
                break;
            }

            population = self.next_generation(scored, seed_fen, rng)?;
        }

        best_overall.ok_or_else(|| io::Error::new(io::ErrorKind::Other, "search produced no candidate"))
    }

    fn initial_population(
        &mut self,
        seed_fen: &str,
        rng: &mut impl Rng,
    ) -> io::Result<Vec<Candidate>> {
        (0..self.config.population_size)
            .map(|_| random_board(Some(seed_fen), rng))
            .collect()
    }

    /// Scores every member and ranks the generation best-first. The sort is
    /// stable, so equal scores keep their evaluation order.
    fn evaluate(&mut self, population: &[Candidate]) -> Vec<(i32, Candidate)> {
        let mut scored: Vec<(i32, Candidate)> = population
            .iter()
            .map(|cand| (evaluate_board(self.oracle, cand, &self.config), cand.clone()))
            .collect();
        scored.sort_by_key(|(score, _)| Reverse(*score));
        scored
    }

    /// Builds the next generation from a ranked one: the generation's best
    /// board is carried over unmutated, a fresh sample is injected with
    /// small probability, and the rest is bred from the surviving top half.
    /// A generation with no positive-fitness survivors is reseeded
    /// wholesale instead of breeding from a dead pool.
    fn next_generation(
        &mut self,
        scored: Vec<(i32, Candidate)>,
        seed_fen: &str,
        rng: &mut impl Rng,
    ) -> io::Result<Vec<Candidate>> {
        let size = self.config.population_size;

        let survivors: Vec<Candidate> = scored
            .iter()
            .take(size / 2)
            .filter(|(score, _)| *score > 0)
            .map(|(_, cand)| cand.clone())
            .collect();

        if survivors.is_empty() {
            info!("no survivors with positive fitness, reseeding population");
            return self.initial_population(seed_fen, rng);
        }

        let mut next = Vec::with_capacity(size);
        next.push(scored[0].1.clone());

        if next.len() < size && rng.gen_bool(self.config.fresh_blood_chance) {
            next.push(random_board(Some(seed_fen), rng)?);
        }

        while next.len() < size {
            let parent1 = survivors.choose(rng).unwrap();
            let parent2 = survivors.choose(rng).unwrap();
            let mut child = crossover(parent1, parent2, rng);
            if rng.gen_bool(self.config.mutation_chance) {
                child = mutate(&child, rng);
            }
            next.push(child);
        }

        Ok(next)
    }
}

/// Splices two parents' move histories onto a fresh board: parent A's
/// history up to a random split, then 1-3 moves of parent B's, stopping at
/// the first move that is no longer legal. Parents grown from different
/// seeds, or any replay failure, fall back to a copy of parent A.
pub fn crossover(a: &Candidate, b: &Candidate, rng: &mut impl Rng) -> Candidate {
    if a.starting_fen() != b.starting_fen() {
        return a.clone();
    }
    let mut child = match Candidate::from_fen(a.starting_fen()) {
        Ok(child) => child,
        Err(_) => return a.clone(),
    };

    let split = rng.gen_range(0..=a.history().len());
    for &m in &a.history()[..split] {
        if child.legal_moves().contains(&m) {
            child.push(m);
        } else {
            break;
        }
    }

    if !b.history().is_empty() {
        let count = rng.gen_range(1..=b.history().len().min(3));
        for &m in &b.history()[..count] {
            if child.legal_moves().contains(&m) {
                child.push(m);
            } else {
                break;
            }
        }
    }

    child
}

/// Plays 1-2 extra tactical-preferring moves on an owned copy of the
/// candidate. A visited-FEN set rejects moves that recreate a position
/// already seen in this call, which keeps trivial shuffles out of the
/// offspring (best effort, not a full repetition check).
pub fn mutate(cand: &Candidate, rng: &mut impl Rng) -> Candidate {
    let mut mutated = cand.clone();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(mutated.fen());

    let steps = rng.gen_range(1..=2);
    for _ in 0..steps {
        if mutated.is_game_over() {
            break;
        }
        let legal = mutated.legal_moves();
        if legal.is_empty() {
            break;
        }

        let tactical: Vec<Move> = legal
            .iter()
            .filter(|m| is_tactical(mutated.position(), **m))
            .copied()
            .collect();
        let pool = if tactical.is_empty() { &legal } else { &tactical };
        let m = pool[rng.gen_range(0..pool.len())];

        let before = mutated.clone();
        mutated.push(m);
        if !visited.insert(mutated.fen()) {
            mutated = before;
        }
    }

    mutated
}

/// The whole pipeline as one call: pick a seed, evolve, verify the winner
/// with the engine, and assemble the JSON-serializable puzzle record. The
/// verifier's confirmation is the only source of truth for `mate_in`; the
/// evolver's fitness score is reported but never trusted as such.
pub fn generate_puzzle(
    oracle: &mut dyn Oracle,
    config: &GaConfig,
    seed_fen: Option<&str>,
    rng: &mut impl Rng,
) -> io::Result<Puzzle> {
    let seed = match seed_fen {
        Some(fen) => fen.to_string(),
        None => STARTING_POSITIONS[rng.gen_range(0..STARTING_POSITIONS.len())].to_string(),
    };
    info!(seed = %seed, "starting puzzle generation");

    let (fitness, best) = Evolution::new(oracle, config.clone()).run(&seed, rng)?;
    info!(fitness, fen = %best.fen(), "evolution finished, verifying");

    let solution = verify_candidate(oracle, &best, &config.target_mate_depths)?;
    match solution.mate_in {
        Some(n) => info!(mate_in = n, "puzzle verified"),
        None => info!("best candidate is not a confirmed mate, reporting unverified"),
    }

    Ok(Puzzle::from_parts(&best, fitness, solution))
}
