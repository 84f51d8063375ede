// Genetic Algorithm
pub const POPULATION_SIZE: usize = 20;
pub const GENERATIONS: u32 = 5;
pub const MUTATION_CHANCE: f64 = 0.5; // chance a bred child is also mutated
pub const FRESH_BLOOD_CHANCE: f64 = 0.1;

// Sampler
pub const MIN_SAMPLE_PLIES: u32 = 5;
pub const MAX_SAMPLE_PLIES: u32 = 10;
pub const TACTICAL_MOVE_CHANCE: f64 = 0.7;
pub const MAX_SAMPLE_CAPTURES: u32 = 3;

// Engine
pub const ENGINE_DEPTH: u32 = 20;
pub const DEFAULT_ENGINE_PATH: &str = "stockfish";

// --- Fitness bands ---
// Mates inside the target window land in 940..=990, mates outside it stay
// below 500, and tactical-tension scores stay under ~150, so the bands never
// overlap and ranking by raw score is stable.
pub const MATE_IN_TARGET_BASE: i32 = 1000;
pub const MATE_OUTSIDE_TARGET_BASE: i32 = 500;
pub const MATE_DISTANCE_PENALTY: i32 = 10;
pub const EXCELLENT_FITNESS: i32 = 970;

// --- Tactical tension weights ---
pub const CHECK_BONUS: i32 = 5;
pub const KING_ATTACKED_BONUS: i32 = 30;
pub const ATTACKED_PIECE_BONUS: i32 = 3;
pub const BALANCED_POSITION_BONUS: i32 = 30;
pub const BALANCED_CP_WINDOW: i32 = 200;

// Mate distances (in moves) that count as a usable puzzle.
pub const TARGET_MATE_DEPTHS: [u32; 6] = [1, 2, 3, 4, 5, 6];

/// Hand-picked tactical middlegames used to seed the population.
pub const STARTING_POSITIONS: [&str; 10] = [
    // Italian Game middlegame
    "r1bqk2r/ppp2ppp/2n2n2/4p3/2B1P3/2N2N2/PPPP1PPP/R1BQ1RK1 b kq - 2 6",
    // Ruy Lopez middlegame
    "r1bqk2r/ppp2ppp/2n2n2/3pp3/1b2P3/2N2N2/PPPP1PPP/R1BQKB1R w KQkq - 2 7",
    // Queen's Gambit declined
    "rnbqkb1r/pp2pppp/5n2/3p4/3P4/2N2N2/PPP1PPPP/R1BQKB1R w KQkq - 3 6",
    "rnbqk2r/ppp2ppp/3p1n2/8/3NP3/2N5/PPP1PPPP/R1BQKB1R w KQkq - 0 9",
    "rnbqkb1r/pp3ppp/3p1n2/8/3NP3/2N5/PPP2PPP/R1BQKB1R w KQkq - 0 9",
    "r4rk1/pp4pp/2n5/8/3p4/2N2N2/PPP3PP/R4RK1 w - - 2 25",
    "r2q1rk1/pp1bppbp/2np1np1/8/3NP3/2N1BP2/PPPQ2PP/2KR1B1R w - - 0 10",
    "rnbqkb1r/pp2pppp/5n2/3p4/3P4/2N2N2/PPP1PPPP/R1BQKR2 b kq - 2 8",
    "rnbqkb1r/pp2pp1p/3p1np1/8/3NP3/2N5/PPP2PPP/R1BQKB1R w KQkq - 0 10",
    "r1bqk2r/ppp2ppp/2n5/3pp3/1b2P3/2N2N2/PPPP1PPP/R1BQKB1R w KQkq - 0 8",
];
