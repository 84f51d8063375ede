// src/engine/mod.rs
//
// The external engine is treated as a black-box oracle behind a narrow
// trait, so any UCI-speaking binary is swappable and tests can substitute
// a scripted oracle.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, EnPassantMode, Move};
use tracing::debug;

/// Engine verdict for one position, from the side to move's perspective.
/// `mate` is a distance in moves; exactly one of the fields is set when the
/// engine reported a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Analysis {
    pub mate: Option<i32>,
    pub cp: Option<i32>,
}

/// Narrow interface over the analysis engine. Both methods run a
/// fixed-depth search; effort is bounded by depth, not wall clock.
pub trait Oracle {
    fn analyse(&mut self, pos: &Chess) -> io::Result<Analysis>;
    fn best_move(&mut self, pos: &Chess) -> io::Result<Option<Move>>;
}

pub fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// A UCI engine subprocess. One instance is shared by the whole run and the
/// child process is reaped exactly once, on `close` or on drop.
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    depth: u32,
    closed: bool,
}

impl UciEngine {
    /// Spawns the engine binary and performs the UCI handshake. On any
    /// failure after the fork, the child is killed and reaped before the
    /// error is returned, so a half-started engine is never leaked.
    pub fn spawn(path: &str, depth: u32) -> io::Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(io::ErrorKind::Other, "engine stdin unavailable"));
            }
        };
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(io::ErrorKind::Other, "engine stdout unavailable"));
            }
        };

        let mut engine = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            depth,
            closed: false,
        };

        if let Err(e) = engine.handshake() {
            let _ = engine.child.kill();
            let _ = engine.child.wait();
            engine.closed = true;
            return Err(e);
        }
        debug!(path, depth, "engine initialized");
        Ok(engine)
    }

    fn handshake(&mut self) -> io::Result<()> {
        self.send("uci")?;
        self.wait_for("uciok")?;
        self.send("setoption name Threads value 1")?;
        self.send("isready")?;
        self.wait_for("readyok")
    }

    fn send(&mut self, cmd: &str) -> io::Result<()> {
        writeln!(self.stdin, "{cmd}")?;
        self.stdin.flush()
    }

    fn wait_for(&mut self, target: &str) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes = self.reader.read_line(&mut line)?;
            if bytes == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("engine exited while waiting for '{target}'"),
                ));
            }
            if line.trim().starts_with(target) {
                return Ok(());
            }
        }
    }

    /// Runs a fixed-depth search and returns the last reported score plus
    /// the `bestmove` token.
    fn search(&mut self, pos: &Chess) -> io::Result<(Analysis, String)> {
        self.send("isready")?;
        self.wait_for("readyok")?;
        self.send(&format!("position fen {}", fen_of(pos)))?;
        self.send(&format!("go depth {}", self.depth))?;

        let mut analysis = Analysis::default();
        let mut line = String::new();
        loop {
            line.clear();
            let bytes = self.reader.read_line(&mut line)?;
            if bytes == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "engine exited during search",
                ));
            }
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(score) = parse_info_score(trimmed) {
                    analysis = score;
                }
            }

            if let Some(rest) = trimmed.strip_prefix("bestmove") {
                let token = rest.split_whitespace().next().unwrap_or("").to_string();
                return Ok((analysis, token));
            }
        }
    }

    /// Sends `quit` and reaps the subprocess. Safe to call once; later
    /// calls (and the drop backstop) are no-ops.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let _ = self.send("quit");
        self.child.wait()?;
        Ok(())
    }
}

impl Oracle for UciEngine {
    fn analyse(&mut self, pos: &Chess) -> io::Result<Analysis> {
        let (analysis, _) = self.search(pos)?;
        Ok(analysis)
    }

    fn best_move(&mut self, pos: &Chess) -> io::Result<Option<Move>> {
        let (_, token) = self.search(pos)?;
        if token.is_empty() || token == "(none)" {
            return Ok(None);
        }
        let uci: UciMove = token.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("engine sent unparsable move '{token}': {e}"),
            )
        })?;
        let m = uci.to_move(pos).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("engine sent illegal move '{token}': {e}"),
            )
        })?;
        Ok(Some(m))
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.send("quit");
            let _ = self.child.wait();
        }
    }
}

/// Extracts `score cp X` or `score mate Y` from a UCI info line.
fn parse_info_score(line: &str) -> Option<Analysis> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let idx = parts.iter().position(|&p| p == "score")?;
    match (parts.get(idx + 1), parts.get(idx + 2)) {
        (Some(&"cp"), Some(v)) => v.parse().ok().map(|cp| Analysis {
            cp: Some(cp),
            mate: None,
        }),
        (Some(&"mate"), Some(v)) => v.parse().ok().map(|m| Analysis {
            mate: Some(m),
            cp: None,
        }),
        _ => None,
    }
}

/// Deterministic oracle for tests: analyses and best moves are scripted per
/// FEN, and unknown positions fall back to an empty analysis.
#[cfg(test)]
pub struct ScriptedOracle {
    analyses: std::collections::HashMap<String, Analysis>,
    best_moves: std::collections::HashMap<String, String>,
    fail_analyse: bool,
}

#[cfg(test)]
impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            analyses: std::collections::HashMap::new(),
            best_moves: std::collections::HashMap::new(),
            fail_analyse: false,
        }
    }

    /// An oracle whose every analysis call fails, for error-path tests.
    pub fn failing() -> Self {
        let mut oracle = Self::new();
        oracle.fail_analyse = true;
        oracle
    }

    pub fn with_analysis(mut self, fen: &str, analysis: Analysis) -> Self {
        self.analyses.insert(fen.to_string(), analysis);
        self
    }

    pub fn with_best_move(mut self, fen: &str, uci: &str) -> Self {
        self.best_moves.insert(fen.to_string(), uci.to_string());
        self
    }
}

#[cfg(test)]
impl Oracle for ScriptedOracle {
    fn analyse(&mut self, pos: &Chess) -> io::Result<Analysis> {
        if self.fail_analyse {
            return Err(io::Error::new(io::ErrorKind::Other, "scripted failure"));
        }
        Ok(self
            .analyses
            .get(&fen_of(pos))
            .copied()
            .unwrap_or_default())
    }

    fn best_move(&mut self, pos: &Chess) -> io::Result<Option<Move>> {
        match self.best_moves.get(&fen_of(pos)) {
            Some(uci) => {
                let parsed: UciMove = uci.parse().map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("bad scripted move: {e}"))
                })?;
                let m = parsed.to_move(pos).map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("illegal scripted move: {e}"),
                    )
                })?;
                Ok(Some(m))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Position;

    #[test]
    fn test_parse_info_score_cp() {
        let line = "info depth 20 seldepth 28 score cp 35 nodes 123456 pv e2e4 e7e5";
        assert_eq!(
            parse_info_score(line),
            Some(Analysis {
                cp: Some(35),
                mate: None
            })
        );
    }

    #[test]
    fn test_parse_info_score_mate() {
        let line = "info depth 12 score mate 2 nodes 9999 pv d1h5 g8f6";
        assert_eq!(
            parse_info_score(line),
            Some(Analysis {
                mate: Some(2),
                cp: None
            })
        );
    }

    #[test]
    fn test_parse_info_score_negative_mate() {
        let line = "info depth 12 score mate -3 pv e1d1";
        assert_eq!(
            parse_info_score(line),
            Some(Analysis {
                mate: Some(-3),
                cp: None
            })
        );
    }

    #[test]
    fn test_parse_info_score_absent() {
        assert_eq!(parse_info_score("info depth 5 nodes 100 pv e2e4"), None);
        assert_eq!(parse_info_score("bestmove e2e4"), None);
    }

    #[test]
    fn test_scripted_oracle_is_deterministic() {
        let pos = Chess::default();
        let fen = fen_of(&pos);
        let mut oracle = ScriptedOracle::new()
            .with_analysis(&fen, Analysis { mate: Some(2), cp: None })
            .with_best_move(&fen, "e2e4");

        for _ in 0..2 {
            let analysis = oracle.analyse(&pos).unwrap();
            assert_eq!(analysis.mate, Some(2));
            let m = oracle.best_move(&pos).unwrap().unwrap();
            let mut after = pos.clone();
            after.play_unchecked(m);
            assert_eq!(after.turn(), shakmaty::Color::Black);
        }
    }

    #[test]
    fn test_scripted_oracle_unknown_position_is_empty() {
        let mut oracle = ScriptedOracle::new();
        let analysis = oracle.analyse(&Chess::default()).unwrap();
        assert_eq!(analysis, Analysis::default());
        assert!(oracle.best_move(&Chess::default()).unwrap().is_none());
    }
}
