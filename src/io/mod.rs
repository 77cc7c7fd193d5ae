//! Reading and writing game descriptions.
//!
//! Two textual formats are supported: the PGSolver format (with the
//! comma-separated multi-color extension for generalized parity games) and
//! an extended-HOA subset for parity games with labelled transitions.

pub mod hoa;
pub mod pgsolver;

use crate::error::{Error, Result};
use crate::game::arena::Arena;

/// The input format of a game description.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    /// PGSolver format, one vertex per line after a `parity N;` header.
    Pgsolver,
    /// Extended HOA format with transition-based parity acceptance.
    Hoa,
}

/// Detects the format of a game description from its first non-blank token.
pub fn detect_format(input: &str) -> Result<Format> {
    for line in input.lines() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            None => continue,
            Some(token) if token.starts_with("HOA:") => return Ok(Format::Hoa),
            Some("parity") => return Ok(Format::Pgsolver),
            Some(token) => {
                return Err(Error::malformed(format!(
                    "cannot detect game format from leading token {:?}",
                    token
                )))
            }
        }
    }
    Err(Error::malformed("empty game description"))
}

/// Parses a game description, auto-detecting its format.
pub fn parse_game(input: &str) -> Result<(Arena, Format)> {
    let format = detect_format(input)?;
    let arena = match format {
        Format::Pgsolver => pgsolver::parse(input)?,
        Format::Hoa => hoa::parse(input)?,
    };
    Ok((arena, format))
}
