//! Text form of linear programs.
//!
//! One instruction per line, as produced by the [`Display`](std::fmt::Display)
//! implementation of [`LinearGenome`]:
//!
//! ```text
//! IF FOOD_AHEAD ? MOVE : A
//! RIGHT
//! * SR A:
//! LEFT
//! MOVE
//! ```
//!
//! Blank lines and surrounding whitespace are ignored.

use std::str::FromStr;

use super::instruction::{Instruction, Symbol, Target};
use super::program::LinearGenome;
use crate::agent::Action;
use crate::error::{ConfigError, Error, ProgramTextError, StructuralError};

const CONDITIONAL_PREFIX: &str = "IF FOOD_AHEAD ?";

fn parse_target(token: &str, line: usize) -> Result<Target, ProgramTextError> {
    if let Some(action) = Action::from_name(token) {
        return Ok(Target::Act(action));
    }
    let mut chars = token.chars();
    let symbol = match (chars.next(), chars.next()) {
        (Some(c), None) => Symbol::from_char(c),
        _ => None,
    };
    symbol.map(Target::Call).ok_or_else(|| ProgramTextError::UnknownSymbol {
        line,
        symbol: token.to_string(),
    })
}

fn parse_line(text: &str, line: usize) -> Result<Instruction, ProgramTextError> {
    if let Some(rest) = text.strip_prefix(CONDITIONAL_PREFIX) {
        let (then, otherwise) =
            rest.split_once(':')
                .ok_or_else(|| ProgramTextError::MalformedConditional {
                    line,
                    text: text.to_string(),
                })?;
        let (then, otherwise) = (then.trim(), otherwise.trim());
        if then.is_empty() || otherwise.is_empty() {
            return Err(ProgramTextError::MalformedConditional {
                line,
                text: text.to_string(),
            });
        }
        return Ok(Instruction::IfFoodAhead {
            then: parse_target(then, line)?,
            otherwise: parse_target(otherwise, line)?,
        });
    }

    if let Some(rest) = text.strip_prefix('*') {
        let malformed = || ProgramTextError::MalformedLabel {
            line,
            text: text.to_string(),
        };
        let name = rest
            .trim_start()
            .strip_prefix("SR")
            .and_then(|r| r.trim().strip_suffix(':'))
            .map(str::trim)
            .ok_or_else(malformed)?;
        return match parse_target(name, line)? {
            Target::Call(symbol) => Ok(Instruction::Label(symbol)),
            Target::Act(_) => Err(malformed()),
        };
    }

    Action::from_name(text)
        .map(Instruction::Act)
        .ok_or_else(|| ProgramTextError::UnknownInstruction {
            line,
            text: text.to_string(),
        })
}

/// Parse a linear program.
///
/// Labels must be unique, subroutine bodies may only hold actions, and every
/// called symbol must be defined. Length bounds are not checked here; use
/// [`Genome::check`](crate::genome::Genome::check) with a configuration.
///
/// # Errors
///
/// Returns [`Error::ProgramText`] for malformed lines,
/// [`ConfigError::UnresolvedSubroutine`] for a call to an undefined
/// subroutine, and [`Error::Structure`] for duplicate labels or conditionals
/// inside subroutines.
pub fn parse_linear(text: &str) -> Result<LinearGenome, Error> {
    let mut instructions = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        instructions.push(parse_line(trimmed, idx + 1)?);
    }
    if instructions.is_empty() {
        return Err(ProgramTextError::Empty.into());
    }
    let genome = LinearGenome::from_instructions(instructions);
    match genome.check_links() {
        Ok(()) => Ok(genome),
        Err(StructuralError::UnresolvedSubroutine(symbol)) => {
            Err(ConfigError::UnresolvedSubroutine(symbol).into())
        }
        Err(err) => Err(err.into()),
    }
}

impl FromStr for LinearGenome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_linear(s)
    }
}
