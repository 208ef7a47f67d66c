//! Error types.
//!
//! Configuration problems and malformed program text are reported before a run
//! starts. [`StructuralError`] describes a genome outside its declared bounds;
//! the variation operators prevent these by construction, so observing one
//! points at a logic defect rather than bad input.
//!
//! Simulation limits (step budget, trail cap) are not errors. They surface as
//! [`Termination`](crate::simulation::Termination) reasons.

use thiserror::Error;

/// Invalid run or genome configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric parameter is outside its permitted range.
    #[error("invalid value for `{field}`: {value} ({reason})")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value, rendered as text.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// A conditional references a subroutine that the genome does not define.
    #[error("conditional references undefined subroutine `{0}`")]
    UnresolvedSubroutine(char),
    /// A food coordinate lies outside the grid.
    #[error("food cell ({row}, {col}) lies outside a {size}x{size} grid")]
    FoodOutOfBounds {
        /// Row of the food cell.
        row: usize,
        /// Column of the food cell.
        col: usize,
        /// Edge length of the grid.
        size: usize,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),
    /// The configuration file is not valid TOML for [`Settings`](crate::config::Settings).
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl std::fmt::Display,
        reason: &'static str,
    ) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

/// Failure to parse a program from its text form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramTextError {
    /// The input contains no instructions.
    #[error("program text is empty")]
    Empty,
    /// A line does not name a known instruction or opcode.
    #[error("line {line}: unknown instruction `{text}`")]
    UnknownInstruction {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },
    /// A conditional line is not of the form `IF FOOD_AHEAD ? <a> : <b>`.
    #[error("line {line}: malformed conditional `{text}`")]
    MalformedConditional {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },
    /// A label line is not of the form `* SR <letter>:`.
    #[error("line {line}: malformed subroutine label `{text}`")]
    MalformedLabel {
        /// 1-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },
    /// A subroutine symbol outside the supported alphabet.
    #[error("line {line}: `{symbol}` is not a subroutine symbol")]
    UnknownSymbol {
        /// 1-based line number.
        line: usize,
        /// The rejected symbol.
        symbol: String,
    },
    /// A tree outline ended before every function node received its children.
    #[error("tree text ended early: expected {missing} more node(s)")]
    Truncated {
        /// Number of nodes still required.
        missing: usize,
    },
    /// A tree outline continues after the root subtree was complete.
    #[error("line {line}: unexpected node after the complete tree")]
    TrailingNodes {
        /// 1-based line number of the first surplus node.
        line: usize,
    },
}

/// A genome that violates its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Main program length outside `[min, max]`.
    #[error("main program has {len} instructions, expected {min}..={max}")]
    MainLength {
        /// Actual length.
        len: usize,
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },
    /// Subroutine body length outside `[min, max]`.
    #[error("subroutine `{symbol}` has {len} instructions, expected {min}..={max}")]
    SubroutineLength {
        /// Subroutine symbol.
        symbol: char,
        /// Actual length.
        len: usize,
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },
    /// More subroutines than permitted.
    #[error("genome defines {count} subroutines, at most {max} allowed")]
    TooManySubroutines {
        /// Actual count.
        count: usize,
        /// Upper bound.
        max: usize,
    },
    /// Two labels share a symbol.
    #[error("subroutine `{0}` is defined more than once")]
    DuplicateSubroutine(char),
    /// A conditional appears inside a subroutine body.
    #[error("subroutine `{0}` contains a conditional")]
    ConditionalInSubroutine(char),
    /// A conditional references an undefined subroutine.
    #[error("conditional references undefined subroutine `{0}`")]
    UnresolvedSubroutine(char),
    /// A stored subroutine symbol outside the alphabet.
    #[error("`{0}` is not a subroutine symbol")]
    UnknownSymbol(char),
    /// A node's child count does not match its opcode.
    #[error("node `{opcode}` has {actual} children, expected {expected}")]
    Arity {
        /// Opcode name.
        opcode: &'static str,
        /// Required child count.
        expected: usize,
        /// Actual child count.
        actual: usize,
    },
    /// A child index does not point at a live node.
    #[error("tree references a node that is not in the arena")]
    DanglingNode,
    /// Tree height exceeds the configured maximum.
    #[error("tree height {height} exceeds maximum depth {max}")]
    TooDeep {
        /// Actual height.
        height: usize,
        /// Upper bound.
        max: usize,
    },
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// See [`ConfigError`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// See [`ProgramTextError`].
    #[error(transparent)]
    ProgramText(#[from] ProgramTextError),
    /// See [`StructuralError`].
    #[error(transparent)]
    Structure(#[from] StructuralError),
}
