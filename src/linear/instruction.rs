//! Instruction set of the linear encoding.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Action;
use crate::error::StructuralError;

/// Name of a subroutine: a letter from `A` to `N`.
///
/// Serialized as its letter; deserializing any other character fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Symbol(u8);

impl Symbol {
    /// Every letter a subroutine may be named with.
    pub const ALPHABET: [char; 14] = [
        'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N',
    ];

    /// The symbol at `index` in [`Symbol::ALPHABET`].
    #[must_use]
    pub fn new(index: usize) -> Option<Self> {
        (index < Self::ALPHABET.len()).then_some(Self(index as u8))
    }

    /// Parse a letter of the alphabet.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALPHABET
            .iter()
            .position(|&a| a == c)
            .and_then(Self::new)
    }

    /// Position in the alphabet.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The letter.
    #[must_use]
    pub fn as_char(self) -> char {
        Self::ALPHABET[self.index()]
    }
}

impl TryFrom<char> for Symbol {
    type Error = StructuralError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Self::from_char(c).ok_or(StructuralError::UnknownSymbol(c))
    }
}

impl From<Symbol> for char {
    fn from(symbol: Symbol) -> Self {
        symbol.as_char()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Branch of a conditional: an action or a subroutine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Perform an action.
    Act(Action),
    /// Run a subroutine, then continue after the conditional.
    Call(Symbol),
}

impl Target {
    /// A uniformly random target from `actions` and `symbols`.
    ///
    /// `actions` must not be empty.
    pub(crate) fn random<R: Rng>(actions: &[Action], symbols: &[Symbol], rng: &mut R) -> Self {
        let idx = rng.random_range(0..actions.len() + symbols.len());
        match idx.checked_sub(actions.len()) {
            Some(s) => Self::Call(symbols[s]),
            None => Self::Act(actions[idx]),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Act(action) => write!(f, "{action}"),
            Self::Call(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// One line of a linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// A primitive action.
    Act(Action),
    /// Branch on the food sensor.
    IfFoodAhead {
        /// Taken when food is directly ahead.
        then: Target,
        /// Taken otherwise.
        otherwise: Target,
    },
    /// Start of a subroutine body; also ends the preceding segment.
    Label(Symbol),
}

impl Instruction {
    /// Whether this is a conditional.
    #[must_use]
    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::IfFoodAhead { .. })
    }

    /// Random main-program instruction.
    ///
    /// Each action and the conditional are equally likely; conditional
    /// targets draw from `actions` and the defined `symbols`.
    pub(crate) fn random_main<R: Rng>(actions: &[Action], symbols: &[Symbol], rng: &mut R) -> Self {
        let idx = rng.random_range(0..=actions.len());
        match actions.get(idx) {
            Some(&action) => Self::Act(action),
            None => Self::IfFoodAhead {
                then: Target::random(actions, symbols, rng),
                otherwise: Target::random(actions, symbols, rng),
            },
        }
    }

    /// Random subroutine instruction: an action only.
    pub(crate) fn random_simple<R: Rng>(actions: &[Action], rng: &mut R) -> Self {
        Self::Act(actions.choose(rng).copied().unwrap_or(Action::Move))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Act(action) => write!(f, "{action}"),
            Self::IfFoodAhead { then, otherwise } => {
                write!(f, "IF FOOD_AHEAD ? {then} : {otherwise}")
            }
            Self::Label(symbol) => write!(f, "* SR {symbol}:"),
        }
    }
}
