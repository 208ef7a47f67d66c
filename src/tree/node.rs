//! Opcodes and arena nodes of the tree encoding.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::agent::Action;

new_key_type! {
    /// Index of a node in a [`TreeGenome`](super::TreeGenome) arena.
    pub struct NodeId;
}

/// The operation a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Run both children in order.
    Progn2,
    /// Run all three children in order.
    Progn3,
    /// Run the first child if food is ahead, otherwise the second.
    IfFoodAhead,
    /// Perform an action. Leaf.
    Terminal(Action),
}

impl Opcode {
    /// The function set.
    pub const FUNCTIONS: [Self; 3] = [Self::Progn2, Self::Progn3, Self::IfFoodAhead];

    /// Number of children a node with this opcode has.
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Self::Progn2 | Self::IfFoodAhead => 2,
            Self::Progn3 => 3,
            Self::Terminal(_) => 0,
        }
    }

    /// Whether this is a leaf opcode.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Name used in tree text.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Progn2 => "PROGN2",
            Self::Progn3 => "PROGN3",
            Self::IfFoodAhead => "IF_FOOD_AHEAD",
            Self::Terminal(action) => action.name(),
        }
    }

    /// Parse a name produced by [`Opcode::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PROGN2" => Some(Self::Progn2),
            "PROGN3" => Some(Self::Progn3),
            "IF_FOOD_AHEAD" => Some(Self::IfFoodAhead),
            other => Action::from_name(other).map(Self::Terminal),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a tree genome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// What the node does.
    pub opcode: Opcode,
    /// Children in evaluation order. For [`Opcode::IfFoodAhead`] the first
    /// child is the "then" branch.
    pub children: Vec<NodeId>,
}

impl TreeNode {
    /// A leaf performing `action`.
    #[must_use]
    pub fn terminal(action: Action) -> Self {
        Self {
            opcode: Opcode::Terminal(action),
            children: Vec::new(),
        }
    }
}
