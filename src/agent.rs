//! The simulated ant: its state, the primitive actions a program can issue,
//! and the trail it leaves behind.

use serde::{Deserialize, Serialize};

use crate::world::{FoodGrid, Heading, Position};

/// What happens when the agent tries to move off the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Stay in place with the heading unchanged.
    #[default]
    Stay,
    /// Stay in place and turn 90° clockwise.
    Rotate,
}

/// A primitive action issued by a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Step one cell forward.
    Move,
    /// Turn left (see [`Heading::left`]).
    Left,
    /// Turn right (see [`Heading::right`]).
    Right,
    /// Step two cells forward, recording the cell in between.
    DoubleMove,
    /// Turn 45° counter-clockwise.
    HalfLeft,
    /// Turn 45° clockwise.
    HalfRight,
}

impl Action {
    /// The basic Santa Fe action set.
    pub const BASIC: [Self; 3] = [Self::Left, Self::Right, Self::Move];

    /// Name used in program text.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::DoubleMove => "2XMOVE",
            Self::HalfLeft => "LEFT+",
            Self::HalfRight => "RIGHT+",
        }
    }

    /// Parse a name produced by [`Action::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MOVE" => Some(Self::Move),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "2XMOVE" => Some(Self::DoubleMove),
            "LEFT+" => Some(Self::HalfLeft),
            "RIGHT+" => Some(Self::HalfRight),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of cells the agent has occupied.
///
/// Starts at the agent's initial cell. A cell is only appended when it
/// differs from the last entry, so turning or a blocked move leaves no mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trail {
    cells: Vec<Position>,
}

impl Default for Trail {
    fn default() -> Self {
        Self::starting_at(Position::ORIGIN)
    }
}

impl Trail {
    /// A trail containing only `start`.
    #[must_use]
    pub fn starting_at(start: Position) -> Self {
        Self { cells: vec![start] }
    }

    /// Append `pos` unless it repeats the last entry.
    pub fn record(&mut self, pos: Position) {
        if self.cells.last() != Some(&pos) {
            self.cells.push(pos);
        }
    }

    /// Number of entries, including the starting cell.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: a trail holds at least its starting cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The visited cells, in order.
    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// The cells as `(row, col)` pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(usize, usize)> {
        self.cells.iter().map(|&p| p.into()).collect()
    }
}

/// Position and heading of the ant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    /// Current cell.
    pub position: Position,
    /// Current heading.
    pub heading: Heading,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            position: Position::ORIGIN,
            heading: Heading::East,
        }
    }
}

impl Agent {
    /// An agent at `position` facing `heading`.
    #[must_use]
    pub fn new(position: Position, heading: Heading) -> Self {
        Self { position, heading }
    }

    /// Whether the cell ahead holds food.
    #[must_use]
    pub fn senses_food(&self, grid: &FoodGrid) -> bool {
        grid.food_ahead(self.position, self.heading)
    }

    /// Carry out `action`, recording any cell entered on `trail`.
    pub fn perform(
        &mut self,
        action: Action,
        grid: &FoodGrid,
        boundary: BoundaryPolicy,
        trail: &mut Trail,
    ) {
        match action {
            Action::Left => self.heading = self.heading.left(),
            Action::Right => self.heading = self.heading.right(),
            Action::HalfLeft => self.heading = self.heading.half_left(),
            Action::HalfRight => self.heading = self.heading.half_right(),
            Action::Move => match grid.step(self.position, self.heading, 1) {
                Some(next) => {
                    self.position = next;
                    trail.record(next);
                }
                None => self.blocked(boundary),
            },
            Action::DoubleMove => {
                let far = grid.step(self.position, self.heading, 2);
                let near = grid.step(self.position, self.heading, 1);
                match (near, far) {
                    (Some(near), Some(far)) => {
                        self.position = far;
                        trail.record(near);
                        trail.record(far);
                    }
                    _ => self.blocked(boundary),
                }
            }
        }
    }

    fn blocked(&mut self, boundary: BoundaryPolicy) {
        if boundary == BoundaryPolicy::Rotate {
            self.heading = self.heading.quarter_clockwise();
        }
    }
}
