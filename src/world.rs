//! The grid world: positions, headings, the static food layout and the
//! per-evaluation visitation overlay.
//!
//! Coordinates are `(row, col)` with the origin in the north-west corner.
//! Moving north decreases `row`, moving east increases `col`. The grid never
//! wraps: every step that would leave it is reported as blocked.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Edge length of the grid the Santa Fe trail is laid out on.
pub const SANTA_FE_SIZE: usize = 32;

/// The Santa Fe trail: 89 food cells on a 32x32 grid, as `(row, col)`.
#[rustfmt::skip]
pub const SANTA_FE_TRAIL: [(usize, usize); 89] = [
    (0, 1), (0, 2), (0, 3), (1, 3), (2, 3), (3, 3), (4, 3), (5, 3), (5, 4), (5, 5), (5, 6),
    (5, 8), (5, 9), (5, 10), (5, 11), (5, 12), (6, 12), (7, 12), (8, 12), (9, 12),
    (11, 12), (12, 12), (13, 12), (14, 12), (17, 12), (18, 12), (19, 12), (20, 12), (21, 12),
    (22, 12), (23, 12), (24, 11), (24, 10), (24, 9), (24, 8), (24, 7), (24, 4), (24, 3), (25, 1),
    (26, 1), (27, 1), (28, 1), (30, 2), (30, 3), (30, 4), (30, 5), (29, 7), (28, 7), (27, 8),
    (27, 9), (27, 10), (27, 11), (27, 12), (27, 13), (27, 14), (26, 16), (25, 16), (24, 16),
    (21, 16), (20, 16), (19, 16), (18, 16), (15, 17), (14, 20), (13, 20), (10, 20), (9, 20),
    (8, 20), (7, 20), (5, 21), (5, 22), (4, 24), (3, 24), (2, 25), (2, 26), (2, 27), (3, 29),
    (4, 29), (6, 29), (9, 29), (12, 29), (14, 28), (14, 27), (14, 26), (15, 23), (18, 24),
    (19, 27), (22, 26), (23, 23),
];

/// A cell on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row index, growing southward.
    pub row: usize,
    /// Column index, growing eastward.
    pub col: usize,
}

impl Position {
    /// The north-west corner, where every agent starts.
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    /// Create a position.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

/// Compass heading of the agent.
///
/// Variants are ordered clockwise starting at north, so turning is modular
/// arithmetic on the discriminant. Diagonal headings only occur when the
/// half-turn actions are in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Heading {
    /// Toward row 0.
    North,
    /// North-east diagonal.
    NorthEast,
    /// Toward increasing column; the starting heading.
    #[default]
    East,
    /// South-east diagonal.
    SouthEast,
    /// Toward increasing row.
    South,
    /// South-west diagonal.
    SouthWest,
    /// Toward column 0.
    West,
    /// North-west diagonal.
    NorthWest,
}

impl Heading {
    /// All headings, clockwise from north.
    pub const ALL: [Self; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn rotated(self, eighths: usize) -> Self {
        Self::ALL[(self.index() + eighths) % 8]
    }

    /// `true` for north, east, south and west.
    #[must_use]
    pub fn is_cardinal(self) -> bool {
        self.index() % 2 == 0
    }

    /// Row and column deltas of one step along this heading.
    #[must_use]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::North => (-1, 0),
            Self::NorthEast => (-1, 1),
            Self::East => (0, 1),
            Self::SouthEast => (1, 1),
            Self::South => (1, 0),
            Self::SouthWest => (1, -1),
            Self::West => (0, -1),
            Self::NorthWest => (-1, -1),
        }
    }

    /// Turn right: 90° from a cardinal heading, or to the next cardinal
    /// heading clockwise from a diagonal one.
    #[must_use]
    pub fn right(self) -> Self {
        if self.is_cardinal() {
            self.rotated(2)
        } else {
            self.rotated(1)
        }
    }

    /// Turn left: 90° from a cardinal heading, or to the next cardinal
    /// heading counter-clockwise from a diagonal one.
    #[must_use]
    pub fn left(self) -> Self {
        if self.is_cardinal() {
            self.rotated(6)
        } else {
            self.rotated(7)
        }
    }

    /// Turn 45° clockwise.
    #[must_use]
    pub fn half_right(self) -> Self {
        self.rotated(1)
    }

    /// Turn 45° counter-clockwise.
    #[must_use]
    pub fn half_left(self) -> Self {
        self.rotated(7)
    }

    /// Exactly 90° clockwise, regardless of the current heading.
    #[must_use]
    pub fn quarter_clockwise(self) -> Self {
        self.rotated(2)
    }
}

/// The static food layout of a square grid.
///
/// Read-only for the duration of a run and shared by every evaluation.
/// Evaluations mark visits on a [`VisitMap`] obtained from [`FoodGrid::overlay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodGrid {
    size: usize,
    food: Vec<bool>,
}

impl FoodGrid {
    /// An empty `size` x `size` grid.
    #[must_use]
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            food: vec![false; size * size],
        }
    }

    /// A grid with food on the given cells.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FoodOutOfBounds`] if any cell lies outside the grid.
    pub fn with_food<I, P>(size: usize, cells: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: Into<Position>,
    {
        let mut grid = Self::empty(size);
        for cell in cells {
            let pos = cell.into();
            if !grid.contains(pos) {
                return Err(ConfigError::FoodOutOfBounds {
                    row: pos.row,
                    col: pos.col,
                    size,
                });
            }
            let idx = grid.index(pos);
            grid.food[idx] = true;
        }
        Ok(grid)
    }

    /// The 32x32 Santa Fe trail.
    #[must_use]
    pub fn santa_fe() -> Self {
        let mut grid = Self::empty(SANTA_FE_SIZE);
        for (row, col) in SANTA_FE_TRAIL {
            let idx = grid.index(Position::new(row, col));
            grid.food[idx] = true;
        }
        grid
    }

    /// A grid with `count` food cells at distinct random positions.
    ///
    /// `count` is clamped to the number of cells.
    #[must_use]
    pub fn random<R: Rng>(size: usize, count: usize, rng: &mut R) -> Self {
        let mut grid = Self::empty(size);
        let area = size * size;
        for idx in rand::seq::index::sample(rng, area, count.min(area)) {
            grid.food[idx] = true;
        }
        grid
    }

    /// Edge length of the grid.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of food cells.
    #[must_use]
    pub fn food_count(&self) -> usize {
        self.food.iter().filter(|&&f| f).count()
    }

    /// Whether `pos` lies on the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    /// Whether `pos` holds food. Off-grid positions never do.
    #[inline]
    #[must_use]
    pub fn has_food(&self, pos: Position) -> bool {
        self.contains(pos) && self.food[self.index(pos)]
    }

    /// The cell `distance` steps from `pos` along `heading`, or `None` if the
    /// path leaves the grid.
    #[must_use]
    pub fn step(&self, pos: Position, heading: Heading, distance: usize) -> Option<Position> {
        let (dr, dc) = heading.offset();
        let row = pos.row.checked_add_signed(dr * distance as isize)?;
        let col = pos.col.checked_add_signed(dc * distance as isize)?;
        let next = Position { row, col };
        self.contains(next).then_some(next)
    }

    /// The food sensor: whether the cell directly ahead holds food.
    #[must_use]
    pub fn food_ahead(&self, pos: Position, heading: Heading) -> bool {
        self.step(pos, heading, 1)
            .is_some_and(|ahead| self.has_food(ahead))
    }

    /// Food positions in row-major order.
    #[must_use]
    pub fn food_cells(&self) -> Vec<Position> {
        (0..self.food.len())
            .filter(|&idx| self.food[idx])
            .map(|idx| Position::new(idx / self.size, idx % self.size))
            .collect()
    }

    /// A fresh visitation overlay for one evaluation.
    #[must_use]
    pub fn overlay(&self) -> VisitMap {
        VisitMap {
            size: self.size,
            cells: self
                .food
                .iter()
                .map(|&f| if f { Cell::Food } else { Cell::Empty })
                .collect(),
        }
    }

    #[inline]
    fn index(&self, pos: Position) -> usize {
        pos.row * self.size + pos.col
    }
}

/// State of one cell in a [`VisitMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// No food, not visited.
    Empty,
    /// Food not yet visited.
    Food,
    /// Visited by the agent (food or not).
    Visited,
}

/// Disposable visitation overlay over a [`FoodGrid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitMap {
    size: usize,
    cells: Vec<Cell>,
}

impl VisitMap {
    /// Edge length of the grid.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// State of the cell at `pos`, or `None` if off the grid.
    #[must_use]
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        (pos.row < self.size && pos.col < self.size)
            .then(|| self.cells[pos.row * self.size + pos.col])
    }

    /// Mark `pos` as visited. Off-grid positions are ignored.
    pub fn visit(&mut self, pos: Position) {
        if pos.row < self.size && pos.col < self.size {
            self.cells[pos.row * self.size + pos.col] = Cell::Visited;
        }
    }

    /// Number of food cells not yet visited.
    #[must_use]
    pub fn remaining_food(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Food).count()
    }
}

/// How the food layout of a run is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoodLayout {
    /// The built-in Santa Fe trail (requires a grid of at least 32x32).
    #[default]
    SantaFe,
    /// An explicit list of `(row, col)` cells.
    Cells {
        /// Food cells.
        cells: Vec<(usize, usize)>,
    },
    /// Randomly placed food; the count is drawn from `[min, max]`.
    ///
    /// Unset bounds default to `area / 20` and `area / 15`.
    Random {
        /// Fewest food cells.
        #[serde(default)]
        min: Option<usize>,
        /// Most food cells.
        #[serde(default)]
        max: Option<usize>,
    },
}

impl FoodLayout {
    /// Build the grid for this layout.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a cell is off the grid or the random
    /// bounds are inverted.
    pub fn build<R: Rng>(&self, size: usize, rng: &mut R) -> Result<FoodGrid, ConfigError> {
        match self {
            Self::SantaFe => FoodGrid::with_food(size, SANTA_FE_TRAIL),
            Self::Cells { cells } => FoodGrid::with_food(size, cells.iter().copied()),
            Self::Random { min, max } => {
                let (min, max) = Self::random_bounds(size, *min, *max)?;
                let count = rng.random_range(min..=max);
                Ok(FoodGrid::random(size, count, rng))
            }
        }
    }

    fn random_bounds(
        size: usize,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(usize, usize), ConfigError> {
        let area = size * size;
        let min = min.unwrap_or(area / 20);
        let max = max.unwrap_or(area / 15);
        if min > max {
            return Err(ConfigError::invalid(
                "food_layout.min",
                min,
                "must not exceed food_layout.max",
            ));
        }
        if max > area {
            return Err(ConfigError::invalid(
                "food_layout.max",
                max,
                "exceeds the number of grid cells",
            ));
        }
        Ok((min, max))
    }
}
