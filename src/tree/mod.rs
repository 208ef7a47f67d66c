//! Tree genome encoding: `PROGN2`/`PROGN3`/`IF_FOOD_AHEAD` functions over
//! action terminals, stored in an arena.

mod node;
mod program;
mod text;
mod variation;

pub use node::{NodeId, Opcode, TreeNode};
pub use program::TreeGenome;
pub use text::parse_tree;
pub use variation::{crossover, exchange, mutate};
