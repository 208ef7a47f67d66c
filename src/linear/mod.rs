//! Linear genome encoding: a main program plus labelled subroutines that
//! conditionals may call.

mod crossover;
mod instruction;
mod mutation;
mod program;
mod text;

pub use crossover::{crossover, exchange_subroutines, one_point, two_point};
pub use instruction::{Instruction, Symbol, Target};
pub use mutation::mutate;
pub use program::{LinearGenome, Subroutine};
pub use text::parse_linear;
