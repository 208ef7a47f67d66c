//! The linear genome and its interpreter.
//!
//! A [`LinearGenome`] is one flat instruction list. The main program runs from
//! index 0 to the first [`Instruction::Label`]; each label opens a subroutine
//! body that lasts until the next label or the end of the list.

use std::ops::Range;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::instruction::{Instruction, Symbol, Target};
use super::{crossover, mutation};
use crate::agent::{Action, Agent, BoundaryPolicy, Trail};
use crate::config::{InitLength, LinearConfig};
use crate::error::StructuralError;
use crate::genome::Genome;
use crate::world::FoodGrid;

/// Location of one subroutine inside the instruction list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    /// Its name.
    pub symbol: Symbol,
    /// Index of the label.
    pub label: usize,
    /// Indices of the body.
    pub body: Range<usize>,
}

/// A main program followed by labelled subroutines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearGenome {
    instructions: Vec<Instruction>,
}

impl LinearGenome {
    /// Wrap an instruction list as-is. Use [`Genome::check`] to validate it.
    #[must_use]
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// All instructions, labels included.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub(crate) fn instructions_mut(&mut self) -> &mut Vec<Instruction> {
        &mut self.instructions
    }

    /// Consume the genome, returning its instructions.
    #[must_use]
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Number of instructions before the first label.
    #[must_use]
    pub fn main_len(&self) -> usize {
        self.instructions
            .iter()
            .position(|i| matches!(i, Instruction::Label(_)))
            .unwrap_or(self.instructions.len())
    }

    /// The main program.
    #[must_use]
    pub fn main_program(&self) -> &[Instruction] {
        &self.instructions[..self.main_len()]
    }

    /// All subroutines in list order.
    #[must_use]
    pub fn subroutines(&self) -> Vec<Subroutine> {
        let mut subs: Vec<Subroutine> = Vec::new();
        for (idx, instruction) in self.instructions.iter().enumerate() {
            if let Instruction::Label(symbol) = *instruction {
                if let Some(prev) = subs.last_mut() {
                    prev.body.end = idx;
                }
                subs.push(Subroutine {
                    symbol,
                    label: idx,
                    body: idx + 1..self.instructions.len(),
                });
            }
        }
        subs
    }

    /// The `n`-th subroutine in list order.
    #[must_use]
    pub fn nth_subroutine(&self, n: usize) -> Option<Subroutine> {
        self.subroutines().into_iter().nth(n)
    }

    /// Symbols of all defined subroutines, in list order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Label(symbol) => Some(*symbol),
                _ => None,
            })
            .collect()
    }

    /// Instructions of `sub`'s body.
    #[must_use]
    pub fn body(&self, sub: &Subroutine) -> &[Instruction] {
        &self.instructions[sub.body.clone()]
    }

    /// Replace the body of the `n`-th subroutine. Does nothing if it does not exist.
    pub fn replace_body(&mut self, n: usize, body: &[Instruction]) {
        if let Some(sub) = self.nth_subroutine(n) {
            self.instructions.splice(sub.body, body.iter().copied());
        }
    }

    /// Drop main-program instructions beyond `max`.
    pub fn truncate_main(&mut self, max: usize) {
        let main = self.main_len();
        if main > max {
            self.instructions.drain(max..main);
        }
    }

    /// Redirect calls to undefined subroutines to a random action or defined
    /// symbol. Offspring of parents with different subroutine sets need this.
    pub fn repair_calls<R: Rng>(&mut self, actions: &[Action], rng: &mut R) {
        let symbols = self.symbols();
        let main = self.main_len();
        for instruction in &mut self.instructions[..main] {
            if let Instruction::IfFoodAhead { then, otherwise } = instruction {
                for target in [then, otherwise] {
                    if let Target::Call(symbol) = *target {
                        if !symbols.contains(&symbol) {
                            *target = Target::random(actions, &symbols, rng);
                        }
                    }
                }
            }
        }
    }

    /// Generate a random genome: a main program plus `max_subroutines`
    /// subroutines with distinct symbols in random order.
    pub fn random<R: Rng>(config: &LinearConfig, rng: &mut R) -> Self {
        let actions = config.actions();
        let mut symbols: Vec<Symbol> = (0..config.max_subroutines)
            .filter_map(Symbol::new)
            .collect();
        symbols.shuffle(rng);

        let main_len = match config.init_length {
            InitLength::Range => {
                rng.random_range(config.min_program_length..=config.max_program_length)
            }
            InitLength::Min => config.min_program_length,
            InitLength::Max => config.max_program_length,
            InitLength::Constant(len) => len,
        };
        let mut instructions: Vec<Instruction> = (0..main_len)
            .map(|_| Instruction::random_main(&actions, &symbols, rng))
            .collect();

        for &symbol in &symbols {
            instructions.push(Instruction::Label(symbol));
            let len =
                rng.random_range(config.min_subroutine_length..=config.max_subroutine_length);
            instructions.extend((0..len).map(|_| Instruction::random_simple(&actions, rng)));
        }
        Self { instructions }
    }

    /// Check the invariants that do not depend on a configuration: unique
    /// labels, action-only subroutines and resolvable calls.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_links(&self) -> Result<(), StructuralError> {
        let subs = self.subroutines();
        let mut seen = [false; Symbol::ALPHABET.len()];
        for sub in &subs {
            if std::mem::replace(&mut seen[sub.symbol.index()], true) {
                return Err(StructuralError::DuplicateSubroutine(sub.symbol.as_char()));
            }
            if self.body(sub).iter().any(Instruction::is_conditional) {
                return Err(StructuralError::ConditionalInSubroutine(sub.symbol.as_char()));
            }
        }
        for instruction in self.main_program() {
            if let Instruction::IfFoodAhead { then, otherwise } = instruction {
                for target in [then, otherwise] {
                    if let Target::Call(symbol) = target {
                        if !seen[symbol.index()] {
                            return Err(StructuralError::UnresolvedSubroutine(symbol.as_char()));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for LinearGenome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

impl Genome for LinearGenome {
    type Config = LinearConfig;

    const ENCODING: &'static str = "linear";

    fn random<R: Rng>(config: &LinearConfig, rng: &mut R) -> Self {
        LinearGenome::random(config, rng)
    }

    fn execute(
        &self,
        agent: &mut Agent,
        trail: &mut Trail,
        grid: &FoodGrid,
        boundary: BoundaryPolicy,
    ) {
        let mut labels = [None; Symbol::ALPHABET.len()];
        for (idx, instruction) in self.instructions.iter().enumerate() {
            if let Instruction::Label(symbol) = instruction {
                labels[symbol.index()].get_or_insert(idx);
            }
        }

        // Return address of the active subroutine call. One frame at most:
        // a call made while it is set is skipped.
        let mut frame: Option<usize> = None;
        let mut pc = 0;
        loop {
            let instruction = match self.instructions.get(pc) {
                Some(Instruction::Label(_)) | None => match frame.take() {
                    Some(caller) => {
                        pc = caller + 1;
                        continue;
                    }
                    None => break,
                },
                Some(instruction) => *instruction,
            };
            let target = match instruction {
                Instruction::IfFoodAhead { then, otherwise } => {
                    if agent.senses_food(grid) {
                        then
                    } else {
                        otherwise
                    }
                }
                Instruction::Act(action) => Target::Act(action),
                Instruction::Label(_) => break,
            };
            match target {
                Target::Act(action) => agent.perform(action, grid, boundary, trail),
                Target::Call(symbol) => {
                    if let (Some(label), None) = (labels[symbol.index()], frame) {
                        frame = Some(pc);
                        pc = label + 1;
                        continue;
                    }
                }
            }
            pc += 1;
        }
    }

    fn size(&self) -> usize {
        self.instructions.len()
    }

    fn depth(&self) -> usize {
        self.main_len()
    }

    fn crossover<R: Rng>(&self, other: &Self, config: &LinearConfig, rng: &mut R) -> Self {
        crossover::crossover(self, other, config, rng)
    }

    fn mutate<R: Rng>(&mut self, config: &LinearConfig, rng: &mut R) {
        mutation::mutate(self, config, rng);
    }

    fn check(&self, config: &LinearConfig) -> Result<(), StructuralError> {
        let main = self.main_len();
        if !(config.min_program_length..=config.max_program_length).contains(&main) {
            return Err(StructuralError::MainLength {
                len: main,
                min: config.min_program_length,
                max: config.max_program_length,
            });
        }
        let subs = self.subroutines();
        if subs.len() > config.max_subroutines {
            return Err(StructuralError::TooManySubroutines {
                count: subs.len(),
                max: config.max_subroutines,
            });
        }
        for sub in &subs {
            let len = sub.body.len();
            if !(config.min_subroutine_length..=config.max_subroutine_length).contains(&len) {
                return Err(StructuralError::SubroutineLength {
                    symbol: sub.symbol.as_char(),
                    len,
                    min: config.min_subroutine_length,
                    max: config.max_subroutine_length,
                });
            }
        }
        self.check_links()
    }
}
