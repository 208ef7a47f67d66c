//! Text form of tree programs.
//!
//! Trees print as an indented outline, one node per line in pre-order:
//!
//! ```text
//! |-IF_FOOD_AHEAD
//!    |-MOVE
//!    |-PROGN2
//!       |-LEFT
//!       |-MOVE
//! ```
//!
//! The parser ignores indentation, so a bare pre-order list of opcode names,
//! separated by whitespace or newlines, is accepted too.

use std::fmt;
use std::str::FromStr;

use super::node::{NodeId, Opcode};
use super::program::TreeGenome;
use crate::error::{Error, ProgramTextError};

const BRANCH: &str = "|-";
const INDENT: &str = "   ";

impl TreeGenome {
    fn write_outline(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        writeln!(f, "{}{BRANCH}{}", INDENT.repeat(depth), node.opcode)?;
        for &child in &node.children {
            self.write_outline(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, self.root(), 0)
    }
}

/// Parse a tree from its outline or a plain pre-order opcode list.
///
/// # Errors
///
/// Returns [`ProgramTextError::UnknownInstruction`] for an unknown opcode
/// and the errors of [`TreeGenome::from_preorder`] for a malformed shape.
pub fn parse_tree(text: &str) -> Result<TreeGenome, Error> {
    let mut opcodes = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            let name = token.strip_prefix(BRANCH).unwrap_or(token);
            let opcode =
                Opcode::from_name(name).ok_or_else(|| ProgramTextError::UnknownInstruction {
                    line: idx + 1,
                    text: token.to_string(),
                })?;
            opcodes.push((opcode, idx + 1));
        }
    }
    Ok(TreeGenome::from_numbered(&opcodes)?)
}

impl FromStr for TreeGenome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tree(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Action;
    use crate::config::TreeConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const OUTLINE: &str = "\
|-IF_FOOD_AHEAD
   |-MOVE
   |-PROGN2
      |-LEFT
      |-MOVE
";

    #[test]
    fn test_outline_format() {
        let tree = TreeGenome::from_preorder(&[
            Opcode::IfFoodAhead,
            Opcode::Terminal(Action::Move),
            Opcode::Progn2,
            Opcode::Terminal(Action::Left),
            Opcode::Terminal(Action::Move),
        ])
        .unwrap();
        assert_eq!(tree.to_string(), OUTLINE);
        assert_eq!(OUTLINE.parse::<TreeGenome>().unwrap(), tree);
    }

    #[test]
    fn test_plain_preorder_list() {
        let tree: TreeGenome = "IF_FOOD_AHEAD MOVE\nPROGN2 LEFT MOVE".parse().unwrap();
        assert_eq!(tree.to_string(), OUTLINE);
    }

    #[test]
    fn test_random_trees_print_and_parse() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let config = TreeConfig {
            half_turns: true,
            ..TreeConfig::default()
        };
        for _ in 0..20 {
            let tree = TreeGenome::random(&config, &mut rng);
            assert_eq!(tree.to_string().parse::<TreeGenome>().unwrap(), tree);
        }
    }

    #[test]
    fn test_parse_errors_carry_lines() {
        assert_eq!(
            parse_tree("|-PROGN2\n   |-MOVE\n   |-JUMP").unwrap_err(),
            Error::ProgramText(ProgramTextError::UnknownInstruction {
                line: 3,
                text: "|-JUMP".into()
            })
        );
        assert_eq!(
            parse_tree("|-PROGN2\n   |-MOVE").unwrap_err(),
            Error::ProgramText(ProgramTextError::Truncated { missing: 1 })
        );
        assert_eq!(
            parse_tree("MOVE\n\nLEFT").unwrap_err(),
            Error::ProgramText(ProgramTextError::TrailingNodes { line: 3 })
        );
        assert_eq!(
            parse_tree("").unwrap_err(),
            Error::ProgramText(ProgramTextError::Empty)
        );
    }
}
