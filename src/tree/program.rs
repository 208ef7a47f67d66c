//! Arena-allocated program trees.
//!
//! Nodes live in a [`SlotMap`] and refer to their children by [`NodeId`], so
//! cloning a genome deep-copies it and no storage is ever shared between
//! parents and offspring. The arena only ever holds nodes reachable from the
//! root: every operator that detaches a subtree also frees its nodes.
//!
//! Depth is measured in levels: a lone terminal has height 1.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use super::node::{NodeId, Opcode, TreeNode};
use super::variation;
use crate::agent::{Action, Agent, BoundaryPolicy, Trail};
use crate::config::{InitMethod, TreeConfig};
use crate::error::{ProgramTextError, StructuralError};
use crate::genome::Genome;
use crate::world::FoodGrid;

/// Shape parameters for random tree generation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GrowParams<'a> {
    /// Every leaf sits at this level or deeper.
    pub min_height: usize,
    /// No node sits deeper than this level.
    pub max_height: usize,
    /// Use functions at every level above `max_height`.
    pub full: bool,
    /// Terminal set.
    pub terminals: &'a [Action],
}

/// A program tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeGenome {
    nodes: SlotMap<NodeId, TreeNode>,
    root: NodeId,
}

impl TreeGenome {
    /// A tree consisting of one terminal.
    #[must_use]
    pub fn leaf(action: Action) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(TreeNode::terminal(action));
        Self { nodes, root }
    }

    /// Build a tree from opcodes listed in pre-order.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramTextError::Empty`] for no opcodes,
    /// [`ProgramTextError::Truncated`] if function nodes are left without
    /// children and [`ProgramTextError::TrailingNodes`] if opcodes remain
    /// after the tree is complete. Line numbers in errors are 1-based
    /// positions in `opcodes`.
    pub fn from_preorder(opcodes: &[Opcode]) -> Result<Self, ProgramTextError> {
        let numbered: Vec<(Opcode, usize)> = opcodes
            .iter()
            .enumerate()
            .map(|(idx, &op)| (op, idx + 1))
            .collect();
        Self::from_numbered(&numbered)
    }

    /// Like [`TreeGenome::from_preorder`], with an explicit line number per opcode.
    pub(crate) fn from_numbered(opcodes: &[(Opcode, usize)]) -> Result<Self, ProgramTextError> {
        let mut nodes: SlotMap<NodeId, TreeNode> = SlotMap::with_key();
        let mut root = None;
        // Function nodes still waiting for children.
        let mut open: Vec<NodeId> = Vec::new();

        for &(opcode, line) in opcodes {
            if root.is_some() && open.is_empty() {
                return Err(ProgramTextError::TrailingNodes { line });
            }
            let id = nodes.insert(TreeNode {
                opcode,
                children: Vec::with_capacity(opcode.arity()),
            });
            if let Some(&parent) = open.last() {
                let node = &mut nodes[parent];
                node.children.push(id);
                if node.children.len() == node.opcode.arity() {
                    open.pop();
                }
            }
            root.get_or_insert(id);
            if opcode.arity() > 0 {
                open.push(id);
            }
        }

        let missing: usize = open
            .iter()
            .map(|&id| nodes[id].opcode.arity() - nodes[id].children.len())
            .sum();
        match root {
            None => Err(ProgramTextError::Empty),
            Some(_) if missing > 0 => Err(ProgramTextError::Truncated { missing }),
            Some(root) => Ok(Self { nodes, root }),
        }
    }

    pub(crate) fn generate<R: Rng>(params: GrowParams<'_>, rng: &mut R) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = grow(&mut nodes, 1, params, rng);
        Self { nodes, root }
    }

    /// Generate a random tree using `config.init`.
    ///
    /// Grow and full trees target `max_depth`. Ramped half-and-half picks
    /// grow or full at random and a target height in `min_depth..=max_depth`.
    pub fn random<R: Rng>(config: &TreeConfig, rng: &mut R) -> Self {
        let terminals = config.terminals();
        let (full, max_height) = match config.init {
            InitMethod::Grow => (false, config.max_depth),
            InitMethod::Full => (true, config.max_depth),
            InitMethod::RampedHalfAndHalf => (
                rng.random_bool(0.5),
                rng.random_range(config.min_depth..=config.max_depth),
            ),
        };
        Self::generate(
            GrowParams {
                min_height: config.min_depth,
                max_height,
                full,
                terminals: &terminals,
            },
            rng,
        )
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node behind `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Node ids in pre-order: parent first, children left to right.
    #[must_use]
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                order.push(id);
                stack.extend(node.children.iter().rev());
            }
        }
        order
    }

    /// Opcodes in pre-order. Two trees are equal exactly when these are.
    #[must_use]
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.preorder()
            .into_iter()
            .map(|id| self.nodes[id].opcode)
            .collect()
    }

    /// The node at `index` in pre-order, root at 0.
    #[must_use]
    pub fn nth_node(&self, index: usize) -> Option<NodeId> {
        self.preorder().get(index).copied()
    }

    /// A uniformly random node, root included.
    pub fn random_node<R: Rng>(&self, rng: &mut R) -> NodeId {
        let order = self.preorder();
        order[rng.random_range(0..order.len())]
    }

    /// Number of levels.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, level)) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                height = height.max(level);
                stack.extend(node.children.iter().map(|&c| (c, level + 1)));
            }
        }
        height
    }

    /// Copy of the subtree rooted at `id`.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = self.copy_into(id, &mut nodes);
        Self { nodes, root }
    }

    fn copy_into(&self, id: NodeId, dest: &mut SlotMap<NodeId, TreeNode>) -> NodeId {
        let node = &self.nodes[id];
        let children = node
            .children
            .iter()
            .map(|&child| self.copy_into(child, dest))
            .collect();
        dest.insert(TreeNode {
            opcode: node.opcode,
            children,
        })
    }

    /// Free every descendant of `id` and clear its child list.
    fn remove_children(&mut self, id: NodeId) {
        let mut stack = match self.nodes.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        while let Some(child) = stack.pop() {
            if let Some(node) = self.nodes.remove(child) {
                stack.extend(node.children);
            }
        }
    }

    /// Replace the subtree at `target` with a copy of `donor`.
    pub fn replace_subtree(&mut self, target: NodeId, donor: &Self) {
        if !self.nodes.contains_key(target) {
            return;
        }
        self.remove_children(target);
        let donor_root = &donor.nodes[donor.root];
        let children = donor_root
            .children
            .iter()
            .map(|&child| donor.copy_into(child, &mut self.nodes))
            .collect();
        self.nodes[target] = TreeNode {
            opcode: donor_root.opcode,
            children,
        };
    }

    /// Cut the tree down to `max_depth` levels: every node on the last
    /// allowed level loses its children, and function nodes there become a
    /// random terminal.
    pub fn truncate<R: Rng>(&mut self, max_depth: usize, terminals: &[Action], rng: &mut R) {
        let mut stack = vec![(self.root, 1)];
        while let Some((id, level)) = stack.pop() {
            if level >= max_depth {
                self.remove_children(id);
                let node = &mut self.nodes[id];
                if !node.opcode.is_terminal() {
                    node.opcode = Opcode::Terminal(terminals[rng.random_range(0..terminals.len())]);
                }
            } else {
                stack.extend(self.nodes[id].children.iter().map(|&c| (c, level + 1)));
            }
        }
    }

    fn run(
        &self,
        id: NodeId,
        agent: &mut Agent,
        trail: &mut Trail,
        grid: &FoodGrid,
        boundary: BoundaryPolicy,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match node.opcode {
            Opcode::Terminal(action) => agent.perform(action, grid, boundary, trail),
            Opcode::IfFoodAhead => {
                let branch = if agent.senses_food(grid) { 0 } else { 1 };
                if let Some(&child) = node.children.get(branch) {
                    self.run(child, agent, trail, grid, boundary);
                }
            }
            Opcode::Progn2 | Opcode::Progn3 => {
                for &child in &node.children {
                    self.run(child, agent, trail, grid, boundary);
                }
            }
        }
    }
}

fn grow<R: Rng>(
    nodes: &mut SlotMap<NodeId, TreeNode>,
    level: usize,
    params: GrowParams<'_>,
    rng: &mut R,
) -> NodeId {
    let function = if level >= params.max_height {
        false
    } else if level < params.min_height || params.full {
        true
    } else {
        rng.random_bool(0.5)
    };
    let opcode = if function {
        Opcode::FUNCTIONS[rng.random_range(0..Opcode::FUNCTIONS.len())]
    } else {
        Opcode::Terminal(params.terminals[rng.random_range(0..params.terminals.len())])
    };
    let children = (0..opcode.arity())
        .map(|_| grow(nodes, level + 1, params, rng))
        .collect();
    nodes.insert(TreeNode { opcode, children })
}

impl PartialEq for TreeGenome {
    fn eq(&self, other: &Self) -> bool {
        self.opcodes() == other.opcodes()
    }
}

impl Eq for TreeGenome {}

impl Genome for TreeGenome {
    type Config = TreeConfig;

    const ENCODING: &'static str = "tree";

    fn random<R: Rng>(config: &TreeConfig, rng: &mut R) -> Self {
        TreeGenome::random(config, rng)
    }

    fn execute(
        &self,
        agent: &mut Agent,
        trail: &mut Trail,
        grid: &FoodGrid,
        boundary: BoundaryPolicy,
    ) {
        self.run(self.root, agent, trail, grid, boundary);
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn depth(&self) -> usize {
        self.height()
    }

    fn crossover<R: Rng>(&self, other: &Self, config: &TreeConfig, rng: &mut R) -> Self {
        variation::crossover(self, other, config, rng)
    }

    fn mutate<R: Rng>(&mut self, config: &TreeConfig, rng: &mut R) {
        variation::mutate(self, config, rng);
    }

    fn check(&self, config: &TreeConfig) -> Result<(), StructuralError> {
        if !self.nodes.contains_key(self.root) {
            return Err(StructuralError::DanglingNode);
        }
        let mut reached = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id).ok_or(StructuralError::DanglingNode)?;
            reached += 1;
            // A shared child would be reached twice.
            if reached > self.nodes.len() {
                return Err(StructuralError::DanglingNode);
            }
            if node.children.len() != node.opcode.arity() {
                return Err(StructuralError::Arity {
                    opcode: node.opcode.name(),
                    expected: node.opcode.arity(),
                    actual: node.children.len(),
                });
            }
            stack.extend(&node.children);
        }
        if reached != self.nodes.len() {
            return Err(StructuralError::DanglingNode);
        }
        let height = self.height();
        if height > config.max_depth {
            return Err(StructuralError::TooDeep {
                height,
                max: config.max_depth,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Heading, Position};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn t(action: Action) -> Opcode {
        Opcode::Terminal(action)
    }

    /// IF_FOOD_AHEAD(MOVE, PROGN2(LEFT, MOVE))
    fn sample() -> TreeGenome {
        TreeGenome::from_preorder(&[
            Opcode::IfFoodAhead,
            t(Action::Move),
            Opcode::Progn2,
            t(Action::Left),
            t(Action::Move),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_preorder_shape() {
        let tree = sample();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.node(tree.root()).unwrap().opcode, Opcode::IfFoodAhead);
        let third = tree.nth_node(2).and_then(|id| tree.node(id));
        assert_eq!(third.map(|n| n.opcode), Some(Opcode::Progn2));
        tree.check(&TreeConfig::default()).unwrap();
    }

    #[test]
    fn test_from_preorder_errors() {
        assert_eq!(
            TreeGenome::from_preorder(&[Opcode::Progn3, t(Action::Move)]),
            Err(ProgramTextError::Truncated { missing: 2 })
        );
        assert_eq!(
            TreeGenome::from_preorder(&[t(Action::Move), t(Action::Left)]),
            Err(ProgramTextError::TrailingNodes { line: 2 })
        );
        assert_eq!(TreeGenome::from_preorder(&[]), Err(ProgramTextError::Empty));
    }

    #[test]
    fn test_random_heights_within_bounds() {
        let mut rng = test_rng();
        for init in [InitMethod::Grow, InitMethod::Full, InitMethod::RampedHalfAndHalf] {
            let config = TreeConfig {
                init,
                ..TreeConfig::default()
            };
            for _ in 0..200 {
                let tree = TreeGenome::random(&config, &mut rng);
                let height = tree.height();
                assert!((config.min_depth..=config.max_depth).contains(&height));
                tree.check(&config).unwrap();
                if init == InitMethod::Full {
                    assert_eq!(height, config.max_depth);
                }
            }
        }
    }

    #[test]
    fn test_execute_branches_on_food() {
        let tree = sample();
        let grid = FoodGrid::with_food(4, [(0, 1)]).unwrap();
        let mut agent = Agent::default();
        let mut trail = Trail::default();
        tree.execute(&mut agent, &mut trail, &grid, BoundaryPolicy::Stay);
        assert_eq!(agent.position, Position::new(0, 1));

        // Nothing ahead now: turn north and bump into the edge.
        tree.execute(&mut agent, &mut trail, &grid, BoundaryPolicy::Stay);
        assert_eq!(agent, Agent::new(Position::new(0, 1), Heading::North));
        assert_eq!(trail.to_pairs(), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_replace_subtree_frees_nodes() {
        let mut tree = sample();
        let target = tree.nth_node(2).unwrap();
        tree.replace_subtree(target, &TreeGenome::leaf(Action::Right));
        assert_eq!(tree.size(), 3);
        assert_eq!(
            tree.opcodes(),
            vec![Opcode::IfFoodAhead, t(Action::Move), t(Action::Right)]
        );
        tree.check(&TreeConfig::default()).unwrap();
    }

    #[test]
    fn test_replace_root() {
        let mut tree = sample();
        let donor = TreeGenome::from_preorder(&[
            Opcode::Progn3,
            t(Action::Move),
            t(Action::Move),
            t(Action::Move),
        ])
        .unwrap();
        let root = tree.root();
        tree.replace_subtree(root, &donor);
        assert_eq!(tree, donor);
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_subtree_is_independent_copy() {
        let tree = sample();
        let sub = tree.subtree(tree.nth_node(2).unwrap());
        assert_eq!(sub.opcodes(), vec![Opcode::Progn2, t(Action::Left), t(Action::Move)]);
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn test_truncate_limits_height() {
        let mut rng = test_rng();
        let config = TreeConfig {
            min_depth: 6,
            max_depth: 8,
            init: InitMethod::Full,
            ..TreeConfig::default()
        };
        let terminals = config.terminals();
        for max in 1..=5 {
            let mut tree = TreeGenome::random(&config, &mut rng);
            tree.truncate(max, &terminals, &mut rng);
            assert_eq!(tree.height(), max);
            tree.check(&TreeConfig {
                min_depth: 1,
                max_depth: max,
                ..TreeConfig::default()
            })
            .unwrap();
        }
    }

    #[test]
    fn test_check_detects_too_deep() {
        let config = TreeConfig {
            min_depth: 1,
            max_depth: 2,
            ..TreeConfig::default()
        };
        assert_eq!(
            sample().check(&config),
            Err(StructuralError::TooDeep { height: 3, max: 2 })
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let tree = TreeGenome::random(&TreeConfig::default(), &mut test_rng());
        let json = serde_json::to_string(&tree).unwrap();
        let back: TreeGenome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        back.check(&TreeConfig::default()).unwrap();
    }
}
