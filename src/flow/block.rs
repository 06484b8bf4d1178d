//! Basic-block partition of a method body.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::insn::Insn;

/// Index of a block within one [`BlockGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates an id from a graph index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Returns the graph index of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A maximal straight-line instruction run.
///
/// Blocks are bounded by branch targets and by branch-source instructions:
/// every branch target starts a block, and the instruction after a jump,
/// switch, return, or throw starts one.
#[derive(Debug)]
pub struct Block {
    /// Index of the first instruction.
    pub start: usize,
    /// Index one past the last instruction.
    pub end: usize,
    /// Fallthrough successor, when the last instruction can fall through.
    pub next: Option<BlockId>,
    /// Non-fallthrough successors (jump and switch targets), in operand order.
    pub branches: Vec<BlockId>,
    /// The unique block that falls through into this one, if any.
    pub prev: Option<BlockId>,
    /// Earliest ancestor reachable by following `prev` edges.
    pub origin: BlockId,
}

/// The basic-block partition of one method body.
#[derive(Debug)]
pub struct BlockGraph {
    blocks: Vec<Block>,
    by_start: FxHashMap<usize, BlockId>,
}

impl BlockGraph {
    /// Partitions an instruction sequence into basic blocks.
    ///
    /// An empty sequence produces an empty graph; the walker treats it as
    /// immediately terminated.
    #[must_use]
    pub fn build(insns: &[Insn]) -> Self {
        if insns.is_empty() {
            return Self {
                blocks: Vec::new(),
                by_start: FxHashMap::default(),
            };
        }

        let mut starts: BTreeSet<usize> = BTreeSet::new();
        starts.insert(0);
        for (i, insn) in insns.iter().enumerate() {
            if insn.ends_block() {
                if i + 1 < insns.len() {
                    starts.insert(i + 1);
                }
                for target in insn.branch_targets() {
                    starts.insert(target);
                }
            }
        }

        let starts: Vec<usize> = starts.into_iter().collect();
        let mut by_start: FxHashMap<usize, BlockId> = FxHashMap::default();
        for (idx, &start) in starts.iter().enumerate() {
            by_start.insert(start, BlockId::new(idx));
        }

        let mut blocks: Vec<Block> = Vec::with_capacity(starts.len());
        for (idx, &start) in starts.iter().enumerate() {
            let end = starts.get(idx + 1).copied().unwrap_or(insns.len());
            let last = &insns[end - 1];
            let branches: Vec<BlockId> = last
                .branch_targets()
                .into_iter()
                .map(|t| by_start[&t])
                .collect();
            let next = if last.falls_through() && end < insns.len() {
                Some(by_start[&end])
            } else {
                None
            };
            blocks.push(Block {
                start,
                end,
                next,
                branches,
                prev: None,
                origin: BlockId::new(idx),
            });
        }

        // Fallthrough predecessors are unique: only the textually preceding
        // block can fall into a block.
        for idx in 0..blocks.len() {
            if let Some(next) = blocks[idx].next {
                blocks[next.index()].prev = Some(BlockId::new(idx));
            }
        }
        for idx in 0..blocks.len() {
            let mut origin = BlockId::new(idx);
            while let Some(prev) = blocks[origin.index()].prev {
                origin = prev;
            }
            blocks[idx].origin = origin;
        }

        Self { blocks, by_start }
    }

    /// Returns the block with the given id.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    /// Returns the block starting at an instruction index, if one does.
    #[must_use]
    pub fn block_at(&self, insn_index: usize) -> Option<BlockId> {
        self.by_start.get(&insn_index).copied()
    }

    /// Returns the entry block, or `None` for an empty graph.
    #[must_use]
    pub fn entry(&self) -> Option<BlockId> {
        if self.blocks.is_empty() {
            None
        } else {
            Some(BlockId::new(0))
        }
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if the graph has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insn::opcodes;

    fn goto(target: usize) -> Insn {
        Insn::Jump {
            op: opcodes::GOTO,
            target,
        }
    }

    fn ifeq(target: usize) -> Insn {
        Insn::Jump {
            op: opcodes::IFEQ,
            target,
        }
    }

    fn nop() -> Insn {
        Insn::Plain { op: opcodes::NOP }
    }

    fn ret() -> Insn {
        Insn::Plain {
            op: opcodes::RETURN,
        }
    }

    #[test]
    fn test_empty_body() {
        let graph = BlockGraph::build(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.entry(), None);
    }

    #[test]
    fn test_single_block() {
        let graph = BlockGraph::build(&[nop(), nop(), ret()]);
        assert_eq!(graph.len(), 1);
        let entry = graph.block(graph.entry().unwrap());
        assert_eq!((entry.start, entry.end), (0, 3));
        assert!(entry.next.is_none());
        assert!(entry.branches.is_empty());
    }

    #[test]
    fn test_conditional_splits_blocks() {
        // 0: ifeq -> 3, 1: nop, 2: ret | 3: ret
        let graph = BlockGraph::build(&[ifeq(3), nop(), ret(), ret()]);
        assert_eq!(graph.len(), 3);

        let b0 = graph.block(BlockId::new(0));
        assert_eq!((b0.start, b0.end), (0, 1));
        assert_eq!(b0.next, Some(BlockId::new(1)));
        assert_eq!(b0.branches, vec![BlockId::new(2)]);

        let b1 = graph.block(BlockId::new(1));
        assert_eq!(b1.prev, Some(BlockId::new(0)));
        assert_eq!(b1.origin, BlockId::new(0));
        assert!(b1.next.is_none());
    }

    #[test]
    fn test_goto_has_no_fallthrough() {
        // 0: goto 2, 1: ret, 2: ret
        let graph = BlockGraph::build(&[goto(2), ret(), ret()]);
        assert_eq!(graph.len(), 3);
        let b0 = graph.block(BlockId::new(0));
        assert!(b0.next.is_none());
        assert_eq!(b0.branches, vec![BlockId::new(2)]);
        // Block 1 is unreachable fallthrough-wise: no prev.
        assert!(graph.block(BlockId::new(1)).prev.is_none());
    }

    #[test]
    fn test_origin_chain() {
        // 0: nop, 1: ifeq -> 0 (loop back), 2: ret
        let graph = BlockGraph::build(&[nop(), ifeq(0), ret()]);
        // Blocks: [0..2), [2..3)
        assert_eq!(graph.len(), 2);
        let b1 = graph.block(BlockId::new(1));
        assert_eq!(b1.prev, Some(BlockId::new(0)));
        assert_eq!(b1.origin, BlockId::new(0));
    }
}
