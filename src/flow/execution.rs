//! The single-method walker and the lockstep parallel executor.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::flow::{BlockGraph, BlockId};
use crate::insn::{opcodes, Insn};
use crate::model::{resolve, MatchEnv, Matchable, MethodId};

/// One invocation layer of an execution.
///
/// The bottom frame is the method being walked; further frames are pushed
/// when the walker steps into a statically-bound invoke and popped when the
/// callee's walk is exhausted.
struct Frame {
    method: MethodId,
    graph: BlockGraph,
    block: BlockId,
    idx: usize,
    visited_branches: FxHashSet<BlockId>,
    trunks: FxHashMap<BlockId, BlockId>,
    visited_trunks: FxHashSet<BlockId>,
}

impl Frame {
    fn new(method: MethodId, graph: BlockGraph) -> Option<Self> {
        let entry = graph.entry()?;
        let idx = graph.block(entry).start;
        Some(Self {
            method,
            graph,
            block: entry,
            idx,
            visited_branches: FxHashSet::default(),
            trunks: FxHashMap::default(),
            visited_trunks: FxHashSet::default(),
        })
    }

    /// Picks the block to enter after the current one is exhausted, without
    /// considering step-out: first unvisited branch, then fallthrough.
    fn branch_or_next(&mut self) -> Option<BlockId> {
        let current = self.block;
        let block = self.graph.block(current);
        for &branch in &block.branches {
            if !self.visited_branches.contains(&branch) {
                self.visited_branches.insert(branch);
                self.trunks.insert(branch, current);
                return Some(branch);
            }
        }
        block.next
    }

    /// Backtracks to the trunk recorded for the current block's origin, once.
    fn origin_trunk(&mut self) -> Option<BlockId> {
        let origin = self.graph.block(self.block).origin;
        let trunk = self.trunks.get(&origin).copied()?;
        if self.visited_trunks.insert(trunk) {
            Some(trunk)
        } else {
            None
        }
    }

    fn enter(&mut self, block: BlockId) {
        self.block = block;
        self.idx = self.graph.block(block).start;
    }
}

/// A deterministic walk over one method's basic blocks.
///
/// The step rule visits each branch edge once, falls through where possible,
/// and backtracks along trunk edges recorded when branches were first taken.
/// The walk terminates once no rule yields a next block at the bottom
/// invocation layer.
pub struct Execution<'e> {
    env: &'e MatchEnv,
    inline: bool,
    frames: Vec<Frame>,
    terminated: bool,
    paused: bool,
    fresh: bool,
}

impl<'e> Execution<'e> {
    /// Creates a walker positioned before the method's first instruction.
    ///
    /// A bodiless method produces an execution that is terminated from the
    /// start.
    ///
    /// # Arguments
    ///
    /// * `env` - The environment owning the method
    /// * `method` - The method to walk
    /// * `inline` - Whether to step into statically-bound in-group invokes
    #[must_use]
    pub fn new(env: &'e MatchEnv, method: MethodId, inline: bool) -> Self {
        let graph = BlockGraph::build(&env.method(method).insns);
        let frame = Frame::new(method, graph);
        let terminated = frame.is_none();
        Self {
            env,
            inline,
            frames: frame.into_iter().collect(),
            terminated,
            paused: false,
            fresh: true,
        }
    }

    /// Returns true once the walk is exhausted.
    #[must_use]
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Returns true while the walker is paused at an instruction.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Pauses the walker at its current instruction.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Releases a pause so the next lockstep round advances the walker.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Returns the instruction the walker currently rests on.
    #[must_use]
    pub fn current_insn(&self) -> Option<&'e Insn> {
        if self.terminated {
            return None;
        }
        let frame = self.frames.last()?;
        self.env.method(frame.method).insns.get(frame.idx)
    }

    /// Returns the current instruction index within the current method.
    #[must_use]
    pub fn position(&self) -> usize {
        self.frames.last().map_or(0, |f| f.idx)
    }

    /// Returns the method the walker currently executes (the innermost
    /// invocation layer).
    #[must_use]
    pub fn method(&self) -> Option<MethodId> {
        self.frames.last().map(|f| f.method)
    }

    /// Returns the current invocation depth (1 = the walked method itself).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Advances the walker by one instruction.
    ///
    /// The first step lands on the first instruction. When the current block
    /// is exhausted the next block is chosen by, in order: first unvisited
    /// branch, fallthrough, step-out to the caller layer, the origin's
    /// recorded trunk, termination.
    pub fn step(&mut self) {
        if self.terminated {
            return;
        }
        if self.fresh {
            self.fresh = false;
            self.maybe_step_in();
            return;
        }
        loop {
            let Some(frame) = self.frames.last_mut() else {
                self.terminated = true;
                return;
            };
            frame.idx += 1;
            if frame.idx < frame.graph.block(frame.block).end {
                break;
            }
            if let Some(block) = frame.branch_or_next() {
                frame.enter(block);
                break;
            }
            if self.frames.len() > 1 {
                // Step out: the caller frame still rests on its invoke, the
                // next loop round advances past it.
                self.frames.pop();
                continue;
            }
            let Some(frame) = self.frames.last_mut() else {
                self.terminated = true;
                return;
            };
            if let Some(trunk) = frame.origin_trunk() {
                frame.enter(trunk);
                break;
            }
            self.terminated = true;
            return;
        }
        self.maybe_step_in();
    }

    /// Steps into the current instruction when it is a statically-bound
    /// invoke of a single-target static method within the same group.
    fn maybe_step_in(&mut self) {
        if !self.inline {
            return;
        }
        let Some(Insn::Method {
            op: opcodes::INVOKESTATIC,
            owner,
            name,
            desc,
            ..
        }) = self.current_insn()
        else {
            return;
        };
        let Some(callee) = resolve::resolve_method(self.env, *owner, name, desc, false) else {
            return;
        };
        let callee_def = self.env.method(callee);
        let current = self.frames.last().map(|f| f.method);
        let same_side = current
            .map(|m| Matchable::side(m, self.env) == Matchable::side(callee, self.env))
            .unwrap_or(false);
        if !callee_def.is_static() || !callee_def.has_body() || !same_side {
            return;
        }
        let graph = BlockGraph::build(&callee_def.insns);
        if let Some(frame) = Frame::new(callee, graph) {
            self.frames.push(frame);
        }
    }
}

/// Drives two executions in lockstep under a pause predicate.
///
/// Each round advances every unpaused, unterminated execution by one step and
/// re-evaluates the predicate. Once both executions are paused the consumer
/// is invoked; it may compare the current instructions, unpause either side,
/// and decide whether the walk continues. The loop ends when either execution
/// terminates or the consumer returns `false`.
pub struct ParallelExecutor<'e, P> {
    /// The first execution.
    pub a: Execution<'e>,
    /// The second execution.
    pub b: Execution<'e>,
    pause: P,
}

impl<'e, P> ParallelExecutor<'e, P>
where
    P: FnMut(&Execution<'e>, &Insn) -> bool,
{
    /// Creates a lockstep driver over two executions.
    #[must_use]
    pub fn new(a: Execution<'e>, b: Execution<'e>, pause: P) -> Self {
        Self { a, b, pause }
    }

    /// Runs the lockstep loop.
    pub fn execute(
        &mut self,
        mut consumer: impl FnMut(&mut Execution<'e>, &mut Execution<'e>) -> bool,
    ) {
        while !self.a.terminated() && !self.b.terminated() {
            if !self.a.paused() {
                self.a.step();
            }
            if !self.b.paused() {
                self.b.step();
            }
            if self.a.terminated() || self.b.terminated() {
                break;
            }
            if !self.a.paused() {
                if let Some(insn) = self.a.current_insn() {
                    if (self.pause)(&self.a, insn) {
                        self.a.pause();
                    }
                }
            }
            if !self.b.paused() {
                if let Some(insn) = self.b.current_insn() {
                    if (self.pause)(&self.b, insn) {
                        self.b.pause();
                    }
                }
            }
            if self.a.paused() && self.b.paused() && !consumer(&mut self.a, &mut self.b) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insn::RawInsn;
    use crate::model::{ClassSpec, EnvBuilder, MethodSpec, Side};

    fn env_with_method(insns: Vec<RawInsn>) -> (MatchEnv, MethodId) {
        let mut builder = EnvBuilder::new();
        builder.add_class(
            Side::A,
            ClassSpec::new("Walk", 0)
                .with_method(MethodSpec::new("f", "()V", 0x0008).with_insns(insns)),
        );
        let env = builder.build().unwrap();
        let class = env.class_by_name(Side::A, "Walk").unwrap();
        let method = env.class(class).find_method(&env, "f", "()V").unwrap();
        (env, method)
    }

    fn walk_positions(env: &MatchEnv, method: MethodId) -> Vec<usize> {
        let mut exec = Execution::new(env, method, false);
        let mut positions = Vec::new();
        loop {
            exec.step();
            if exec.terminated() {
                break;
            }
            positions.push(exec.position());
            assert!(positions.len() < 64, "walk did not terminate");
        }
        positions
    }

    #[test]
    fn test_straight_line_walk() {
        let (env, method) = env_with_method(vec![
            RawInsn::Plain {
                op: opcodes::NOP,
            },
            RawInsn::Plain {
                op: opcodes::NOP,
            },
            RawInsn::Plain {
                op: opcodes::RETURN,
            },
        ]);
        assert_eq!(walk_positions(&env, method), vec![0, 1, 2]);
    }

    #[test]
    fn test_branch_taken_first() {
        // 0: ifeq -> 2, 1: return | 2: return
        let (env, method) = env_with_method(vec![
            RawInsn::Jump {
                op: opcodes::IFEQ,
                target: 2,
            },
            RawInsn::Plain {
                op: opcodes::RETURN,
            },
            RawInsn::Plain {
                op: opcodes::RETURN,
            },
        ]);
        // The branch is visited first, then the trunk backtrack revisits the
        // fallthrough path.
        let positions = walk_positions(&env, method);
        assert_eq!(positions[0], 0);
        assert_eq!(positions[1], 2);
        assert!(positions.contains(&1));
    }

    #[test]
    fn test_empty_body_terminates_immediately() {
        let (env, method) = env_with_method(vec![]);
        let mut exec = Execution::new(&env, method, false);
        assert!(exec.terminated());
        exec.step();
        assert!(exec.terminated());
        assert!(exec.current_insn().is_none());
    }

    #[test]
    fn test_loop_terminates() {
        // 0: nop, 1: ifeq -> 0, 2: return
        let (env, method) = env_with_method(vec![
            RawInsn::Plain {
                op: opcodes::NOP,
            },
            RawInsn::Jump {
                op: opcodes::IFEQ,
                target: 0,
            },
            RawInsn::Plain {
                op: opcodes::RETURN,
            },
        ]);
        let positions = walk_positions(&env, method);
        // The back edge is taken once and the walk still reaches the exit.
        assert!(positions.contains(&2));
    }

    #[test]
    fn test_parallel_executor_pauses_in_lockstep() {
        let insns = vec![
            RawInsn::IntPush {
                op: opcodes::BIPUSH,
                value: 7,
            },
            RawInsn::Plain {
                op: opcodes::NOP,
            },
            RawInsn::IntPush {
                op: opcodes::BIPUSH,
                value: 9,
            },
            RawInsn::Plain {
                op: opcodes::RETURN,
            },
        ];
        let (env, method) = env_with_method(insns);
        let a = Execution::new(&env, method, false);
        let b = Execution::new(&env, method, false);

        let mut pauses = 0;
        let mut executor = ParallelExecutor::new(a, b, |_, insn| insn.is_comparable());
        executor.execute(|ea, eb| {
            pauses += 1;
            assert_eq!(ea.position(), eb.position());
            ea.unpause();
            eb.unpause();
            true
        });
        // Two comparable instructions in the body.
        assert_eq!(pauses, 2);
    }
}
