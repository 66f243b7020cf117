//! Operation nodes and the chain-rule step.
//!
//! A node is plain `Copy` data living in the context's node arena. Its shape
//! is one of a closed set of variants; operand lists and stored partials of
//! variable-arity nodes live in two side arenas, and externally supplied
//! partial rules live in a registry of [`CustomPartials`] trait objects.

use crate::arena::{Arena, ArenaMark, Slot, Span};
use crate::config::ContextConfig;
use crate::float::Float;

/// Partial-derivative rule evaluated lazily during the backward pass.
///
/// Used by [`custom_op`](crate::custom::custom_op) to splice a result computed
/// outside the tape back into the graph as a single node.
///
/// The context is borrowed while this runs: implementations must not create
/// new [`Var`](crate::Var)s.
pub trait CustomPartials<F: Float> {
    /// Write `∂result/∂operands[i]` into `out[i]`. `out` arrives zeroed and has
    /// the same length as `operands`.
    fn partials(&self, operands: &[F], result: F, out: &mut [F]);
}

impl<F: Float, T> CustomPartials<F> for T
where
    T: Fn(&[F], F, &mut [F]),
{
    fn partials(&self, operands: &[F], result: F, out: &mut [F]) {
        self(operands, result, out)
    }
}

/// Shape of a recorded operation and the data its propagate step needs.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Op<F> {
    Leaf,
    Unary {
        operand: Slot,
        partial: F,
    },
    Binary {
        lhs: Slot,
        rhs: Slot,
        lhs_partial: F,
        rhs_partial: F,
    },
    Nary {
        operands: Span,
        partials: Span,
    },
    Custom {
        operands: Span,
        callback: u32,
    },
}

/// Public view of a node's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Independent input or literal; no operands.
    Leaf,
    /// One operand, one stored partial.
    Unary,
    /// Two operands, two stored partials.
    Binary,
    /// Any number of operands with stored partials.
    Nary,
    /// Any number of operands; partials come from a callback.
    Custom,
}

/// One recorded operation: its value, its adjoint and how to propagate it.
#[derive(Clone, Copy, Debug)]
pub struct Node<F> {
    pub(crate) value: F,
    pub(crate) adjoint: F,
    pub(crate) epoch: u32,
    pub(crate) op: Op<F>,
}

impl<F: Float> Node<F> {
    pub(crate) fn new(value: F, epoch: u32, op: Op<F>) -> Self {
        Node {
            value,
            adjoint: F::zero(),
            epoch,
            op,
        }
    }

    /// Numeric result of the operation.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    /// Accumulated adjoint.
    #[inline]
    pub fn adjoint(&self) -> F {
        self.adjoint
    }

    /// Shape of the node.
    pub fn kind(&self) -> NodeKind {
        match self.op {
            Op::Leaf => NodeKind::Leaf,
            Op::Unary { .. } => NodeKind::Unary,
            Op::Binary { .. } => NodeKind::Binary,
            Op::Nary { .. } => NodeKind::Nary,
            Op::Custom { .. } => NodeKind::Custom,
        }
    }

    /// Number of direct operands.
    pub fn arity(&self) -> usize {
        match self.op {
            Op::Leaf => 0,
            Op::Unary { .. } => 1,
            Op::Binary { .. } => 2,
            Op::Nary { operands, .. } | Op::Custom { operands, .. } => operands.len(),
        }
    }
}

/// High-water marks of every store in a [`Graph`].
#[derive(Clone, Copy, Debug)]
pub(crate) struct GraphMark {
    nodes: ArenaMark,
    operands: ArenaMark,
    partials: ArenaMark,
    callbacks: usize,
}

/// Node storage for one context.
pub(crate) struct Graph<F: Float> {
    nodes: Arena<Node<F>>,
    operands: Arena<Slot>,
    partials: Arena<F>,
    callbacks: Vec<Box<dyn CustomPartials<F>>>,
    scratch_values: Vec<F>,
    scratch_partials: Vec<F>,
}

impl<F: Float> Graph<F> {
    pub(crate) fn new(config: &ContextConfig) -> Self {
        Graph {
            nodes: Arena::new(config.initial_block_len::<Node<F>>()),
            operands: Arena::new(config.initial_block_len::<Slot>()),
            partials: Arena::new(config.initial_block_len::<F>()),
            callbacks: Vec::new(),
            scratch_values: Vec::new(),
            scratch_partials: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn alloc_node(&mut self, node: Node<F>) -> Slot {
        self.nodes.alloc(node)
    }

    pub(crate) fn alloc_operands<I>(&mut self, slots: I) -> Span
    where
        I: IntoIterator<Item = Slot>,
        I::IntoIter: ExactSizeIterator,
    {
        self.operands.alloc_iter(slots)
    }

    pub(crate) fn alloc_partials<I>(&mut self, partials: I) -> Span
    where
        I: IntoIterator<Item = F>,
        I::IntoIter: ExactSizeIterator,
    {
        self.partials.alloc_iter(partials)
    }

    pub(crate) fn register_callback(&mut self, callback: Box<dyn CustomPartials<F>>) -> u32 {
        let id = self.callbacks.len() as u32;
        self.callbacks.push(callback);
        id
    }

    #[inline]
    pub(crate) fn contains(&self, slot: Slot) -> bool {
        self.nodes.contains(slot)
    }

    #[inline]
    pub(crate) fn node(&self, slot: Slot) -> &Node<F> {
        self.nodes.get(slot)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, slot: Slot) -> &mut Node<F> {
        self.nodes.get_mut(slot)
    }

    /// Apply the chain rule for the node at `slot`: add
    /// `adjoint * partial_i` to each direct operand's adjoint.
    ///
    /// No zero-adjoint shortcut: an infinite or NaN partial contaminates its
    /// operand even when the incoming adjoint is zero.
    pub(crate) fn propagate(&mut self, slot: Slot) {
        let node = *self.nodes.get(slot);
        let a = node.adjoint;
        let Graph {
            nodes,
            operands,
            partials,
            callbacks,
            scratch_values,
            scratch_partials,
        } = self;

        match node.op {
            Op::Leaf => {}
            Op::Unary { operand, partial } => accumulate(nodes, operand, a * partial),
            Op::Binary {
                lhs,
                rhs,
                lhs_partial,
                rhs_partial,
            } => {
                accumulate(nodes, lhs, a * lhs_partial);
                accumulate(nodes, rhs, a * rhs_partial);
            }
            Op::Nary {
                operands: ops,
                partials: ps,
            } => {
                for (&target, &p) in operands.slice(ops).iter().zip(partials.slice(ps)) {
                    accumulate(nodes, target, a * p);
                }
            }
            Op::Custom {
                operands: ops,
                callback,
            } => {
                let targets = operands.slice(ops);
                scratch_values.clear();
                scratch_values.extend(targets.iter().map(|&t| nodes.get(t).value));
                scratch_partials.clear();
                scratch_partials.resize(targets.len(), F::zero());
                callbacks[callback as usize].partials(scratch_values, node.value, scratch_partials);
                for (&target, &p) in targets.iter().zip(scratch_partials.iter()) {
                    accumulate(nodes, target, a * p);
                }
            }
        }
    }

    pub(crate) fn mark(&self) -> GraphMark {
        GraphMark {
            nodes: self.nodes.mark(),
            operands: self.operands.mark(),
            partials: self.partials.mark(),
            callbacks: self.callbacks.len(),
        }
    }

    pub(crate) fn recover_to(&mut self, mark: GraphMark) {
        self.nodes.recover_to(mark.nodes);
        self.operands.recover_to(mark.operands);
        self.partials.recover_to(mark.partials);
        self.callbacks.truncate(mark.callbacks);
    }

    pub(crate) fn recover_all(&mut self) {
        self.nodes.recover_all();
        self.operands.recover_all();
        self.partials.recover_all();
        self.callbacks.clear();
    }

    pub(crate) fn free_all(&mut self) {
        self.nodes.free_all();
        self.operands.free_all();
        self.partials.free_all();
        self.callbacks = Vec::new();
        self.scratch_values = Vec::new();
        self.scratch_partials = Vec::new();
    }

    pub(crate) fn bytes_used(&self) -> usize {
        self.nodes.bytes_used() + self.operands.bytes_used() + self.partials.bytes_used()
    }

    pub(crate) fn bytes_reserved(&self) -> usize {
        self.nodes.bytes_reserved() + self.operands.bytes_reserved() + self.partials.bytes_reserved()
    }

    pub(crate) fn num_blocks(&self) -> usize {
        self.nodes.num_blocks() + self.operands.num_blocks() + self.partials.num_blocks()
    }

    #[cfg(test)]
    pub(crate) fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

#[inline]
fn accumulate<F: Float>(nodes: &mut Arena<Node<F>>, target: Slot, delta: F) {
    let node = nodes.get_mut(target);
    node.adjoint = node.adjoint + delta;
}
