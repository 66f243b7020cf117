//! Autodiff context: node storage, the tape, nested-scope marks and the
//! per-thread active context.

use std::cell::RefCell;
use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread::LocalKey;

use crate::arena::Slot;
use crate::config::ContextConfig;
use crate::error::{AdError, Result};
use crate::float::Float;
use crate::node::{CustomPartials, Graph, GraphMark, Node, Op};
use crate::tape::{BackwardView, Tape};
use crate::var::Var;

static NEXT_EPOCH: AtomicU32 = AtomicU32::new(1);

/// Epoch stamps are unique across every context in the process, so a handle
/// can never validate against a context it does not belong to.
fn fresh_epoch() -> u32 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone, Copy, Debug)]
struct NestedMark {
    tape_len: usize,
    graph: GraphMark,
}

/// Snapshot of a context's memory footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryUsage {
    /// Live nodes on the tape.
    pub nodes: usize,
    /// Bytes occupied by live arena items.
    pub bytes_used: usize,
    /// Bytes reserved across all arena blocks.
    pub bytes_reserved: usize,
    /// Arena blocks currently held.
    pub blocks: usize,
}

/// Owner of every node recorded on one thread for one float type.
///
/// Most code never touches a `Context` directly: operations on [`Var`] use
/// the thread-local context for their float type. An explicit context can be
/// activated for a scope with [`ContextGuard`].
pub struct Context<F: Float> {
    graph: Graph<F>,
    tape: Tape,
    nested: Vec<NestedMark>,
    epoch: u32,
    config: ContextConfig,
    scratch: Vec<Slot>,
}

impl<F: Float> Default for Context<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Context<F> {
    /// Create an empty context with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Create an empty context with the given configuration.
    pub fn with_config(config: ContextConfig) -> Self {
        Context {
            graph: Graph::new(&config),
            tape: Tape::with_capacity(config.tape_capacity),
            nested: Vec::new(),
            epoch: fresh_epoch(),
            config,
            scratch: Vec::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Replace the configuration. Only allowed on an empty root context.
    pub fn reconfigure(&mut self, config: ContextConfig) -> Result<()> {
        if !self.nested.is_empty() {
            return Err(AdError::NestedContextActive {
                depth: self.nested.len(),
            });
        }
        if !self.tape.is_empty() {
            return Err(AdError::ContextInUse {
                len: self.tape.len(),
            });
        }
        log::debug!("reconfiguring autodiff context: {:?}", config);
        *self = Context::with_config(config);
        Ok(())
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.tape.len()
    }

    /// Whether no nodes are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    /// Number of open nested scopes.
    #[inline]
    pub fn nested_depth(&self) -> usize {
        self.nested.len()
    }

    /// Positions of every live node, newest first.
    pub fn backward_view(&self) -> BackwardView {
        self.tape.backward_view()
    }

    /// Memory footprint of the node storage.
    pub fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage {
            nodes: self.tape.len(),
            bytes_used: self.graph.bytes_used(),
            bytes_reserved: self.graph.bytes_reserved(),
            blocks: self.graph.num_blocks(),
        }
    }

    // ── Recording ──

    fn record(&mut self, value: F, op: Op<F>) -> Var<F> {
        let slot = self.graph.alloc_node(Node::new(value, self.epoch, op));
        let index = self.tape.push(slot);
        Var::from_parts(value, index, self.epoch)
    }

    /// Operand slot for a handle used in arithmetic. Operators cannot return
    /// `Result`, so a stale operand is a panic, like any other misuse of a
    /// dangling handle.
    #[inline]
    fn operand(&self, var: Var<F>) -> Slot {
        match self.validate(var) {
            Ok(slot) => slot,
            Err(e) => panic!("{e}"),
        }
    }

    fn collect_operands<I>(&mut self, operands: I) -> Vec<Slot>
    where
        I: IntoIterator<Item = Var<F>>,
    {
        let mut slots = mem::take(&mut self.scratch);
        slots.clear();
        for var in operands {
            let slot = self.operand(var);
            slots.push(slot);
        }
        slots
    }

    /// Record an independent input.
    pub fn push_leaf(&mut self, value: F) -> Var<F> {
        self.record(value, Op::Leaf)
    }

    /// Record `value = f(x)` with `∂f/∂x = partial`.
    pub fn push_unary(&mut self, value: F, x: Var<F>, partial: F) -> Var<F> {
        let operand = self.operand(x);
        self.record(value, Op::Unary { operand, partial })
    }

    /// Record `value = f(x, y)` with partials `dx`, `dy`.
    pub fn push_binary(&mut self, value: F, x: Var<F>, dx: F, y: Var<F>, dy: F) -> Var<F> {
        let lhs = self.operand(x);
        let rhs = self.operand(y);
        self.record(
            value,
            Op::Binary {
                lhs,
                rhs,
                lhs_partial: dx,
                rhs_partial: dy,
            },
        )
    }

    /// Record a node over any number of operands with stored partials.
    ///
    /// # Panics
    ///
    /// Panics if the two iterators differ in length.
    pub fn push_nary<O, P>(&mut self, value: F, operands: O, partials: P) -> Var<F>
    where
        O: IntoIterator<Item = Var<F>>,
        P: IntoIterator<Item = F>,
        P::IntoIter: ExactSizeIterator,
    {
        let mut slots = self.collect_operands(operands);
        let partials = partials.into_iter();
        assert_eq!(
            slots.len(),
            partials.len(),
            "push_nary: operand and partial counts differ"
        );
        let operands = self.graph.alloc_operands(slots.drain(..));
        let partials = self.graph.alloc_partials(partials);
        self.scratch = slots;
        self.record(value, Op::Nary { operands, partials })
    }

    /// Record a node whose partials are computed by `callback` during the
    /// backward pass.
    pub fn push_custom<I>(
        &mut self,
        value: F,
        operands: I,
        callback: Box<dyn CustomPartials<F>>,
    ) -> Var<F>
    where
        I: IntoIterator<Item = Var<F>>,
    {
        let mut slots = self.collect_operands(operands);
        let operands = self.graph.alloc_operands(slots.drain(..));
        self.scratch = slots;
        let callback = self.graph.register_callback(callback);
        self.record(value, Op::Custom { operands, callback })
    }

    // ── Inspection ──

    /// Arena slot of the node behind `var`, or `StaleVariable` if that node
    /// was discarded (or belongs to another context).
    pub(crate) fn validate(&self, var: Var<F>) -> Result<Slot> {
        let stale = AdError::StaleVariable { index: var.index };
        let slot = self.tape.slot(var.index).ok_or_else(|| stale.clone())?;
        if !self.graph.contains(slot) || self.graph.node(slot).epoch != var.epoch {
            return Err(stale);
        }
        Ok(slot)
    }

    /// Whether `var` refers to a live node of this context.
    pub fn is_live(&self, var: Var<F>) -> bool {
        self.validate(var).is_ok()
    }

    /// Copy of the node behind `var`.
    pub fn node(&self, var: Var<F>) -> Result<Node<F>> {
        self.validate(var).map(|slot| *self.graph.node(slot))
    }

    /// Current adjoint of `var`.
    pub fn adjoint(&self, var: Var<F>) -> Result<F> {
        self.validate(var).map(|slot| self.graph.node(slot).adjoint)
    }

    // ── Gradients ──

    /// Tape position of the first node in the innermost nested scope.
    fn scope_floor(&self) -> u32 {
        self.nested.last().map_or(0, |m| m.tape_len as u32)
    }

    fn zero_from(&mut self, floor: u32) {
        for pos in self.tape.backward_view() {
            if pos < floor {
                break;
            }
            if let Some(slot) = self.tape.slot(pos) {
                self.graph.node_mut(slot).adjoint = F::zero();
            }
        }
    }

    fn sweep(&mut self, top: u32, floor: u32) {
        for pos in self.tape.backward_from(top) {
            if pos < floor {
                break;
            }
            if let Some(slot) = self.tape.slot(pos) {
                self.graph.propagate(slot);
            }
        }
    }

    /// Zero the adjoint of every live node.
    pub fn set_zero_all_adjoints(&mut self) {
        self.zero_from(0);
    }

    /// Zero the adjoints of nodes created in the innermost nested scope.
    pub fn set_zero_all_adjoints_nested(&mut self) {
        self.zero_from(self.scope_floor());
    }

    /// Gradient of `output` with respect to each of `inputs`.
    ///
    /// Only the part of the tape that can influence the result is swept: from
    /// the output down to the lower of the innermost scope's first node and
    /// the lowest input. Inputs created after the output get zero.
    pub fn grad(&mut self, output: Var<F>, inputs: &[Var<F>]) -> Result<Vec<F>> {
        self.grad_seeded(&[(output, F::one())], inputs)
    }

    /// Vector-Jacobian product: seed each output with its adjoint, sweep once
    /// and read the adjoints of `inputs`.
    pub fn grad_seeded(&mut self, seeds: &[(Var<F>, F)], inputs: &[Var<F>]) -> Result<Vec<F>> {
        let mut floor = self.scope_floor();
        let mut seed_slots = Vec::with_capacity(seeds.len());
        for &(var, _) in seeds {
            seed_slots.push(self.validate(var)?);
            floor = floor.min(var.index);
        }
        let mut input_slots = Vec::with_capacity(inputs.len());
        for &var in inputs {
            input_slots.push(self.validate(var)?);
            floor = floor.min(var.index);
        }

        self.zero_from(floor);
        let mut top = None;
        for (&slot, &(var, seed)) in seed_slots.iter().zip(seeds) {
            let node = self.graph.node_mut(slot);
            node.adjoint = node.adjoint + seed;
            top = top.max(Some(var.index));
        }
        if let Some(top) = top {
            self.sweep(top, floor);
        }

        Ok(input_slots
            .iter()
            .map(|&slot| self.graph.node(slot).adjoint)
            .collect())
    }

    /// Seed `output` and propagate over the whole tape, leaving every node's
    /// adjoint readable through [`Var::adjoint`].
    pub fn backward(&mut self, output: Var<F>) -> Result<()> {
        let slot = self.validate(output)?;
        self.zero_from(0);
        self.graph.node_mut(slot).adjoint = F::one();
        self.sweep(output.index, 0);
        Ok(())
    }

    /// Full Jacobian, one backward pass per dependent:
    /// `J[i][j] = ∂dependents[i]/∂independents[j]`.
    pub fn jacobian_of(
        &mut self,
        dependents: &[Var<F>],
        independents: &[Var<F>],
    ) -> Result<Vec<Vec<F>>> {
        dependents
            .iter()
            .map(|&dep| self.grad(dep, independents))
            .collect()
    }

    // ── Memory management ──

    /// Open a nested scope at the current tape position.
    pub fn start_nested(&mut self) {
        self.nested.push(NestedMark {
            tape_len: self.tape.len(),
            graph: self.graph.mark(),
        });
        log::trace!(
            "nested scope {} opened at tape position {}",
            self.nested.len(),
            self.tape.len()
        );
    }

    fn restore(&mut self, mark: NestedMark) {
        log::trace!(
            "nested scope {} closed, discarding {} node(s)",
            self.nested.len() + 1,
            self.tape.len() - mark.tape_len
        );
        self.tape.truncate_to(mark.tape_len);
        self.graph.recover_to(mark.graph);
        self.epoch = fresh_epoch();
    }

    /// Discard every node created since the matching
    /// [`start_nested`](Self::start_nested).
    pub fn recover_memory_nested(&mut self) -> Result<()> {
        let mark = self.nested.pop().ok_or(AdError::NoNestedContext)?;
        self.restore(mark);
        Ok(())
    }

    /// Close nested scopes until `depth` remain open.
    pub(crate) fn recover_nested_to(&mut self, depth: usize) {
        while self.nested.len() > depth {
            if let Some(mark) = self.nested.pop() {
                self.restore(mark);
            }
        }
    }

    /// Discard every node, keeping arena blocks for reuse.
    pub fn recover_memory(&mut self) -> Result<()> {
        if !self.nested.is_empty() {
            return Err(AdError::NestedContextActive {
                depth: self.nested.len(),
            });
        }
        log::debug!("recovering autodiff context ({} node(s))", self.tape.len());
        self.tape.clear();
        self.graph.recover_all();
        self.epoch = fresh_epoch();
        Ok(())
    }

    /// Discard every node and return all but the first arena block to the
    /// system.
    pub fn free_memory(&mut self) -> Result<()> {
        self.recover_memory()?;
        log::debug!(
            "freeing autodiff context memory ({} bytes reserved)",
            self.graph.bytes_reserved()
        );
        self.graph.free_all();
        self.tape = Tape::with_capacity(self.config.tape_capacity);
        self.scratch = Vec::new();
        Ok(())
    }
}

// ══════════════════════════════════════════════
//  Thread-local active context
// ══════════════════════════════════════════════

thread_local! {
    static CONTEXT_F32: RefCell<Context<f32>> = RefCell::new(Context::new());
    static CONTEXT_F64: RefCell<Context<f64>> = RefCell::new(Context::new());
}

/// Trait to select the thread-local context for a given float type.
pub trait ContextThreadLocal: Float {
    fn context() -> &'static LocalKey<RefCell<Context<Self>>>;
}

impl ContextThreadLocal for f32 {
    fn context() -> &'static LocalKey<RefCell<Context<Self>>> {
        &CONTEXT_F32
    }
}

impl ContextThreadLocal for f64 {
    fn context() -> &'static LocalKey<RefCell<Context<Self>>> {
        &CONTEXT_F64
    }
}

/// Access the active context for the current thread.
///
/// # Panics
///
/// Panics on re-entry, e.g. when a [`CustomPartials`] callback tries to
/// create variables while the backward pass holds the context.
#[inline]
pub fn with_context<F: ContextThreadLocal, R>(f: impl FnOnce(&mut Context<F>) -> R) -> R {
    F::context().with(|cell| {
        let mut ctx = match cell.try_borrow_mut() {
            Ok(ctx) => ctx,
            Err(_) => panic!("autodiff context is already borrowed on this thread"),
        };
        f(&mut ctx)
    })
}

/// RAII guard that installs an explicit context as the thread-local one and
/// puts the previous context back on drop.
pub struct ContextGuard<'a, F: ContextThreadLocal> {
    ctx: &'a mut Context<F>,
}

impl<'a, F: ContextThreadLocal> ContextGuard<'a, F> {
    /// Activate `ctx`. Variables created while the guard lives belong to it.
    pub fn new(ctx: &'a mut Context<F>) -> Self {
        with_context::<F, _>(|active| mem::swap(active, &mut *ctx));
        ContextGuard { ctx }
    }
}

impl<F: ContextThreadLocal> Drop for ContextGuard<'_, F> {
    fn drop(&mut self) {
        with_context::<F, _>(|active| mem::swap(active, &mut *self.ctx));
    }
}

/// Discard every node in the active context.
pub fn recover_memory<F: ContextThreadLocal>() -> Result<()> {
    with_context::<F, _>(|c| c.recover_memory())
}

/// Discard every node and release arena blocks in the active context.
pub fn free_memory<F: ContextThreadLocal>() -> Result<()> {
    with_context::<F, _>(|c| c.free_memory())
}

/// Memory footprint of the active context.
pub fn memory_usage<F: ContextThreadLocal>() -> MemoryUsage {
    with_context::<F, _>(|c| c.memory_usage())
}

/// Number of live nodes in the active context.
pub fn tape_len<F: ContextThreadLocal>() -> usize {
    with_context::<F, _>(|c| c.len())
}

/// Reconfigure the active context. It must be empty.
pub fn configure<F: ContextThreadLocal>(config: ContextConfig) -> Result<()> {
    with_context::<F, _>(|c| c.reconfigure(config))
}
