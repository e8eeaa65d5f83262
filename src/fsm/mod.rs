//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust, generic over the context
//! it threads through and the state enum it walks:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  StateTable                                                 │
//! │  ┌────────────┬───────────┬──────────┬──────────────────┐   │
//! │  │ State      │ on_enter  │ on_exit  │ on_update        │   │
//! │  ├────────────┼───────────┼──────────┼──────────────────┤   │
//! │  │ S::A       │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Result< │   │
//! │  │ S::B       │ fn(ctx)   │ fn(ctx)  │   Option<S>, E>  │   │
//! │  │ ...        │           │          │                  │   │
//! │  └────────────┴───────────┴──────────┴──────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step the engine calls `on_update` for the **current** state.
//! Updates may block (waiting on the link or a timed sequence).  If one
//! returns `Ok(Some(next))`, the engine runs `on_exit` for the current
//! state, then `on_enter` for the next.  An `Err` leaves the state
//! unchanged and is returned to the caller.
//!
//! Two tables exist: [`front`] (screens) and [`back`] (command handling).

pub mod back;
pub mod front;

use core::fmt::Debug;

use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Implemented by each state enum.  `index()` must match the row of the
/// state in its table.
pub trait StateId: Copy + Eq + Debug {
    fn index(self) -> usize;
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn<C> = fn(&mut C);

/// Signature for the per-step update handler.
pub type StateUpdateFn<C, S, E> = fn(&mut C) -> Result<Option<S>, E>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor<C, S, E> {
    pub id: S,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn<C>>,
    pub on_exit: Option<StateActionFn<C>>,
    pub on_update: StateUpdateFn<C, S, E>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns a fixed-size table of [`StateDescriptor`]s; the context is passed
/// in on every call so the owner keeps direct access to it between steps.
pub struct Fsm<C, S, E, const N: usize> {
    table: [StateDescriptor<C, S, E>; N],
    current: usize,
}

impl<C, S: StateId, E, const N: usize> Fsm<C, S, E, N> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor<C, S, E>; N], initial: S) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id.index() == i),
            "state table rows out of order"
        );
        Self {
            table,
            current: initial.index(),
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `step()`.
    pub fn start(&mut self, ctx: &mut C) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one step.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Ok(Some(next))`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn step(&mut self, ctx: &mut C) -> Result<(), E> {
        let next = (self.table[self.current].on_update)(ctx)?;
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
        Ok(())
    }

    /// Force an immediate transition (used by the service layer to jump to
    /// the escalation state regardless of what `on_update` returned).
    pub fn force_transition(&mut self, next: S, ctx: &mut C) {
        if next.index() != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> S {
        self.table[self.current].id
    }

    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    /// Name of any state in the table.
    pub fn name_of(&self, state: S) -> &'static str {
        self.table[state.index()].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: S, ctx: &mut C) {
        let next_idx = next_id.index();

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
