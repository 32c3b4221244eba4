use anyhow::Result;

use crate::kernel_framework::label::Label;

/// The minimal components of an environment an agent can operate in:
/// a current state, a way to act on it, and a set of terminal states.
pub trait Environment {
    type State: Label;
    type Action: Label;

    /// Place the agent back into the initial state.
    fn reset(&mut self);

    /// Perform `action` on the current state.
    /// Returns the state transitioned into.
    fn act(&mut self, action: &Self::Action) -> Result<Self::State>;

    fn current_state(&self) -> &Self::State;

    /// Mark `state` as terminal.
    fn add_terminal_state(&mut self, state: Self::State);

    fn is_terminal(&self, state: &Self::State) -> bool;
}
