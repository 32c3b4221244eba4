use std::collections::HashSet;

use anyhow::Result;

use crate::{
    kernel_framework::{infoable::Infoable, label::Label, label_key::LabelKey},
    kernel_objects::{
        dense_transition_kernel::DenseTransitionKernel,
        symbolic_transition_kernel::SymbolicTransitionKernel,
    },
    kernel_traits::environment::Environment,
};

/// An environment with a finite set of labelled states and actions,
/// whose dynamics are a transition kernel over the two label spaces.
///
/// The kernel starts out all-zero; callers populate it through
/// `transition_mut` before acting.
#[derive(Clone, Debug)]
pub struct DiscreteEnvironment<S: Label, A: Label> {
    transition: SymbolicTransitionKernel<S, A>,
    terminal_states: HashSet<S>,
    initial_state: S,
    current_state: S,
}

impl<S: Label, A: Label> DiscreteEnvironment<S, A> {
    /// Create an environment over the given state and action spaces.
    /// If no initial state is provided, the first state of the space is
    /// assumed.
    pub fn new(
        state_space: LabelKey<S>,
        action_space: LabelKey<A>,
        initial_state: Option<S>,
    ) -> Result<Self> {
        let initial_state = match initial_state {
            Some(state) => {
                state_space.index_of(&state)?;
                state
            }
            None => state_space.label_of(0)?.clone(),
        };

        let kernel = DenseTransitionKernel::new(state_space.len(), action_space.len());
        let transition = SymbolicTransitionKernel::new(kernel, state_space, action_space)?;

        Ok(Self {
            transition,
            terminal_states: HashSet::new(),
            current_state: initial_state.clone(),
            initial_state,
        })
    }

    pub fn transition(&self) -> &SymbolicTransitionKernel<S, A> {
        &self.transition
    }

    pub fn transition_mut(&mut self) -> &mut SymbolicTransitionKernel<S, A> {
        &mut self.transition
    }

    pub fn initial_state(&self) -> &S {
        &self.initial_state
    }

    pub fn state_space(&self) -> &LabelKey<S> {
        self.transition.state_key()
    }

    pub fn action_space(&self) -> &LabelKey<A> {
        self.transition.action_key()
    }
}

impl<S: Label, A: Label> Environment for DiscreteEnvironment<S, A> {
    type State = S;
    type Action = A;

    fn reset(&mut self) {
        self.current_state = self.initial_state.clone();
    }

    fn act(&mut self, action: &A) -> Result<S> {
        let next_state = self.transition.sample(&self.current_state, action)?.clone();
        self.current_state = next_state.clone();
        Ok(next_state)
    }

    fn current_state(&self) -> &S {
        &self.current_state
    }

    fn add_terminal_state(&mut self, state: S) {
        self.terminal_states.insert(state);
    }

    fn is_terminal(&self, state: &S) -> bool {
        self.terminal_states.contains(state)
    }
}

impl<S: Label, A: Label> Infoable for DiscreteEnvironment<S, A> {
    fn info(&self, f: &mut impl std::io::Write) -> Result<()> {
        writeln!(f, "Number of states\t{}", self.state_space().len())?;
        writeln!(f, "Number of actions\t{}", self.action_space().len())?;
        writeln!(f, "Number of terminal states\t{}", self.terminal_states.len())?;
        Ok(write!(f, "")?)
    }
}
