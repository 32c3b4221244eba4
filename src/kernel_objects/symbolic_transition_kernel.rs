use anyhow::{Result, anyhow};
use ndarray::{ArrayView1, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use crate::{
    kernel_framework::{infoable::Infoable, label::Label, label_key::LabelKey},
    kernel_objects::dense_transition_kernel::{DenseTransitionKernel, KernelIndex},
    kernel_traits::transition_kernel::TransitionKernel,
};

/// The labelled counterpart of `KernelIndex`: the same three
/// partial-index patterns, with labels in place of indices.
#[derive(Clone, Copy, Debug)]
pub enum SymbolicIndex<'a, S, A> {
    State(&'a S),
    StateAction(&'a S, &'a A),
    Element(&'a S, &'a A, &'a S),
}

/// Presents a dense transition kernel under symbolic state and action
/// labels. Every operation translates its labels through the two keys
/// and delegates to the wrapped kernel; `sample` translates the drawn
/// index back to a state label.
///
/// A label without an entry in its key is an error; there is no
/// fallback mapping.
#[derive(Clone, Debug)]
pub struct SymbolicTransitionKernel<S: Label, A: Label> {
    kernel: DenseTransitionKernel,
    state_key: LabelKey<S>,
    action_key: LabelKey<A>,
}

impl<S: Label, A: Label> SymbolicTransitionKernel<S, A> {
    pub fn new(
        kernel: DenseTransitionKernel,
        state_key: LabelKey<S>,
        action_key: LabelKey<A>,
    ) -> Result<Self> {
        if state_key.len() > kernel.number_of_states() {
            return Err(anyhow!(
                "state key has {} labels, but the kernel has only {} states",
                state_key.len(),
                kernel.number_of_states()
            ));
        }
        if action_key.len() > kernel.number_of_actions() {
            return Err(anyhow!(
                "action key has {} labels, but the kernel has only {} actions",
                action_key.len(),
                kernel.number_of_actions()
            ));
        }
        Ok(Self {
            kernel,
            state_key,
            action_key,
        })
    }

    pub fn kernel(&self) -> &DenseTransitionKernel {
        &self.kernel
    }

    pub fn into_kernel(self) -> DenseTransitionKernel {
        self.kernel
    }

    pub fn state_key(&self) -> &LabelKey<S> {
        &self.state_key
    }

    pub fn action_key(&self) -> &LabelKey<A> {
        &self.action_key
    }

    /// Translate a labelled partial index into an integer one,
    /// component by component.
    pub fn translate(&self, index: SymbolicIndex<S, A>) -> Result<KernelIndex> {
        Ok(match index {
            SymbolicIndex::State(state) => KernelIndex::State(self.state_key.index_of(state)?),
            SymbolicIndex::StateAction(state, action) => KernelIndex::StateAction(
                self.state_key.index_of(state)?,
                self.action_key.index_of(action)?,
            ),
            SymbolicIndex::Element(state, action, next_state) => KernelIndex::Element(
                self.state_key.index_of(state)?,
                self.action_key.index_of(action)?,
                self.state_key.index_of(next_state)?,
            ),
        })
    }

    pub fn set(&mut self, state: &S, action: &A, next_state: &S, probability: f64) -> Result<()> {
        let state = self.state_key.index_of(state)?;
        let action = self.action_key.index_of(action)?;
        let next_state = self.state_key.index_of(next_state)?;
        self.kernel.set(state, action, next_state, probability);
        Ok(())
    }

    pub fn view(&self, index: SymbolicIndex<S, A>) -> Result<ArrayViewD<'_, f64>> {
        let index = self.translate(index)?;
        Ok(self.kernel.view(index))
    }

    pub fn view_mut(&mut self, index: SymbolicIndex<S, A>) -> Result<ArrayViewMutD<'_, f64>> {
        let index = self.translate(index)?;
        Ok(self.kernel.view_mut(index))
    }

    pub fn distribution(&self, state: &S, action: &A) -> Result<ArrayView1<'_, f64>> {
        let state = self.state_key.index_of(state)?;
        let action = self.action_key.index_of(action)?;
        Ok(self.kernel.distribution(state, action))
    }

    /// Draw one next state and translate it back to its label.
    pub fn sample(&self, state: &S, action: &A) -> Result<&S> {
        self.sample_with_rng(state, action, &mut rand::thread_rng())
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        state: &S,
        action: &A,
        rng: &mut R,
    ) -> Result<&S> {
        let state = self.state_key.index_of(state)?;
        let action = self.action_key.index_of(action)?;
        let next_state = self.kernel.sample_with_rng(state, action, rng)?;
        self.state_key.label_of(next_state)
    }

    pub fn sample_n(&self, state: &S, action: &A, n: usize) -> Result<Vec<&S>> {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| self.sample_with_rng(state, action, &mut rng))
            .collect()
    }

    pub fn sample_seeded(&self, state: &S, action: &A, seed: u64, n: usize) -> Result<Vec<&S>> {
        let state = self.state_key.index_of(state)?;
        let action = self.action_key.index_of(action)?;
        self.kernel
            .sample_seeded(state, action, seed, n)?
            .into_iter()
            .map(|next_state| self.state_key.label_of(next_state))
            .collect()
    }
}

impl<S: Label, A: Label> TransitionKernel for SymbolicTransitionKernel<S, A> {
    type State = S;
    type Action = A;

    fn probability(&self, state: &S, action: &A, next_state: &S) -> Result<f64> {
        let state = self.state_key.index_of(state)?;
        let action = self.action_key.index_of(action)?;
        let next_state = self.state_key.index_of(next_state)?;
        self.kernel.probability(&state, &action, &next_state)
    }
}

impl<S: Label, A: Label> Infoable for SymbolicTransitionKernel<S, A> {
    fn info(&self, f: &mut impl std::io::Write) -> Result<()> {
        writeln!(f, "Number of state labels\t{}", self.state_key.len())?;
        writeln!(f, "Number of action labels\t{}", self.action_key.len())?;
        self.kernel.info(f)
    }
}
