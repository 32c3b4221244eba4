use anyhow::{Result, anyhow};
use ndarray::{Array3, ArrayView1, ArrayViewD, ArrayViewMutD, Axis, s};
use rand::Rng;
use rand_chacha::rand_core::{RngCore, SeedableRng};

use crate::{
    kernel_framework::infoable::Infoable,
    kernel_traits::transition_kernel::TransitionKernel,
    math::choose_randomly::{choose_randomly, choose_with_variate, unit_interval},
};

/// A partial index into the transition tensor. These are the three
/// access patterns a planner needs: everything below a state, the
/// next-state distribution of a (state, action) pair, and a single
/// entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelIndex {
    /// Fixes the state axis; yields an action x next-state matrix.
    State(usize),
    /// Fixes state and action; yields a next-state distribution vector.
    StateAction(usize, usize),
    /// Fixes all three axes; yields a single entry.
    Element(usize, usize, usize),
}

/// A transition function held as a dense 3-dimensional tensor of shape
/// (states x actions x states), state outer, action middle, next-state
/// inner.
///
/// Indices are not checked beyond what the tensor itself does:
/// out-of-range access panics.
#[derive(Clone)]
pub struct DenseTransitionKernel {
    tensor: Array3<f64>,
}

impl DenseTransitionKernel {
    pub fn new(number_of_states: usize, number_of_actions: usize) -> Self {
        Self::new_with(number_of_states, number_of_actions, 0f64)
    }

    pub fn new_with(
        number_of_states: usize,
        number_of_actions: usize,
        initial_value: f64,
    ) -> Self {
        log::debug!(
            "allocate {}x{}x{} transition tensor",
            number_of_states,
            number_of_actions,
            number_of_states
        );
        Self {
            tensor: Array3::from_elem(
                (number_of_states, number_of_actions, number_of_states),
                initial_value,
            ),
        }
    }

    pub fn number_of_states(&self) -> usize {
        self.tensor.len_of(Axis(0))
    }

    pub fn number_of_actions(&self) -> usize {
        self.tensor.len_of(Axis(1))
    }

    pub fn set(&mut self, state: usize, action: usize, next_state: usize, probability: f64) {
        self.tensor[[state, action, next_state]] = probability;
    }

    /// Assign several entries in one call: the four slices are zipped
    /// element-wise, so `set_all(&[0, 1], &[0, 0], &[2, 3], &[0.5, 0.7])`
    /// sets entry (0, 0, 2) to 0.5 and entry (1, 0, 3) to 0.7.
    pub fn set_all(
        &mut self,
        states: &[usize],
        actions: &[usize],
        next_states: &[usize],
        probabilities: &[f64],
    ) -> Result<()> {
        if states.len() != actions.len()
            || states.len() != next_states.len()
            || states.len() != probabilities.len()
        {
            return Err(anyhow!(
                "cannot zip index slices of lengths {}, {}, {} with {} probabilities",
                states.len(),
                actions.len(),
                next_states.len(),
                probabilities.len()
            ));
        }
        for i in 0..states.len() {
            self.set(states[i], actions[i], next_states[i], probabilities[i]);
        }
        Ok(())
    }

    /// A view into the tensor along any of the three partial-index
    /// patterns.
    pub fn view(&self, index: KernelIndex) -> ArrayViewD<'_, f64> {
        match index {
            KernelIndex::State(state) => self.tensor.slice(s![state, .., ..]).into_dyn(),
            KernelIndex::StateAction(state, action) => {
                self.tensor.slice(s![state, action, ..]).into_dyn()
            }
            KernelIndex::Element(state, action, next_state) => {
                self.tensor.slice(s![state, action, next_state]).into_dyn()
            }
        }
    }

    /// The mutable counterpart of `view`; slice assignment is ndarray's
    /// `assign`/`fill` on the returned view.
    pub fn view_mut(&mut self, index: KernelIndex) -> ArrayViewMutD<'_, f64> {
        match index {
            KernelIndex::State(state) => self.tensor.slice_mut(s![state, .., ..]).into_dyn(),
            KernelIndex::StateAction(state, action) => {
                self.tensor.slice_mut(s![state, action, ..]).into_dyn()
            }
            KernelIndex::Element(state, action, next_state) => self
                .tensor
                .slice_mut(s![state, action, next_state])
                .into_dyn(),
        }
    }

    /// The distribution over next states of a (state, action) pair.
    pub fn distribution(&self, state: usize, action: usize) -> ArrayView1<'_, f64> {
        self.tensor.slice(s![state, action, ..])
    }

    /// Draw one next state from the distribution of (`state`, `action`).
    pub fn sample(&self, state: usize, action: usize) -> Result<usize> {
        self.sample_with_rng(state, action, &mut rand::thread_rng())
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        state: usize,
        action: usize,
        rng: &mut R,
    ) -> Result<usize> {
        choose_randomly(self.distribution(state, action), rng)
    }

    /// Draw `n` next states, independently and identically distributed.
    pub fn sample_n(&self, state: usize, action: usize, n: usize) -> Result<Vec<usize>> {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| self.sample_with_rng(state, action, &mut rng))
            .collect()
    }

    /// Draw `n` next states reproducibly. The sequence depends only on
    /// the seed and the distribution, independent of platform.
    pub fn sample_seeded(
        &self,
        state: usize,
        action: usize,
        seed: u64,
        n: usize,
    ) -> Result<Vec<usize>> {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let distribution = self.distribution(state, action);
        (0..n)
            .map(|_| choose_with_variate(distribution, unit_interval(rng.next_u64())))
            .collect()
    }
}

impl TransitionKernel for DenseTransitionKernel {
    type State = usize;
    type Action = usize;

    fn probability(&self, state: &usize, action: &usize, next_state: &usize) -> Result<f64> {
        Ok(self.tensor[[*state, *action, *next_state]])
    }
}

impl std::fmt::Debug for DenseTransitionKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}x{} transition kernel",
            self.number_of_states(),
            self.number_of_actions(),
            self.number_of_states()
        )
    }
}

impl Infoable for DenseTransitionKernel {
    fn info(&self, f: &mut impl std::io::Write) -> Result<()> {
        writeln!(f, "Number of states\t{}", self.number_of_states())?;
        writeln!(f, "Number of actions\t{}", self.number_of_actions())?;
        Ok(write!(f, "")?)
    }
}
