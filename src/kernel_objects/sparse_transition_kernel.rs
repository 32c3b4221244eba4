use std::collections::HashMap;

use anyhow::{Result, anyhow};
use ndarray::ArrayView1;
use rand::Rng;
use rand_chacha::rand_core::{RngCore, SeedableRng};

use crate::{
    kernel_framework::infoable::Infoable,
    kernel_traits::transition_kernel::TransitionKernel,
    math::choose_randomly::{choose_randomly, choose_with_variate, unit_interval},
};

/// A transition function that only materialises the (state, action)
/// rows that carry mass. Entries that were never set read as 0.
///
/// Suited for kernels where most rows have a handful of reachable next
/// states, such as large grid worlds. Unlike the dense store there is
/// no backing array to panic on bad indices, so out-of-range indices
/// are reported as errors.
#[derive(Clone, Debug)]
pub struct SparseTransitionKernel {
    number_of_states: usize,
    number_of_actions: usize,
    rows: HashMap<(usize, usize), Vec<(usize, f64)>>,
}

impl SparseTransitionKernel {
    pub fn new(number_of_states: usize, number_of_actions: usize) -> Self {
        Self {
            number_of_states,
            number_of_actions,
            rows: HashMap::new(),
        }
    }

    pub fn number_of_states(&self) -> usize {
        self.number_of_states
    }

    pub fn number_of_actions(&self) -> usize {
        self.number_of_actions
    }

    /// The number of entries that are materialised.
    pub fn number_of_entries(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    fn check(&self, state: usize, action: usize, next_state: usize) -> Result<()> {
        if state >= self.number_of_states || next_state >= self.number_of_states {
            return Err(anyhow!(
                "state index out of range: kernel has {} states",
                self.number_of_states
            ));
        }
        if action >= self.number_of_actions {
            return Err(anyhow!(
                "action index out of range: kernel has {} actions",
                self.number_of_actions
            ));
        }
        Ok(())
    }

    /// Assign an entry. Setting a probability of 0 removes the entry,
    /// so rows never accumulate dead weight.
    pub fn set(
        &mut self,
        state: usize,
        action: usize,
        next_state: usize,
        probability: f64,
    ) -> Result<()> {
        self.check(state, action, next_state)?;

        let row = self.rows.entry((state, action)).or_default();
        if probability == 0f64 {
            row.retain(|(target, _)| *target != next_state);
        } else if let Some((_, value)) = row.iter_mut().find(|(target, _)| *target == next_state) {
            *value = probability;
        } else {
            row.push((next_state, probability));
        }

        if self.rows.get(&(state, action)).is_some_and(|row| row.is_empty()) {
            self.rows.remove(&(state, action));
        }
        Ok(())
    }

    /// The distribution over next states of a (state, action) pair,
    /// materialised as a dense vector.
    pub fn distribution(&self, state: usize, action: usize) -> Result<Vec<f64>> {
        self.check(state, action, 0)?;
        let mut result = vec![0f64; self.number_of_states];
        if let Some(row) = self.rows.get(&(state, action)) {
            for (target, probability) in row {
                result[*target] = *probability;
            }
        }
        Ok(result)
    }

    pub fn sample(&self, state: usize, action: usize) -> Result<usize> {
        self.sample_with_rng(state, action, &mut rand::thread_rng())
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        state: usize,
        action: usize,
        rng: &mut R,
    ) -> Result<usize> {
        let (targets, weights) = self.row(state, action)?;
        let i = choose_randomly(ArrayView1::from(&weights), rng)?;
        Ok(targets[i])
    }

    pub fn sample_n(&self, state: usize, action: usize, n: usize) -> Result<Vec<usize>> {
        let mut rng = rand::thread_rng();
        (0..n)
            .map(|_| self.sample_with_rng(state, action, &mut rng))
            .collect()
    }

    pub fn sample_seeded(
        &self,
        state: usize,
        action: usize,
        seed: u64,
        n: usize,
    ) -> Result<Vec<usize>> {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let (targets, weights) = self.row(state, action)?;
        (0..n)
            .map(|_| {
                choose_with_variate(ArrayView1::from(&weights), unit_interval(rng.next_u64()))
                    .map(|i| targets[i])
            })
            .collect()
    }

    fn row(&self, state: usize, action: usize) -> Result<(Vec<usize>, Vec<f64>)> {
        self.check(state, action, 0)?;
        match self.rows.get(&(state, action)) {
            Some(row) => Ok(row.iter().copied().unzip()),
            None => Err(anyhow!(
                "distribution of state {} and action {} has no probability mass",
                state,
                action
            )),
        }
    }
}

impl TransitionKernel for SparseTransitionKernel {
    type State = usize;
    type Action = usize;

    fn probability(&self, state: &usize, action: &usize, next_state: &usize) -> Result<f64> {
        self.check(*state, *action, *next_state)?;
        Ok(self
            .rows
            .get(&(*state, *action))
            .and_then(|row| {
                row.iter()
                    .find(|(target, _)| target == next_state)
                    .map(|(_, probability)| *probability)
            })
            .unwrap_or(0f64))
    }
}

impl Infoable for SparseTransitionKernel {
    fn info(&self, f: &mut impl std::io::Write) -> Result<()> {
        writeln!(f, "Number of states\t{}", self.number_of_states)?;
        writeln!(f, "Number of actions\t{}", self.number_of_actions)?;
        writeln!(f, "Number of entries\t{}", self.number_of_entries())?;
        Ok(write!(f, "")?)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        kernel_objects::sparse_transition_kernel::SparseTransitionKernel,
        kernel_traits::transition_kernel::TransitionKernel,
    };

    #[test]
    fn absent_entries_read_zero() {
        let kernel = SparseTransitionKernel::new(3, 2);
        assert_eq!(kernel.probability(&0, &0, &2).unwrap(), 0.0);
        assert_eq!(kernel.number_of_entries(), 0);
    }

    #[test]
    fn set_then_read_back() {
        let mut kernel = SparseTransitionKernel::new(3, 2);
        kernel.set(0, 1, 2, 0.4).unwrap();
        kernel.set(0, 1, 0, 0.6).unwrap();

        assert_eq!(kernel.probability(&0, &1, &2).unwrap(), 0.4);
        assert_eq!(kernel.probability(&0, &1, &0).unwrap(), 0.6);
        assert_eq!(kernel.probability(&0, &1, &1).unwrap(), 0.0);
        assert_eq!(kernel.distribution(0, 1).unwrap(), vec![0.6, 0.0, 0.4]);
    }

    #[test]
    fn setting_zero_removes_the_entry() {
        let mut kernel = SparseTransitionKernel::new(3, 1);
        kernel.set(1, 0, 2, 0.5).unwrap();
        assert_eq!(kernel.number_of_entries(), 1);

        kernel.set(1, 0, 2, 0.0).unwrap();
        assert_eq!(kernel.number_of_entries(), 0);
        assert_eq!(kernel.probability(&1, &0, &2).unwrap(), 0.0);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let mut kernel = SparseTransitionKernel::new(3, 2);
        assert!(kernel.set(3, 0, 0, 1.0).is_err());
        assert!(kernel.set(0, 2, 0, 1.0).is_err());
        assert!(kernel.set(0, 0, 3, 1.0).is_err());
        assert!(kernel.probability(&0, &0, &3).is_err());
        assert!(kernel.sample(3, 0).is_err());
    }

    #[test]
    fn degenerate_sampling_is_deterministic() {
        let mut kernel = SparseTransitionKernel::new(5, 1);
        kernel.set(2, 0, 4, 1.0).unwrap();
        for _ in 0..20 {
            assert_eq!(kernel.sample(2, 0).unwrap(), 4);
        }
    }

    #[test]
    fn sampling_an_empty_row_is_an_error() {
        let kernel = SparseTransitionKernel::new(3, 2);
        assert!(kernel.sample(0, 0).is_err());
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let mut kernel = SparseTransitionKernel::new(4, 1);
        kernel.set(0, 0, 1, 0.5).unwrap();
        kernel.set(0, 0, 3, 0.5).unwrap();

        let a = kernel.sample_seeded(0, 0, 7, 30).unwrap();
        let b = kernel.sample_seeded(0, 0, 7, 30).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|next_state| *next_state == 1 || *next_state == 3));
    }
}
