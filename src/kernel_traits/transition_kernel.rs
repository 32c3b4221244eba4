use anyhow::Result;

/// The capability of being queried for transition probabilities:
/// anything that can answer P(next_state | state, action).
///
/// Realized by the dense tensor store, the sparse store, and the
/// symbolic adapter; further backends (lazy-computed, factored) only
/// need this one operation.
pub trait TransitionKernel {
    type State;
    type Action;

    /// The probability of moving to `next_state` when `action` is taken
    /// in `state`.
    fn probability(
        &self,
        state: &Self::State,
        action: &Self::Action,
        next_state: &Self::State,
    ) -> Result<f64>;
}
