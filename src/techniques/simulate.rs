use anyhow::Result;

use crate::kernel_traits::environment::Environment;

pub trait Simulator: Environment {
    /// Roll the environment out from its initial state: at each step the
    /// policy picks an action for the current state, until a terminal
    /// state is reached or `max_steps` actions have been taken.
    ///
    /// Returns the visited states, the initial state included.
    fn simulate<P>(&mut self, policy: P, max_steps: usize) -> Result<Vec<Self::State>>
    where
        P: FnMut(&Self::State) -> Self::Action;
}

impl<T: Environment> Simulator for T {
    fn simulate<P>(&mut self, mut policy: P, max_steps: usize) -> Result<Vec<Self::State>>
    where
        P: FnMut(&Self::State) -> Self::Action,
    {
        self.reset();
        let mut visited = vec![self.current_state().clone()];

        for _ in 0..max_steps {
            if self.is_terminal(self.current_state()) {
                break;
            }
            let action = policy(self.current_state());
            visited.push(self.act(&action)?);
        }

        log::debug!("simulated {} steps", visited.len() - 1);
        Ok(visited)
    }
}
