use std::collections::HashSet;
use std::fmt::Display;

use anyhow::{Result, anyhow};
use itertools::iproduct;

use crate::{
    kernel_framework::label_key::LabelKey,
    kernel_objects::discrete_environment::DiscreteEnvironment,
    kernel_traits::{environment::Environment, transition_kernel::TransitionKernel},
};

/// A position in a 2-D grid world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// The moves available to a grid-world agent. `Up` decreases y, `Down`
/// increases it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
    Stay,
}

impl Move {
    /// The cell this move leads to, or None when it leaves the grid.
    fn target(&self, cell: Cell, width: usize, height: usize) -> Option<Cell> {
        let (dx, dy) = match self {
            Move::Up => (0isize, -1isize),
            Move::Right => (1, 0),
            Move::Down => (0, 1),
            Move::Left => (-1, 0),
            Move::Stay => (0, 0),
        };
        let x = cell.x.checked_add_signed(dx)?;
        let y = cell.y.checked_add_signed(dy)?;
        if x >= width || y >= height {
            return None;
        }
        Some(Cell::new(x, y))
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Up => write!(f, "up"),
            Move::Right => write!(f, "right"),
            Move::Down => write!(f, "down"),
            Move::Left => write!(f, "left"),
            Move::Stay => write!(f, "stay"),
        }
    }
}

/// A 2-D grid world. States are the (x, y) positions of the agent,
/// minus the blocked cells; actions are the four moves, plus `Stay`
/// when `can_stay`. A move that leaves the grid or hits a blocked cell
/// keeps the agent in place.
#[derive(Clone, Debug)]
pub struct Gridworld {
    environment: DiscreteEnvironment<Cell, Move>,
    width: usize,
    height: usize,
    blocked: HashSet<Cell>,
}

impl Gridworld {
    /// A gridworld with deterministic moves.
    pub fn new(width: usize, height: usize, can_stay: bool, blocked: &[Cell]) -> Result<Self> {
        Self::build(width, height, can_stay, blocked, 0f64)
    }

    /// A gridworld where each move is perturbed: with probability
    /// `noise`, the agent instead moves to a uniformly chosen valid
    /// neighbouring cell (possibly staying in place).
    pub fn new_noisy(
        width: usize,
        height: usize,
        can_stay: bool,
        blocked: &[Cell],
        noise: f64,
    ) -> Result<Self> {
        if !(0f64..=1f64).contains(&noise) {
            return Err(anyhow!("noise level {} is not a probability", noise));
        }
        Self::build(width, height, can_stay, blocked, noise)
    }

    fn build(
        width: usize,
        height: usize,
        can_stay: bool,
        blocked: &[Cell],
        noise: f64,
    ) -> Result<Self> {
        let blocked: HashSet<Cell> = blocked.iter().copied().collect();
        for cell in &blocked {
            if cell.x >= width || cell.y >= height {
                return Err(anyhow!(
                    "blocked cell {} lies outside the {}x{} grid",
                    cell,
                    width,
                    height
                ));
            }
        }

        let cells: Vec<Cell> = iproduct!(0..width, 0..height)
            .map(|(x, y)| Cell::new(x, y))
            .filter(|cell| !blocked.contains(cell))
            .collect();
        let mut moves = vec![Move::Up, Move::Right, Move::Down, Move::Left];
        if can_stay {
            moves.push(Move::Stay);
        }

        let state_space = LabelKey::from_labels(cells.iter().copied())?;
        let action_space = LabelKey::from_labels(moves.iter().copied())?;
        let environment = DiscreteEnvironment::new(state_space, action_space, None)?;

        log::debug!(
            "populate {}x{} gridworld kernel, {} states, {} actions",
            width,
            height,
            cells.len(),
            moves.len()
        );

        let mut result = Self {
            environment,
            width,
            height,
            blocked,
        };

        for (cell, direction) in iproduct!(cells.iter(), moves.iter()) {
            result.set_deterministic(*cell, *direction)?;
        }
        if noise > 0f64 {
            for (cell, direction) in iproduct!(cells.iter(), moves.iter()) {
                result.spread_noise(*cell, *direction, noise)?;
            }
        }

        Ok(result)
    }

    /// Probability 1 on the moved-to cell; moves off the grid or into a
    /// blocked cell keep the agent in place.
    fn set_deterministic(&mut self, cell: Cell, direction: Move) -> Result<()> {
        let next_cell = direction
            .target(cell, self.width, self.height)
            .filter(|target| !self.blocked.contains(target))
            .unwrap_or(cell);
        self.environment
            .transition_mut()
            .set(&cell, &direction, &next_cell, 1f64)
    }

    /// Redistribute the row of (`cell`, `move`): scale the mass on the
    /// 5-neighbourhood by (1 - noise), then spread `noise` uniformly
    /// over the valid neighbours.
    fn spread_noise(&mut self, cell: Cell, direction: Move, noise: f64) -> Result<()> {
        let mut neighbours = vec![];
        for (dx, dy) in [(0isize, 0isize), (0, -1), (0, 1), (-1, 0), (1, 0)] {
            let Some(x) = cell.x.checked_add_signed(dx) else {
                continue;
            };
            let Some(y) = cell.y.checked_add_signed(dy) else {
                continue;
            };
            let neighbour = Cell::new(x, y);
            if x >= self.width || y >= self.height || self.blocked.contains(&neighbour) {
                continue;
            }

            let probability =
                self.environment
                    .transition()
                    .probability(&cell, &direction, &neighbour)?;
            self.environment.transition_mut().set(
                &cell,
                &direction,
                &neighbour,
                probability * (1f64 - noise),
            )?;
            neighbours.push(neighbour);
        }

        for neighbour in &neighbours {
            let probability =
                self.environment
                    .transition()
                    .probability(&cell, &direction, neighbour)?;
            self.environment.transition_mut().set(
                &cell,
                &direction,
                neighbour,
                probability + noise / neighbours.len() as f64,
            )?;
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_blocked(&self, cell: &Cell) -> bool {
        self.blocked.contains(cell)
    }

    pub fn environment(&self) -> &DiscreteEnvironment<Cell, Move> {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut DiscreteEnvironment<Cell, Move> {
        &mut self.environment
    }

    pub fn into_environment(self) -> DiscreteEnvironment<Cell, Move> {
        self.environment
    }
}

impl Environment for Gridworld {
    type State = Cell;
    type Action = Move;

    fn reset(&mut self) {
        self.environment.reset();
    }

    fn act(&mut self, action: &Move) -> Result<Cell> {
        self.environment.act(action)
    }

    fn current_state(&self) -> &Cell {
        self.environment.current_state()
    }

    fn add_terminal_state(&mut self, state: Cell) {
        self.environment.add_terminal_state(state);
    }

    fn is_terminal(&self, state: &Cell) -> bool {
        self.environment.is_terminal(state)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        kernel_objects::gridworld::{Cell, Gridworld, Move},
        kernel_traits::{environment::Environment, transition_kernel::TransitionKernel},
    };

    #[test]
    fn interior_moves_are_deterministic() {
        let world = Gridworld::new(3, 3, true, &[]).unwrap();
        let transition = world.environment().transition();

        assert_eq!(
            transition
                .probability(&Cell::new(1, 1), &Move::Right, &Cell::new(2, 1))
                .unwrap(),
            1.0
        );
        assert_eq!(
            transition
                .probability(&Cell::new(1, 1), &Move::Up, &Cell::new(1, 0))
                .unwrap(),
            1.0
        );
        assert_eq!(
            transition
                .probability(&Cell::new(1, 1), &Move::Stay, &Cell::new(1, 1))
                .unwrap(),
            1.0
        );
    }

    #[test]
    fn edge_moves_stay_in_place() {
        let world = Gridworld::new(3, 3, false, &[]).unwrap();
        let transition = world.environment().transition();

        assert_eq!(
            transition
                .probability(&Cell::new(0, 0), &Move::Up, &Cell::new(0, 0))
                .unwrap(),
            1.0
        );
        assert_eq!(
            transition
                .probability(&Cell::new(2, 2), &Move::Right, &Cell::new(2, 2))
                .unwrap(),
            1.0
        );
    }

    #[test]
    fn blocked_cells_are_not_states_and_not_entered() {
        let world = Gridworld::new(3, 3, true, &[Cell::new(1, 0)]).unwrap();

        assert!(world.is_blocked(&Cell::new(1, 0)));
        assert!(!world.environment().state_space().contains(&Cell::new(1, 0)));

        //moving into the blocked cell keeps the agent in place
        let transition = world.environment().transition();
        assert_eq!(
            transition
                .probability(&Cell::new(0, 0), &Move::Right, &Cell::new(0, 0))
                .unwrap(),
            1.0
        );
    }

    #[test]
    fn blocked_cells_must_lie_inside_the_grid() {
        assert!(Gridworld::new(3, 3, true, &[Cell::new(5, 0)]).is_err());
    }

    #[test]
    fn without_stay_there_are_four_actions() {
        let world = Gridworld::new(2, 2, false, &[]).unwrap();
        assert_eq!(world.environment().action_space().len(), 4);
        assert!(!world.environment().action_space().contains(&Move::Stay));

        let world = Gridworld::new(2, 2, true, &[]).unwrap();
        assert_eq!(world.environment().action_space().len(), 5);
    }

    #[test]
    fn noisy_rows_still_sum_to_one() {
        let world = Gridworld::new_noisy(4, 4, true, &[Cell::new(2, 2)], 0.1).unwrap();

        for cell in world.environment().state_space().iter() {
            for direction in world.environment().action_space().iter() {
                let row = world
                    .environment()
                    .transition()
                    .distribution(cell, direction)
                    .unwrap();
                let total: f64 = row.sum();
                assert!(
                    (total - 1.0).abs() < 1e-9,
                    "row of {} {} sums to {}",
                    cell,
                    direction,
                    total
                );
            }
        }
    }

    #[test]
    fn noise_outside_the_unit_interval_is_rejected() {
        assert!(Gridworld::new_noisy(2, 2, true, &[], 1.5).is_err());
        assert!(Gridworld::new_noisy(2, 2, true, &[], -0.1).is_err());
    }

    #[test]
    fn acting_in_a_deterministic_world() {
        let mut world = Gridworld::new(3, 1, false, &[]).unwrap();
        assert_eq!(world.current_state(), &Cell::new(0, 0));
        assert_eq!(world.act(&Move::Right).unwrap(), Cell::new(1, 0));
        assert_eq!(world.act(&Move::Right).unwrap(), Cell::new(2, 0));
        //bumping the wall
        assert_eq!(world.act(&Move::Right).unwrap(), Cell::new(2, 0));
        world.reset();
        assert_eq!(world.current_state(), &Cell::new(0, 0));
    }
}
