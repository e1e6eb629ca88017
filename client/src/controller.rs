//! The seam between the session and the embedding application's decision logic

use shared::{Bullet, ControlCommand, Tank, Wall};

/// Turns snapshots into commands.
///
/// Called synchronously from the receive loop, so implementations must be
/// fast and must not block. Returning `None` sends nothing this cycle.
pub trait Controller {
    fn on_map_change(&mut self, walls: &[Wall]) -> Option<ControlCommand>;

    fn on_state_change(&mut self, tanks: &[Tank], bullets: &[Bullet]) -> Option<ControlCommand>;
}

/// Controller assembled from a pair of closures
pub struct FnController<M, S> {
    on_map_change: M,
    on_state_change: S,
}

impl<M, S> FnController<M, S>
where
    M: FnMut(&[Wall]) -> Option<ControlCommand>,
    S: FnMut(&[Tank], &[Bullet]) -> Option<ControlCommand>,
{
    pub fn new(on_map_change: M, on_state_change: S) -> Self {
        Self {
            on_map_change,
            on_state_change,
        }
    }
}

impl<M, S> Controller for FnController<M, S>
where
    M: FnMut(&[Wall]) -> Option<ControlCommand>,
    S: FnMut(&[Tank], &[Bullet]) -> Option<ControlCommand>,
{
    fn on_map_change(&mut self, walls: &[Wall]) -> Option<ControlCommand> {
        (self.on_map_change)(walls)
    }

    fn on_state_change(&mut self, tanks: &[Tank], bullets: &[Bullet]) -> Option<ControlCommand> {
        (self.on_state_change)(tanks, bullets)
    }
}
