//! The Karel agent: movement, turning, beeper accounting and snapshot bookkeeping.

use crate::{
    BeeperBag, Direction, EdgePolicy, Frame, History, KarelConfig, KarelError, NullRenderer,
    Position, SnapshotRenderer, SnapshotView, Step, World,
};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Agent state bound to a world and a snapshot renderer.
pub struct Karel<R: SnapshotRenderer = NullRenderer> {
    config: KarelConfig,
    world: World,
    position: Position,
    direction: Direction,
    bag: BeeperBag,
    beepers: BTreeMap<Position, u32>,
    step: Step,
    history: History<R::Artifact>,
    renderer: R,
}

impl<R: SnapshotRenderer> fmt::Debug for Karel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Karel")
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("bag", &self.bag)
            .field("beepers", &self.beepers)
            .field("step", &self.step)
            .field("history_len", &self.history.len())
            .finish()
    }
}

/// Everything [`Karel::reset`] replaces in one go.
struct Fresh<A> {
    world: World,
    position: Position,
    direction: Direction,
    bag: BeeperBag,
    beepers: BTreeMap<Position, u32>,
    history: History<A>,
}

impl<A> Fresh<A> {
    fn from_config(config: &KarelConfig) -> Result<Self, KarelError> {
        config.validate()?;
        let world = config.world.build();
        if world.is_blocked(config.start)? {
            return Err(KarelError::StartOnObstacle {
                position: config.start,
            });
        }
        Ok(Self {
            beepers: world.seeded_beepers().clone(),
            world,
            position: config.start,
            direction: config.facing,
            bag: config.bag,
            history: History::new(config.history_capacity),
        })
    }
}

impl Karel<NullRenderer> {
    /// Agent that keeps step numbers but renders nothing.
    pub fn headless(config: KarelConfig) -> Result<Self, KarelError> {
        Self::new(config, NullRenderer)
    }
}

impl<R: SnapshotRenderer> Karel<R> {
    /// Validates the configuration and places the agent. No snapshot is taken.
    pub fn new(config: KarelConfig, renderer: R) -> Result<Self, KarelError> {
        let fresh = Fresh::from_config(&config)?;
        debug!(
            start = %fresh.position,
            facing = %fresh.direction,
            width = fresh.world.width(),
            height = fresh.world.height(),
            "karel initialised"
        );
        Ok(Self {
            config,
            world: fresh.world,
            position: fresh.position,
            direction: fresh.direction,
            bag: fresh.bag,
            beepers: fresh.beepers,
            step: Step::zero(),
            history: fresh.history,
            renderer,
        })
    }

    /// Reinitialises every piece of state from `config`. On error nothing changes.
    pub fn reset(&mut self, config: KarelConfig) -> Result<(), KarelError> {
        let fresh = Fresh::from_config(&config)?;
        self.world = fresh.world;
        self.position = fresh.position;
        self.direction = fresh.direction;
        self.bag = fresh.bag;
        self.beepers = fresh.beepers;
        self.history = fresh.history;
        self.step = Step::zero();
        self.config = config;
        debug!(start = %self.position, facing = %self.direction, "karel reset");
        Ok(())
    }

    /// Swaps in a custom world. The agent keeps its position and facing, which must
    /// be valid in the new grid; beepers are reseeded from the new world.
    pub fn set_world(&mut self, world: World) -> Result<(), KarelError> {
        if world.is_blocked(self.position)? {
            return Err(KarelError::StartOnObstacle {
                position: self.position,
            });
        }
        self.beepers = world.seeded_beepers().clone();
        self.world = world;
        debug!(
            width = self.world.width(),
            height = self.world.height(),
            "world replaced"
        );
        self.snapshot();
        Ok(())
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn config(&self) -> &KarelConfig {
        &self.config
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Current step counter (snapshots rendered so far).
    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn history(&self) -> &History<R::Artifact> {
        &self.history
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Beepers in the bag; `None` when the bag is unlimited.
    #[must_use]
    pub const fn carried_beepers(&self) -> Option<u32> {
        match self.bag {
            BeeperBag::Unlimited => None,
            BeeperBag::Counted(count) => Some(count),
        }
    }

    /// Beeper counts on the grid. Cells without beepers have no entry.
    #[must_use]
    pub fn beepers(&self) -> &BTreeMap<Position, u32> {
        &self.beepers
    }

    #[must_use]
    pub fn beepers_at(&self, position: Position) -> u32 {
        self.beepers.get(&position).copied().unwrap_or(0)
    }

    // --- movement ---------------------------------------------------------

    #[must_use]
    pub const fn facing_offset(&self) -> (i32, i32) {
        self.direction.offset()
    }

    #[must_use]
    pub fn front_is_clear(&self) -> bool {
        self.is_clear_towards(self.direction)
    }

    #[must_use]
    pub fn front_is_blocked(&self) -> bool {
        !self.front_is_clear()
    }

    #[must_use]
    pub fn left_is_open(&self) -> bool {
        self.is_clear_towards(self.direction.left())
    }

    #[must_use]
    pub fn right_is_open(&self) -> bool {
        self.is_clear_towards(self.direction.right())
    }

    #[must_use]
    pub fn facing_east(&self) -> bool {
        self.direction == Direction::East
    }

    #[must_use]
    pub fn facing_north(&self) -> bool {
        self.direction == Direction::North
    }

    #[must_use]
    pub fn facing_west(&self) -> bool {
        self.direction == Direction::West
    }

    #[must_use]
    pub fn facing_south(&self) -> bool {
        self.direction == Direction::South
    }

    /// Steps one cell forward.
    ///
    /// Fails with [`KarelError::Collision`] when the front sensor reports a wall or
    /// the lower edge. Under [`EdgePolicy::TwoStage`] the sensor does not look past
    /// the upper edge, so that case surfaces here as [`KarelError::OutOfWorld`].
    pub fn move_forward(&mut self) -> Result<(), KarelError> {
        if !self.front_is_clear() {
            return Err(KarelError::Collision {
                position: self.position,
                direction: self.direction,
            });
        }
        let target = self
            .position
            .offset(self.facing_offset())
            .filter(|target| self.world.is_inside(*target))
            .ok_or(KarelError::OutOfWorld {
                position: self.position,
                direction: self.direction,
            })?;
        debug!(from = %self.position, to = %target, "move");
        self.position = target;
        self.snapshot();
        Ok(())
    }

    pub fn turn_left(&mut self) {
        self.direction = self.direction.left();
        debug!(facing = %self.direction, "turn left");
        self.snapshot();
    }

    /// Three left turns, one snapshot each.
    pub fn turn_right(&mut self) {
        for _ in 0..3 {
            self.turn_left();
        }
    }

    // --- beepers ----------------------------------------------------------

    #[must_use]
    pub fn has_beeper_here(&self) -> bool {
        self.count_beepers_here() > 0
    }

    #[must_use]
    pub fn count_beepers_here(&self) -> u32 {
        self.beepers_at(self.position)
    }

    /// Drops one beeper on the current cell.
    pub fn put_beeper(&mut self) -> Result<(), KarelError> {
        if self.carried_beepers() == Some(0) {
            return Err(KarelError::InsufficientBeepers);
        }
        let here = self
            .count_beepers_here()
            .checked_add(1)
            .ok_or(KarelError::BeeperOverflow {
                position: self.position,
            })?;
        if let BeeperBag::Counted(carried) = &mut self.bag {
            *carried -= 1;
        }
        self.beepers.insert(self.position, here);
        debug!(at = %self.position, here = self.count_beepers_here(), "put beeper");
        self.snapshot();
        Ok(())
    }

    /// Picks one beeper up from the current cell.
    pub fn pick_beeper(&mut self) -> Result<(), KarelError> {
        let Some(count) = self.beepers.get_mut(&self.position) else {
            return Err(KarelError::NoBeeperHere {
                position: self.position,
            });
        };
        *count -= 1;
        if *count == 0 {
            self.beepers.remove(&self.position);
        }
        if let BeeperBag::Counted(carried) = &mut self.bag {
            *carried = carried.saturating_add(1);
        }
        debug!(at = %self.position, here = self.count_beepers_here(), "pick beeper");
        self.snapshot();
        Ok(())
    }

    /// Adds `quantity` beepers at any in-bounds cell without touching the bag.
    /// Meant for scenario setup.
    pub fn place_beepers_at(&mut self, position: Position, quantity: u32) -> Result<(), KarelError> {
        if !self.world.is_inside(position) {
            return Err(self.world.out_of_bounds(position));
        }
        if quantity > 0 {
            let count = self.beepers.entry(position).or_default();
            *count = count.saturating_add(quantity);
        }
        debug!(at = %position, quantity, "place beepers");
        self.snapshot();
        Ok(())
    }

    // --- internals --------------------------------------------------------

    fn is_clear_towards(&self, direction: Direction) -> bool {
        let Some(candidate) = self.position.offset(direction.offset()) else {
            return false;
        };
        match self.world.is_blocked(candidate) {
            Ok(blocked) => !blocked,
            Err(_) => matches!(self.config.edge_policy, EdgePolicy::TwoStage),
        }
    }

    fn snapshot(&mut self) {
        self.step = self.step.next();
        let view = SnapshotView {
            world: &self.world,
            position: self.position,
            direction: self.direction,
            beepers: &self.beepers,
            step: self.step,
            carried: self.carried_beepers(),
        };
        let artifact = self.renderer.render(&view);
        self.history.push(Frame {
            step: self.step,
            artifact,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Preset;

    fn karel_on(preset: Preset) -> Karel {
        Karel::headless(KarelConfig::for_world(World::preset(preset))).expect("karel")
    }

    #[test]
    fn new_agent_has_no_history() {
        let karel = karel_on(Preset::Default);
        assert_eq!(karel.position(), Position::new(0, 0));
        assert_eq!(karel.direction(), Direction::East);
        assert_eq!(karel.step(), Step::zero());
        assert!(karel.history().is_empty());
    }

    #[test]
    fn turn_right_takes_three_snapshots() {
        let mut karel = karel_on(Preset::Default);
        karel.turn_right();
        assert_eq!(karel.direction(), Direction::South);
        assert_eq!(karel.step(), Step(3));
        assert_eq!(karel.history().len(), 3);
    }

    #[test]
    fn sensors_do_not_snapshot() {
        let karel = karel_on(Preset::Obstacles);
        assert!(karel.front_is_clear());
        assert!(karel.left_is_open());
        assert!(!karel.right_is_open());
        assert!(!karel.has_beeper_here());
        assert_eq!(karel.direction(), Direction::East);
        assert!(karel.history().is_empty());
    }

    #[test]
    fn two_stage_front_sensor_ignores_upper_edge() {
        let config = KarelConfig {
            world: crate::WorldSource::Custom(World::from_rows(&[[0u8]]).expect("world")),
            ..KarelConfig::default()
        };
        let mut karel = Karel::headless(config.clone()).expect("karel");
        assert!(karel.front_is_clear());
        assert!(karel.left_is_open());
        assert!(!karel.right_is_open());
        assert!(matches!(
            karel.move_forward(),
            Err(KarelError::OutOfWorld { .. })
        ));

        let mut strict = Karel::headless(KarelConfig {
            edge_policy: EdgePolicy::Strict,
            ..config
        })
        .expect("karel");
        assert!(strict.front_is_blocked());
        assert!(!strict.left_is_open());
        assert!(matches!(
            strict.move_forward(),
            Err(KarelError::Collision { .. })
        ));
    }

    #[test]
    fn counted_bag_tracks_carried_beepers() {
        let mut karel = Karel::headless(KarelConfig {
            bag: BeeperBag::Counted(1),
            ..KarelConfig::default()
        })
        .expect("karel");
        assert_eq!(karel.carried_beepers(), Some(1));
        karel.put_beeper().expect("first put");
        assert_eq!(karel.carried_beepers(), Some(0));
        assert_eq!(karel.put_beeper(), Err(KarelError::InsufficientBeepers));
        assert_eq!(karel.count_beepers_here(), 1);
        assert_eq!(karel.step(), Step(1));
        karel.pick_beeper().expect("pick");
        assert_eq!(karel.carried_beepers(), Some(1));
        assert!(karel.beepers().is_empty());
    }

    #[test]
    fn unlimited_bag_always_puts() {
        let mut karel = karel_on(Preset::Default);
        for _ in 0..10 {
            karel.put_beeper().expect("put");
        }
        assert_eq!(karel.count_beepers_here(), 10);
        assert_eq!(karel.carried_beepers(), None);
    }

    #[test]
    fn place_beepers_bypasses_bag_and_checks_bounds() {
        let mut karel = Karel::headless(KarelConfig {
            bag: BeeperBag::Counted(0),
            ..KarelConfig::default()
        })
        .expect("karel");
        karel
            .place_beepers_at(Position::new(3, 4), 2)
            .expect("place");
        assert_eq!(karel.beepers_at(Position::new(3, 4)), 2);
        assert_eq!(karel.carried_beepers(), Some(0));
        assert_eq!(karel.step(), Step(1));
        assert!(matches!(
            karel.place_beepers_at(Position::new(5, 0), 1),
            Err(KarelError::OutOfBounds { .. })
        ));
        assert_eq!(karel.step(), Step(1));
    }

    #[test]
    fn put_on_a_full_cell_changes_nothing() {
        let mut karel = Karel::headless(KarelConfig {
            bag: BeeperBag::Counted(1),
            ..KarelConfig::default()
        })
        .expect("karel");
        karel
            .place_beepers_at(Position::new(0, 0), u32::MAX)
            .expect("place");
        assert_eq!(
            karel.put_beeper(),
            Err(KarelError::BeeperOverflow {
                position: Position::new(0, 0)
            })
        );
        assert_eq!(karel.carried_beepers(), Some(1));
        assert_eq!(karel.count_beepers_here(), u32::MAX);
        assert_eq!(karel.step(), Step(1));
    }

    #[test]
    fn set_world_reseeds_beepers_and_snapshots() {
        let mut karel = karel_on(Preset::Default);
        karel.put_beeper().expect("put");
        karel
            .set_world(World::preset(Preset::Beepers))
            .expect("set world");
        assert_eq!(karel.beepers(), World::preset(Preset::Beepers).seeded_beepers());
        assert_eq!(karel.step(), Step(2));

        karel.move_forward().expect("move");
        karel.move_forward().expect("move");
        let err = karel.set_world(World::preset(Preset::Obstacles));
        assert_eq!(
            err,
            Err(KarelError::StartOnObstacle {
                position: Position::new(2, 0)
            })
        );
        assert_eq!(karel.world(), &World::preset(Preset::Beepers));
    }

    #[test]
    fn reset_is_all_or_nothing() {
        let mut karel = karel_on(Preset::Default);
        karel.move_forward().expect("move");
        karel.put_beeper().expect("put");

        let bad = KarelConfig {
            start: Position::new(2, 0),
            ..KarelConfig::for_preset("obstaculos")
        };
        assert!(karel.reset(bad).is_err());
        assert_eq!(karel.position(), Position::new(1, 0));
        assert_eq!(karel.history().len(), 2);

        karel
            .reset(KarelConfig::for_preset("cosos"))
            .expect("reset");
        assert_eq!(karel.position(), Position::new(0, 0));
        assert_eq!(karel.step(), Step::zero());
        assert!(karel.history().is_empty());
        assert_eq!(karel.beepers_at(Position::new(1, 0)), 1);
    }
}
