//! Core types for the Karel grid-world simulator.
//!
//! A [`World`] is a fixed grid of open and walled cells. A [`Karel`] agent
//! walks that grid, turns, and moves beepers around; every state-changing
//! action asks a [`SnapshotRenderer`] for an artifact and records it in a
//! bounded [`History`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod karel;
mod world;

pub use karel::Karel;
pub use world::{Cell, Preset, World};

/// History cap used when the configuration does not override it.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Grid coordinate. `x` is the column, `y` the row; row 0 is the bottom row.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    /// Construct a new position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Applies a signed delta, returning `None` when either coordinate would go negative.
    #[must_use]
    pub fn offset(self, (dx, dy): (i32, i32)) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing of the agent, cyclically ordered counter-clockwise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    East,
    North,
    West,
    South,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    /// Numeric value: East=0, North=1, West=2, South=3.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Direction::East => 0,
            Direction::North => 1,
            Direction::West => 2,
            Direction::South => 3,
        }
    }

    /// Maps any integer onto a direction, reducing it mod 4.
    #[must_use]
    pub const fn from_index(index: i64) -> Self {
        Self::ALL[index.rem_euclid(4) as usize]
    }

    /// Quarter turn counter-clockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        Self::from_index(self.index() as i64 + 1)
    }

    /// Quarter turn clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        Self::from_index(self.index() as i64 - 1)
    }

    /// Grid delta of one forward step. Growing `y` is "up" (North).
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::North => (0, 1),
            Direction::West => (-1, 0),
            Direction::South => (0, -1),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::East => "east",
            Direction::North => "north",
            Direction::West => "west",
            Direction::South => "south",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = KarelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "east" | "este" | "e" | "0" => Ok(Direction::East),
            "north" | "norte" | "n" | "1" => Ok(Direction::North),
            "west" | "oeste" | "w" | "o" | "2" => Ok(Direction::West),
            "south" | "sur" | "s" | "3" => Ok(Direction::South),
            _ => Err(KarelError::InvalidConfig("unknown direction")),
        }
    }
}

/// Number of snapshots rendered since the agent was (re)initialised.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Step(pub u64);

impl Step {
    /// Returns the next sequential step.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Errors raised by world construction and agent operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KarelError {
    #[error("position {position} is outside the {width}x{height} world")]
    OutOfBounds {
        position: Position,
        width: u32,
        height: u32,
    },
    #[error("cannot start on the wall at {position}")]
    StartOnObstacle { position: Position },
    #[error("blocked ahead: cannot move {direction} from {position}")]
    Collision {
        position: Position,
        direction: Direction,
    },
    #[error("moving {direction} from {position} would leave the world")]
    OutOfWorld {
        position: Position,
        direction: Direction,
    },
    #[error("no beepers left in the bag")]
    InsufficientBeepers,
    #[error("no beeper to pick up at {position}")]
    NoBeeperHere { position: Position },
    #[error("beeper count at {position} would overflow")]
    BeeperOverflow { position: Position },
    /// Malformed world matrix or beeper seeding.
    #[error("invalid world: {0}")]
    InvalidWorld(&'static str),
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Beeper supply available to the agent. Selects the ruleset variant for `put_beeper`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BeeperBag {
    /// `put_beeper` always succeeds and picked beepers are not tracked.
    #[default]
    Unlimited,
    /// The agent carries a finite count; `put_beeper` fails when it is empty.
    Counted(u32),
}

/// How the front sensor treats the far edges of the world.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// `front_is_clear` checks the lower bound and walls only; `move` rejects
    /// the upper bound separately with [`KarelError::OutOfWorld`].
    #[default]
    TwoStage,
    /// `front_is_clear` reports every edge, so `move` only ever fails with
    /// [`KarelError::Collision`].
    Strict,
}

/// Where the agent's world comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorldSource {
    /// Named preset; unknown names resolve to the default grid.
    Preset(String),
    Custom(World),
}

impl Default for WorldSource {
    fn default() -> Self {
        WorldSource::Preset(Preset::Default.name().to_string())
    }
}

impl WorldSource {
    /// Materialises the world.
    #[must_use]
    pub fn build(&self) -> World {
        match self {
            WorldSource::Preset(name) => World::from_preset_name(name),
            WorldSource::Custom(world) => world.clone(),
        }
    }
}

/// Static configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KarelConfig {
    pub world: WorldSource,
    /// Initial position of the agent.
    pub start: Position,
    /// Initial facing of the agent.
    pub facing: Direction,
    pub bag: BeeperBag,
    pub edge_policy: EdgePolicy,
    /// Maximum number of frames retained; `None` keeps everything.
    pub history_capacity: Option<usize>,
}

impl Default for KarelConfig {
    fn default() -> Self {
        Self {
            world: WorldSource::default(),
            start: Position::new(0, 0),
            facing: Direction::East,
            bag: BeeperBag::Unlimited,
            edge_policy: EdgePolicy::TwoStage,
            history_capacity: Some(DEFAULT_HISTORY_CAPACITY),
        }
    }
}

impl KarelConfig {
    /// Configuration for a named preset with every other field defaulted.
    #[must_use]
    pub fn for_preset(name: impl Into<String>) -> Self {
        Self {
            world: WorldSource::Preset(name.into()),
            ..Self::default()
        }
    }

    /// Configuration for an explicit world with every other field defaulted.
    #[must_use]
    pub fn for_world(world: World) -> Self {
        Self {
            world: WorldSource::Custom(world),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), KarelError> {
        if self.history_capacity == Some(0) {
            return Err(KarelError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Read-only view of the state handed to a renderer after each action.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotView<'a> {
    pub world: &'a World,
    pub position: Position,
    pub direction: Direction,
    pub beepers: &'a BTreeMap<Position, u32>,
    pub step: Step,
    /// Beepers in the bag, `None` when the bag is unlimited.
    pub carried: Option<u32>,
}

/// Turns agent state into an artifact. Must not fail for any valid state.
pub trait SnapshotRenderer {
    type Artifact;

    fn render(&mut self, view: &SnapshotView<'_>) -> Self::Artifact;
}

impl<F, A> SnapshotRenderer for F
where
    F: FnMut(&SnapshotView<'_>) -> A,
{
    type Artifact = A;

    fn render(&mut self, view: &SnapshotView<'_>) -> A {
        self(view)
    }
}

/// Renderer that records nothing beyond the step number.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl SnapshotRenderer for NullRenderer {
    type Artifact = ();

    fn render(&mut self, _view: &SnapshotView<'_>) {}
}

/// One rendered snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<A> {
    pub step: Step,
    pub artifact: A,
}

/// Append-only frame log with optional FIFO cap.
#[derive(Debug, Clone)]
pub struct History<A> {
    capacity: Option<usize>,
    frames: VecDeque<Frame<A>>,
    evicted: u64,
}

impl<A> History<A> {
    /// Creates an empty history. `capacity` of `None` never evicts.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity.unwrap_or(0).min(1024)),
            evicted: 0,
        }
    }

    pub(crate) fn push(&mut self, frame: Frame<A>) {
        if let Some(capacity) = self.capacity {
            while self.frames.len() >= capacity && self.frames.pop_front().is_some() {
                self.evicted += 1;
                tracing::trace!(capacity, evicted = self.evicted, "evicted oldest frame");
            }
        }
        self.frames.push_back(frame);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of frames dropped by the cap so far.
    #[must_use]
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Frame<A>> {
        self.frames.get(index)
    }

    /// Most recent frame, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Frame<A>> {
        self.frames.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Frame<A>> + ExactSizeIterator + '_ {
        self.frames.iter()
    }
}

impl<'a, A> IntoIterator for &'a History<A> {
    type Item = &'a Frame<A>;
    type IntoIter = std::collections::vec_deque::Iter<'a, Frame<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
