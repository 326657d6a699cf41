//! Static grid geometry and the preset catalogue.

use crate::{KarelError, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Open,
    Wall,
}

impl Cell {
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }
}

/// Named layouts usable instead of a custom matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Default,
    Obstacles,
    Maze,
    Zigzag,
    Spiral,
    Checkerboard,
    Corridor,
    Beepers,
    LargeMaze,
}

impl Preset {
    pub const ALL: [Preset; 9] = [
        Preset::Default,
        Preset::Obstacles,
        Preset::Maze,
        Preset::Zigzag,
        Preset::Spiral,
        Preset::Checkerboard,
        Preset::Corridor,
        Preset::Beepers,
        Preset::LargeMaze,
    ];

    /// Canonical (English) name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Obstacles => "obstacles",
            Preset::Maze => "maze",
            Preset::Zigzag => "zigzag",
            Preset::Spiral => "spiral",
            Preset::Checkerboard => "checkerboard",
            Preset::Corridor => "corridor",
            Preset::Beepers => "beepers",
            Preset::LargeMaze => "large_maze",
        }
    }

    /// Spanish name used by the classroom material.
    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Preset::Default => "vacio",
            Preset::Obstacles => "obstaculos",
            Preset::Maze => "laberinto",
            Preset::Zigzag => "zigzag",
            Preset::Spiral => "espiral",
            Preset::Checkerboard => "tablero",
            Preset::Corridor => "pasillo",
            Preset::Beepers => "cosos",
            Preset::LargeMaze => "laberinto_grande",
        }
    }

    /// Looks a preset up by canonical name or alias, ignoring case and `-`/`_`.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted || preset.alias() == wanted)
    }

    /// Literal matrix, listed bottom row first (index = `y`). `1` marks a wall.
    fn rows(self) -> Vec<Vec<u8>> {
        let fixed: &[&[u8]] = match self {
            Preset::Default | Preset::Beepers => return vec![vec![0; 5]; 5],
            Preset::Obstacles => &[
                &[0, 0, 1, 0, 0],
                &[0, 1, 0, 1, 0],
                &[0, 0, 0, 0, 0],
            ],
            Preset::Maze => &[
                &[0, 1, 0, 0, 0],
                &[0, 1, 0, 1, 0],
                &[0, 1, 0, 1, 0],
                &[0, 0, 0, 1, 0],
                &[1, 1, 0, 0, 0],
            ],
            Preset::Zigzag => &[
                &[0, 0, 0, 0, 1],
                &[1, 1, 1, 0, 1],
                &[0, 0, 0, 0, 1],
                &[1, 1, 1, 0, 0],
                &[0, 0, 0, 0, 0],
            ],
            Preset::Spiral => &[
                &[0, 0, 0, 0, 0],
                &[0, 1, 1, 1, 0],
                &[0, 1, 0, 1, 0],
                &[0, 1, 0, 0, 0],
                &[0, 0, 0, 0, 0],
            ],
            Preset::Checkerboard => &[
                &[0, 0, 0, 0, 0, 0, 0],
                &[0, 1, 0, 1, 0, 1, 0],
                &[0, 0, 0, 0, 0, 0, 0],
                &[0, 1, 0, 1, 0, 1, 0],
                &[0, 0, 0, 0, 0, 0, 0],
                &[0, 1, 0, 1, 0, 1, 0],
                &[0, 0, 0, 0, 0, 0, 0],
            ],
            Preset::Corridor => &[
                &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
                &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0],
                &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            ],
            Preset::LargeMaze => &[
                &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0],
                &[1, 1, 0, 1, 0, 1, 1, 1, 1, 0],
                &[0, 0, 0, 1, 0, 0, 0, 0, 1, 0],
                &[0, 1, 1, 1, 1, 1, 1, 0, 1, 0],
                &[0, 0, 0, 0, 0, 0, 1, 0, 1, 0],
                &[1, 1, 1, 1, 1, 0, 1, 0, 1, 0],
                &[0, 0, 0, 0, 1, 0, 1, 0, 0, 0],
                &[0, 1, 1, 0, 1, 0, 1, 1, 1, 1],
                &[0, 1, 0, 0, 1, 0, 0, 0, 0, 0],
                &[0, 1, 0, 1, 1, 1, 1, 1, 1, 0],
            ],
        };
        fixed.iter().map(|row| row.to_vec()).collect()
    }

    fn seeds(self) -> &'static [(u32, u32, u32)] {
        match self {
            Preset::Beepers => &[(1, 0, 1), (3, 0, 2), (2, 2, 3), (4, 4, 1), (0, 3, 5)],
            _ => &[],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed grid of open and walled cells with optional initial beepers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorldRepr", into = "WorldRepr")]
pub struct World {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
    seeds: BTreeMap<Position, u32>,
}

impl World {
    /// Builds a world from rows of flags, bottom row first. Any non-zero flag is a wall.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, KarelError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        if height == 0 || width == 0 {
            return Err(KarelError::InvalidWorld(
                "world must have at least one row and one column",
            ));
        }
        if rows.iter().any(|row| row.as_ref().len() != width) {
            return Err(KarelError::InvalidWorld("all rows must have equal length"));
        }
        let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(KarelError::InvalidWorld("world dimensions overflow u32"));
        };
        let cells = rows
            .iter()
            .flat_map(|row| row.as_ref().iter())
            .map(|&flag| if flag == 0 { Cell::Open } else { Cell::Wall })
            .collect();
        Ok(Self {
            width,
            height,
            cells,
            seeds: BTreeMap::new(),
        })
    }

    /// Parses a text grid. The first line is the top row; `.` is open, `#` a wall,
    /// and `1`-`9` an open cell seeded with that many beepers.
    pub fn parse(text: &str) -> Result<Self, KarelError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let mut rows = Vec::with_capacity(lines.len());
        let mut seeds = Vec::new();
        for (row_from_top, line) in lines.iter().enumerate() {
            let y = (lines.len() - 1 - row_from_top) as u32;
            let mut row: Vec<u8> = Vec::with_capacity(line.len());
            for (x, ch) in line.chars().enumerate() {
                match ch {
                    '.' => row.push(0),
                    '#' => row.push(1),
                    '1'..='9' => {
                        row.push(0);
                        let count = ch.to_digit(10).unwrap_or_default();
                        seeds.push((Position::new(x as u32, y), count));
                    }
                    _ => return Err(KarelError::InvalidWorld("unexpected character in grid")),
                }
            }
            rows.push(row);
        }
        rows.reverse();
        Self::from_rows(rows.as_slice())?.with_beepers(seeds)
    }

    /// Builds a preset layout.
    #[must_use]
    pub fn preset(preset: Preset) -> Self {
        let world = Self::from_rows(preset.rows().as_slice()).and_then(|world| {
            world.with_beepers(
                preset
                    .seeds()
                    .iter()
                    .map(|&(x, y, count)| (Position::new(x, y), count)),
            )
        });
        match world {
            Ok(world) => world,
            Err(err) => unreachable!("preset {preset} is malformed: {err}"),
        }
    }

    /// Resolves a preset name; unknown names fall back to [`Preset::Default`].
    #[must_use]
    pub fn from_preset_name(name: &str) -> Self {
        let preset = Preset::lookup(name).unwrap_or_else(|| {
            tracing::warn!(name, "unknown world preset; using the default grid");
            Preset::Default
        });
        Self::preset(preset)
    }

    /// Adds initial beepers. Seeds must sit on open cells inside the grid.
    pub fn with_beepers(
        mut self,
        seeds: impl IntoIterator<Item = (Position, u32)>,
    ) -> Result<Self, KarelError> {
        for (position, count) in seeds {
            match self.cell(position) {
                None => return Err(KarelError::InvalidWorld("beeper seed outside the grid")),
                Some(Cell::Wall) => {
                    return Err(KarelError::InvalidWorld("beeper seed on a wall"));
                }
                Some(Cell::Open) => {}
            }
            if count > 0 {
                let seeded = self.seeds.entry(position).or_default();
                *seeded = seeded
                    .checked_add(count)
                    .ok_or(KarelError::InvalidWorld("beeper seed count overflows"))?;
            }
        }
        Ok(self)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// True iff the position lies in `[0, width) x [0, height)`.
    #[must_use]
    pub const fn is_inside(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Returns the cell at `position`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<Cell> {
        self.is_inside(position)
            .then(|| self.cells[self.offset(position)])
    }

    /// Wall flag of an in-bounds cell. Positions outside the grid are an error,
    /// not implicitly blocked.
    pub fn is_blocked(&self, position: Position) -> Result<bool, KarelError> {
        self.cell(position)
            .map(Cell::is_wall)
            .ok_or_else(|| self.out_of_bounds(position))
    }

    /// Beepers placed in the world before the agent starts.
    #[must_use]
    pub fn seeded_beepers(&self) -> &BTreeMap<Position, u32> {
        &self.seeds
    }

    /// Rows of wall flags, bottom row first.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|cell| u8::from(cell.is_wall())).collect())
            .collect()
    }

    pub(crate) fn out_of_bounds(&self, position: Position) -> KarelError {
        KarelError::OutOfBounds {
            position,
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    fn offset(&self, position: Position) -> usize {
        (position.y as usize) * (self.width as usize) + (position.x as usize)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::preset(Preset::Default)
    }
}

#[derive(Serialize, Deserialize)]
struct WorldRepr {
    rows: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    beepers: Vec<BeeperSeed>,
}

#[derive(Serialize, Deserialize)]
struct BeeperSeed {
    x: u32,
    y: u32,
    count: u32,
}

impl TryFrom<WorldRepr> for World {
    type Error = KarelError;

    fn try_from(repr: WorldRepr) -> Result<Self, Self::Error> {
        World::from_rows(repr.rows.as_slice())?.with_beepers(
            repr.beepers
                .into_iter()
                .map(|seed| (Position::new(seed.x, seed.y), seed.count)),
        )
    }
}

impl From<World> for WorldRepr {
    fn from(world: World) -> Self {
        WorldRepr {
            rows: world.rows(),
            beepers: world
                .seeds
                .iter()
                .map(|(position, &count)| BeeperSeed {
                    x: position.x,
                    y: position.y,
                    count,
                })
                .collect(),
        }
    }
}
