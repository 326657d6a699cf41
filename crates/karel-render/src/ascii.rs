use karel_core::{Direction, Position, SnapshotRenderer, SnapshotView, World};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Glyph drawn in the agent's cell.
#[must_use]
pub const fn agent_glyph(direction: Direction) -> char {
    match direction {
        Direction::East => '>',
        Direction::North => '^',
        Direction::West => '<',
        Direction::South => 'v',
    }
}

fn beeper_glyph(count: u32) -> char {
    match count {
        0 => '.',
        1..=9 => char::from_digit(count, 10).unwrap_or('*'),
        _ => '*',
    }
}

fn grid(
    out: &mut String,
    world: &World,
    beepers: &BTreeMap<Position, u32>,
    agent: Option<(Position, Direction)>,
) {
    for y in (0..world.height()).rev() {
        for x in 0..world.width() {
            let position = Position::new(x, y);
            let glyph = match agent {
                Some((at, facing)) if at == position => agent_glyph(facing),
                _ if world.is_blocked(position).unwrap_or(true) => '#',
                _ => beeper_glyph(beepers.get(&position).copied().unwrap_or(0)),
            };
            if x > 0 {
                out.push(' ');
            }
            out.push(glyph);
        }
        out.push('\n');
    }
}

/// Draws a world without an agent, top row first. Seeded beepers are shown.
#[must_use]
pub fn render_world(world: &World) -> String {
    let mut out = String::new();
    grid(&mut out, world, world.seeded_beepers(), None);
    out
}

/// Renders each snapshot as a text frame followed by a status line.
///
/// Walls are `#`, empty cells `.`, beeper piles a digit (`*` above nine) and
/// the agent one of `>^<v`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiRenderer;

impl SnapshotRenderer for AsciiRenderer {
    type Artifact = String;

    fn render(&mut self, view: &SnapshotView<'_>) -> String {
        let mut out = String::with_capacity(
            (view.world.width() as usize * 2 + 1) * view.world.height() as usize + 64,
        );
        grid(
            &mut out,
            view.world,
            view.beepers,
            Some((view.position, view.direction)),
        );
        let _ = write!(
            out,
            "step {} | {} facing {}",
            view.step.0, view.position, view.direction
        );
        let here = view.beepers.get(&view.position).copied().unwrap_or(0);
        if here > 0 {
            let _ = write!(out, " | beepers here: {here}");
        }
        if let Some(carried) = view.carried {
            let _ = write!(out, " | bag: {carried}");
        }
        out
    }
}
