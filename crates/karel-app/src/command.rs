//! Command vocabulary shared by scripts and the help table.

use karel_core::{Karel, KarelError, Position, SnapshotRenderer};
use serde::Serialize;
use std::fmt;

/// One instruction a script can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move,
    TurnLeft,
    TurnRight,
    PutBeeper,
    PickBeeper,
    PlaceBeepers { position: Position, quantity: u32 },
    Query(Query),
}

/// Read-only sensors. Queries never produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    FrontIsClear,
    FrontIsBlocked,
    LeftIsOpen,
    RightIsOpen,
    HasBeeper,
    CountBeepers,
}

/// Result of a query, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Count(u32),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Flag(flag) => write!(f, "{flag}"),
            Answer::Count(count) => write!(f, "{count}"),
        }
    }
}

/// Help table entry.
#[derive(Debug, Clone, Copy)]
pub struct CommandHelp {
    pub name: &'static str,
    pub alias: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub is_query: bool,
}

/// Every command name the interpreter understands.
pub const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "move",
        alias: "avanzar",
        usage: "move [times]",
        description: "Moves Karel one cell forward",
        is_query: false,
    },
    CommandHelp {
        name: "turn_left",
        alias: "girar_izquierda",
        usage: "turn_left [times]",
        description: "Turns Karel 90 degrees to the left",
        is_query: false,
    },
    CommandHelp {
        name: "turn_right",
        alias: "girar_derecha",
        usage: "turn_right [times]",
        description: "Turns Karel 90 degrees to the right",
        is_query: false,
    },
    CommandHelp {
        name: "put_beeper",
        alias: "poner_coso",
        usage: "put_beeper [times]",
        description: "Drops a beeper on the current cell",
        is_query: false,
    },
    CommandHelp {
        name: "pick_beeper",
        alias: "juntar_coso",
        usage: "pick_beeper [times]",
        description: "Picks a beeper up from the current cell",
        is_query: false,
    },
    CommandHelp {
        name: "place_beepers",
        alias: "colocar_cosos",
        usage: "place_beepers <x> <y> [quantity]",
        description: "Adds beepers to any cell without using the bag (scenario setup)",
        is_query: false,
    },
    CommandHelp {
        name: "front_is_clear",
        alias: "frente_abierto",
        usage: "front_is_clear",
        description: "Checks whether Karel can move forward",
        is_query: true,
    },
    CommandHelp {
        name: "front_is_blocked",
        alias: "frente_bloqueado",
        usage: "front_is_blocked",
        description: "Checks whether Karel cannot move forward",
        is_query: true,
    },
    CommandHelp {
        name: "left_is_open",
        alias: "izquierda_abierta",
        usage: "left_is_open",
        description: "Checks whether the cell to the left is free",
        is_query: true,
    },
    CommandHelp {
        name: "right_is_open",
        alias: "derecha_abierta",
        usage: "right_is_open",
        description: "Checks whether the cell to the right is free",
        is_query: true,
    },
    CommandHelp {
        name: "has_beeper",
        alias: "hay_coso",
        usage: "has_beeper",
        description: "Checks whether there is a beeper on the current cell",
        is_query: true,
    },
    CommandHelp {
        name: "count_beepers",
        alias: "contar_cosos",
        usage: "count_beepers",
        description: "Counts the beepers on the current cell",
        is_query: true,
    },
];

/// Finds the help entry for a name or alias.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static CommandHelp> {
    let name = name.trim();
    COMMANDS
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name) || entry.alias.eq_ignore_ascii_case(name))
}

/// Formats the help table as plain text.
#[must_use]
pub fn help_text() -> String {
    let width = COMMANDS.iter().map(|entry| entry.usage.len()).max().unwrap_or(0);
    let mut out = String::from("Karel commands:\n");
    for entry in COMMANDS.iter().filter(|entry| !entry.is_query) {
        out.push_str(&format!(
            "  {:<width$}  {} (alias: {})\n",
            entry.usage, entry.description, entry.alias
        ));
    }
    out.push_str("\nConditions:\n");
    for entry in COMMANDS.iter().filter(|entry| entry.is_query) {
        out.push_str(&format!(
            "  {:<width$}  {} (alias: {})\n",
            entry.usage, entry.description, entry.alias
        ));
    }
    out
}

impl Command {
    /// Builds a command from its canonical name and already-split arguments.
    pub(crate) fn from_parts(name: &'static str, args: &[u32]) -> Result<Self, &'static str> {
        let no_args = |command| {
            if args.is_empty() {
                Ok(command)
            } else {
                Err("this command takes no arguments")
            }
        };
        match name {
            "move" => no_args(Command::Move),
            "turn_left" => no_args(Command::TurnLeft),
            "turn_right" => no_args(Command::TurnRight),
            "put_beeper" => no_args(Command::PutBeeper),
            "pick_beeper" => no_args(Command::PickBeeper),
            "place_beepers" => match *args {
                [x, y] => Ok(Command::PlaceBeepers {
                    position: Position::new(x, y),
                    quantity: 1,
                }),
                [x, y, quantity] => Ok(Command::PlaceBeepers {
                    position: Position::new(x, y),
                    quantity,
                }),
                _ => Err("place_beepers expects <x> <y> [quantity]"),
            },
            "front_is_clear" => no_args(Command::Query(Query::FrontIsClear)),
            "front_is_blocked" => no_args(Command::Query(Query::FrontIsBlocked)),
            "left_is_open" => no_args(Command::Query(Query::LeftIsOpen)),
            "right_is_open" => no_args(Command::Query(Query::RightIsOpen)),
            "has_beeper" => no_args(Command::Query(Query::HasBeeper)),
            "count_beepers" => no_args(Command::Query(Query::CountBeepers)),
            _ => Err("unknown command"),
        }
    }

    /// Runs the command against the agent. Queries return their answer.
    pub fn apply<R: SnapshotRenderer>(
        self,
        karel: &mut Karel<R>,
    ) -> Result<Option<Answer>, KarelError> {
        match self {
            Command::Move => karel.move_forward()?,
            Command::TurnLeft => karel.turn_left(),
            Command::TurnRight => karel.turn_right(),
            Command::PutBeeper => karel.put_beeper()?,
            Command::PickBeeper => karel.pick_beeper()?,
            Command::PlaceBeepers { position, quantity } => {
                karel.place_beepers_at(position, quantity)?
            }
            Command::Query(query) => return Ok(Some(query.ask(karel))),
        }
        Ok(None)
    }
}

impl Query {
    #[must_use]
    pub fn ask<R: SnapshotRenderer>(self, karel: &Karel<R>) -> Answer {
        match self {
            Query::FrontIsClear => Answer::Flag(karel.front_is_clear()),
            Query::FrontIsBlocked => Answer::Flag(karel.front_is_blocked()),
            Query::LeftIsOpen => Answer::Flag(karel.left_is_open()),
            Query::RightIsOpen => Answer::Flag(karel.right_is_open()),
            Query::HasBeeper => Answer::Flag(karel.has_beeper_here()),
            Query::CountBeepers => Answer::Count(karel.count_beepers_here()),
        }
    }
}
