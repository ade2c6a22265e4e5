//! `hx room`: register rooms, rotate guest links, and set room status.

use std::io::Write;
use std::path::Path;

use clap::{Args, Subcommand};
use hotellyx_core::error::ErrorCode;
use hotellyx_core::model::{Room, RoomStatus};
use serde::Serialize;

use crate::cmd::{Session, check_room_link, fail, local_time, persist};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct RoomArgs {
    #[command(subcommand)]
    pub command: RoomCommand,
}

#[derive(Subcommand, Debug)]
pub enum RoomCommand {
    /// Register a room and issue its guest link token.
    Add {
        /// Room number as printed on the door.
        number: String,
    },
    /// List registered rooms.
    List {
        /// List every room token seen on rooms or requests instead.
        #[arg(long)]
        tokens: bool,
    },
    /// Issue a new token for a room, retiring the old link.
    Regen {
        /// Current token or room number.
        room: String,
    },
    /// Show or set a room's guest-set status.
    Status {
        /// Token or room number.
        room: String,

        /// New status: normal, dnd, please_clean, maintenance_needed.
        #[arg(long)]
        set: Option<RoomStatus>,
    },
}

#[derive(Debug, Serialize)]
struct RoomStatusView {
    room_number: String,
    token: String,
    room_status: RoomStatus,
    label: &'static str,
}

impl RoomStatusView {
    fn of(room: &Room) -> Self {
        Self {
            room_number: room.room_number.clone(),
            token: room.token.clone(),
            room_status: room.room_status,
            label: room.room_status.label(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenList {
    tokens: Vec<String>,
}

/// Execute `hx room <subcommand>`.
///
/// # Errors
///
/// Returns an error when the room is unknown, the link is malformed, or the
/// store cannot be written.
pub fn run_room(
    args: &RoomArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = Session::open(project_root, store_flag, output)?;

    match &args.command {
        RoomCommand::Add { number } => {
            let Some(room) = persist(output, session.rooms().add(number))? else {
                return fail(
                    output,
                    CliError {
                        suggestion: Some("pass the number printed on the door: `hx room add 305`".into()),
                        ..CliError::new("room number must not be blank")
                    },
                );
            };
            render(output, &room, |room, w| {
                writeln!(w, "✓ Room {} registered", room.room_number)?;
                writeln!(w, "  guest link token: {}", room.token)
            })
        }
        RoomCommand::List { tokens: true } => {
            let tokens = TokenList {
                tokens: session.requests().all_room_tokens(),
            };
            render(output, &tokens, |list, w| {
                for token in &list.tokens {
                    writeln!(w, "{token}")?;
                }
                Ok(())
            })
        }
        RoomCommand::List { tokens: false } => {
            let rooms = session.rooms().list();
            render_mode(
                output,
                &rooms,
                |rooms, w| render_rooms_text(rooms, w),
                |rooms, w| render_rooms_pretty(rooms, w),
            )
        }
        RoomCommand::Regen { room } => {
            check_room_link(output, room)?;
            match persist(output, session.rooms().regenerate_token(room))? {
                Some(updated) => render(output, &updated, |room, w| {
                    writeln!(w, "✓ Room {} has a new link", room.room_number)?;
                    writeln!(w, "  guest link token: {}", room.token)
                }),
                None => room_not_found(output, room),
            }
        }
        RoomCommand::Status { room, set } => {
            check_room_link(output, room)?;
            let engine = session.rooms();
            if let Some(status) = set {
                persist(output, engine.set_status(room, *status))?;
            }
            match engine.find(room) {
                Some(found) => render(output, &RoomStatusView::of(&found), |view, w| {
                    writeln!(w, "Room {}: {}", view.room_number, view.label)
                }),
                None => room_not_found(output, room),
            }
        }
    }
}

fn room_not_found(output: OutputMode, room: &str) -> anyhow::Result<()> {
    fail(
        output,
        CliError::coded(ErrorCode::RoomNotFound, format!("room '{room}' not found")),
    )
}

fn render_rooms_text(rooms: &[Room], w: &mut dyn Write) -> std::io::Result<()> {
    for room in rooms {
        writeln!(
            w,
            "{}\t{}\t{}",
            room.room_number,
            room.token,
            room.room_status.as_str()
        )?;
    }
    Ok(())
}

fn render_rooms_pretty(rooms: &[Room], w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Rooms ({})", rooms.len()))?;
    if rooms.is_empty() {
        writeln!(w, "No rooms registered. Add one with `hx room add <number>`.")?;
    }
    for room in rooms {
        pretty_kv(
            w,
            &room.room_number,
            format!(
                "{}  {}  (since {})",
                room.token,
                room.room_status.label(),
                local_time(room.created_at)
            ),
        )?;
    }
    Ok(())
}
