//! `hx request`: guest requests and the staff queue.
//!
//! Status changes go through [`TransitionPolicy`] before reaching the
//! lifecycle engine, which would otherwise accept any move. `--force` skips
//! the policy for back-office corrections.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use hotellyx_core::clock::Clock;
use hotellyx_core::error::{ErrorCode, StoreError};
use hotellyx_core::lifecycle::{DetailsUpdate, NewRequest};
use hotellyx_core::model::{Priority, Request, RequestStatus, TimelineEntry};
use hotellyx_core::policy::{Actor, TransitionPolicy};
use hotellyx_metrics::is_sla_risk_at;
use hotellyx_metrics::queue::{QueueFilter, StaffTab, TabCount, filter_queue, room_display, tab_counts};
use serde::Serialize;

use crate::cmd::{
    Session, check_room_link, fail, local_time, local_time_or_dash, parse_timestamp, persist,
};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_mode};

const POLICY: TransitionPolicy = TransitionPolicy;

#[derive(Args, Debug)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub command: RequestCommand,
}

#[derive(Subcommand, Debug)]
pub enum RequestCommand {
    /// Submit a request from a room link.
    Create {
        /// Room link token (or room number).
        room: String,

        /// Request type: towels, cleaning, water, issue, or free text.
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Guest note.
        #[arg(long)]
        note: Option<String>,

        /// When the guest wants it done (RFC 3339).
        #[arg(long, value_parser = parse_timestamp)]
        scheduled_for: Option<DateTime<Utc>>,

        /// low, normal, or high.
        #[arg(long)]
        priority: Option<Priority>,

        /// Room number to record when the link is not registered.
        #[arg(long)]
        room_number: Option<String>,
    },
    /// Show the staff queue, or one room's requests with `--link`.
    List {
        /// all, new, accepted, in_progress, done, or sla_risk.
        #[arg(long, default_value = "all")]
        tab: StaffTab,

        /// Case-insensitive match on room number or token.
        #[arg(long)]
        room: Option<String>,

        /// Show what the guest behind this room link sees.
        #[arg(long, conflicts_with_all = ["tab", "room"])]
        link: Option<String>,
    },
    /// Show one request with its timeline and available actions.
    Show { id: String },
    /// Move a request to a status.
    Status {
        id: String,

        /// Target status.
        status: RequestStatus,

        /// Check the move against what this actor is offered.
        #[arg(long = "as", default_value = "staff")]
        actor: Actor,

        /// Skip the transition policy.
        #[arg(long)]
        force: bool,
    },
    /// Move a request one step along new -> accepted -> in_progress -> done.
    Advance { id: String },
    /// Cancel a request on the guest's behalf.
    Cancel {
        id: String,

        /// Cancel even after staff accepted it.
        #[arg(long)]
        force: bool,
    },
    /// Set team, person, priority, or ETA. Pass an empty string to clear.
    Assign {
        id: String,

        #[arg(long)]
        team: Option<String>,

        #[arg(long)]
        person: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Minutes until done; zero or negative clears.
        #[arg(long, allow_negative_numbers = true)]
        eta: Option<f64>,
    },
    /// Set the internal staff note. An empty note clears it.
    Note { id: String, text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OfferedAction {
    label: &'static str,
    to: RequestStatus,
}

impl OfferedAction {
    fn for_actor(actor: Actor, status: RequestStatus) -> Option<Self> {
        Some(Self {
            label: POLICY.action_label(actor, status)?,
            to: POLICY.offered(actor, status)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestDetail {
    #[serde(flatten)]
    request: Request,
    type_label: String,
    status_label: &'static str,
    room_label: String,
    sla_risk: bool,
    timeline: Vec<TimelineEntry>,
    staff_action: Option<OfferedAction>,
    guest_action: Option<OfferedAction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueRow {
    #[serde(flatten)]
    request: Request,
    room_label: String,
    sla_risk: bool,
}

#[derive(Debug, Serialize)]
struct QueueView {
    tab: StaffTab,
    room_query: Option<String>,
    counts: Vec<TabCount>,
    requests: Vec<QueueRow>,
}

#[derive(Debug, Serialize)]
struct GuestView {
    room_token: String,
    room_number: Option<String>,
    new_count: usize,
    requests: Vec<Request>,
}

/// Execute `hx request <subcommand>`.
///
/// # Errors
///
/// Returns an error when the request is unknown, the room link is malformed,
/// the move is not offered, or the store cannot be written.
pub fn run_request(
    args: &RequestArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = Session::open(project_root, store_flag, output)?;
    let engine = session.requests();

    match &args.command {
        RequestCommand::Create {
            room,
            kind,
            note,
            scheduled_for,
            priority,
            room_number,
        } => {
            check_room_link(output, room)?;
            let kind = kind.trim();
            if kind.is_empty() {
                return fail(output, CliError::new("request type must not be blank"));
            }
            let input = NewRequest {
                note: note.clone(),
                scheduled_for: *scheduled_for,
                priority: *priority,
                room_number: room_number.clone(),
            };
            let request = persist(output, engine.create(room, kind, input))?;
            render(output, &request, |request, w| {
                writeln!(
                    w,
                    "✓ {} requested for room {} ({})",
                    request.type_label(),
                    request.room_label(),
                    request.id
                )
            })
        }
        RequestCommand::List { link: Some(link), .. } => {
            check_room_link(output, link)?;
            let room = session.rooms().find(link);
            let requests = engine.room_requests(link);
            let view = GuestView {
                room_token: room
                    .as_ref()
                    .map_or_else(|| hotellyx_core::token::normalize(link), |room| room.token.clone()),
                room_number: room.map(|room| room.room_number),
                new_count: engine.count_new_for_room(link),
                requests,
            };
            render(output, &view, |view, w| render_guest_view(view, w))
        }
        RequestCommand::List { tab, room, link: None } => {
            let now = session.clock.now();
            let threshold = session.config.sla.threshold_minutes;
            let all = engine.all();
            let rooms = session.rooms().list();
            let filter = QueueFilter {
                tab: *tab,
                room_query: room.clone().unwrap_or_default(),
            };

            let requests = filter_queue(&all, &rooms, &filter, now, threshold)
                .into_iter()
                .map(|request| QueueRow {
                    room_label: room_display(&request, &rooms),
                    sla_risk: is_sla_risk_at(&request, now, threshold),
                    request,
                })
                .collect();
            let view = QueueView {
                tab: *tab,
                room_query: room.clone(),
                counts: tab_counts(&all, now, threshold),
                requests,
            };
            render_mode(
                output,
                &view,
                |view, w| render_queue_text(view, w),
                |view, w| render_queue_pretty(view, now, w),
            )
        }
        RequestCommand::Show { id } => {
            let request = find(&session, output, id)?;
            let now = session.clock.now();
            let rooms = session.rooms().list();
            let detail = RequestDetail {
                type_label: request.type_label(),
                status_label: request.status.label(),
                room_label: room_display(&request, &rooms),
                sla_risk: is_sla_risk_at(&request, now, session.config.sla.threshold_minutes),
                timeline: request.timeline(),
                staff_action: OfferedAction::for_actor(Actor::Staff, request.status),
                guest_action: OfferedAction::for_actor(Actor::Guest, request.status),
                request,
            };
            render(output, &detail, |detail, w| render_detail(detail, w))
        }
        RequestCommand::Status {
            id,
            status,
            actor,
            force,
        } => move_to(&session, output, id, *actor, *status, *force),
        RequestCommand::Advance { id } => {
            let current = find(&session, output, id)?;
            if POLICY.offered(Actor::Staff, current.status).is_none() {
                return fail(
                    output,
                    CliError::coded(
                        ErrorCode::TransitionNotOffered,
                        format!("request '{id}' is already {}", current.status),
                    ),
                );
            }
            let request = updated(output, id, engine.advance(id))?;
            render_moved(output, &request)
        }
        RequestCommand::Cancel { id, force } => {
            move_to(&session, output, id, Actor::Guest, RequestStatus::Cancelled, *force)
        }
        RequestCommand::Assign {
            id,
            team,
            person,
            priority,
            eta,
        } => {
            find(&session, output, id)?;
            let update = DetailsUpdate {
                priority: *priority,
                staff_note: None,
                assigned_team: team.clone(),
                assigned_person: person.clone(),
                eta_minutes: *eta,
            };
            let request = updated(output, id, engine.set_details(id, update))?;
            render(output, &request, |request, w| {
                writeln!(
                    w,
                    "✓ Request {}: team {}, person {}, priority {}, ETA {}",
                    request.id,
                    request.assigned_team.as_deref().unwrap_or("-"),
                    request.assigned_person.as_deref().unwrap_or("-"),
                    request.priority,
                    request
                        .eta_minutes
                        .map_or_else(|| "-".to_string(), |eta| format!("{eta} min"))
                )
            })
        }
        RequestCommand::Note { id, text } => {
            find(&session, output, id)?;
            let request = updated(output, id, engine.set_staff_note(id, text))?;
            render(output, &request, |request, w| match &request.staff_note {
                Some(note) => writeln!(w, "✓ Staff note on {}: {note}", request.id),
                None => writeln!(w, "✓ Staff note on {} cleared", request.id),
            })
        }
    }
}

fn not_found<T>(output: OutputMode, id: &str) -> anyhow::Result<T> {
    fail(
        output,
        CliError::coded(ErrorCode::RequestNotFound, format!("request '{id}' not found")),
    )
}

fn find(session: &Session, output: OutputMode, id: &str) -> anyhow::Result<Request> {
    match session.requests().by_id(id) {
        Some(request) => Ok(request),
        None => not_found(output, id),
    }
}

/// Pick `id` out of the collection a mutator returned.
fn updated(
    output: OutputMode,
    id: &str,
    result: Result<Vec<Request>, StoreError>,
) -> anyhow::Result<Request> {
    let requests = persist(output, result)?;
    match requests.into_iter().find(|request| request.id == id) {
        Some(request) => Ok(request),
        None => not_found(output, id),
    }
}

fn move_to(
    session: &Session,
    output: OutputMode,
    id: &str,
    actor: Actor,
    to: RequestStatus,
    force: bool,
) -> anyhow::Result<()> {
    let current = find(session, output, id)?;
    if !force {
        if let Err(rejected) = POLICY.check(actor, current.status, to) {
            return fail(
                output,
                CliError::coded(ErrorCode::TransitionNotOffered, rejected.to_string()),
            );
        }
    }

    let request = updated(output, id, session.requests().set_status(id, to))?;
    render_moved(output, &request)
}

fn render_moved(output: OutputMode, request: &Request) -> anyhow::Result<()> {
    render(output, request, |request, w| {
        writeln!(w, "✓ Request {} is now {}", request.id, request.status.label())
    })
}

fn age_minutes(request: &Request, now: DateTime<Utc>) -> i64 {
    (now - request.created_at).num_minutes().max(0)
}

fn render_queue_text(view: &QueueView, w: &mut dyn Write) -> std::io::Result<()> {
    for row in &view.requests {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.request.id,
            row.room_label,
            row.request.kind,
            row.request.status,
            row.request.priority,
            if row.sla_risk { "sla_risk" } else { "-" }
        )?;
    }
    Ok(())
}

fn render_queue_pretty(view: &QueueView, now: DateTime<Utc>, w: &mut dyn Write) -> std::io::Result<()> {
    let tabs: Vec<String> = view
        .counts
        .iter()
        .map(|count| match count.tab {
            StaffTab::SlaRisk => count.label.clone(),
            _ => format!("{} ({})", count.label, count.count),
        })
        .collect();
    writeln!(w, "{}", tabs.join("  |  "))?;
    writeln!(w)?;

    let heading = view.room_query.as_deref().map_or_else(
        || format!("{} requests", view.tab.label()),
        |query| format!("{} requests matching '{query}'", view.tab.label()),
    );
    pretty_section(w, &heading)?;
    if view.requests.is_empty() {
        writeln!(w, "Nothing here.")?;
    }
    for row in &view.requests {
        let flag = if row.sla_risk { "  ! SLA" } else { "" };
        writeln!(
            w,
            "{:<8} {:<18} {:<12} {:>4}m  {}{flag}",
            row.room_label,
            row.request.type_label(),
            row.request.status.label(),
            age_minutes(&row.request, now),
            row.request.id
        )?;
    }
    Ok(())
}

fn render_guest_view(view: &GuestView, w: &mut dyn Write) -> std::io::Result<()> {
    let room = view.room_number.as_deref().unwrap_or(&view.room_token);
    pretty_section(
        w,
        &format!("Room {room}: {} request(s), {} new", view.requests.len(), view.new_count),
    )?;
    for request in &view.requests {
        let cancel = POLICY
            .action_label(Actor::Guest, request.status)
            .map_or(String::new(), |label| format!("  [{label}]"));
        writeln!(
            w,
            "{:<18} {:<12} {}{cancel}",
            request.type_label(),
            request.status.label(),
            local_time(request.created_at)
        )?;
    }
    Ok(())
}

fn render_detail(detail: &RequestDetail, w: &mut dyn Write) -> std::io::Result<()> {
    let request = &detail.request;
    pretty_section(w, &format!("Request {}", request.id))?;
    pretty_kv(w, "type", &detail.type_label)?;
    pretty_kv(w, "room", &detail.room_label)?;
    pretty_kv(w, "status", detail.status_label)?;
    pretty_kv(w, "priority", request.priority.as_str())?;
    if detail.sla_risk {
        pretty_kv(w, "sla", "at risk")?;
    }
    if let Some(note) = &request.note {
        pretty_kv(w, "guest note", note)?;
    }
    if let Some(at) = request.scheduled_for {
        pretty_kv(w, "scheduled", local_time(at))?;
    }
    if let Some(team) = &request.assigned_team {
        pretty_kv(w, "team", team)?;
    }
    if let Some(person) = &request.assigned_person {
        pretty_kv(w, "assigned to", person)?;
    }
    if let Some(eta) = request.eta_minutes {
        pretty_kv(w, "eta", format!("{eta} min"))?;
    }
    if let Some(note) = &request.staff_note {
        pretty_kv(w, "staff note", note)?;
    }

    writeln!(w)?;
    pretty_section(w, "Timeline")?;
    for entry in &detail.timeline {
        writeln!(w, "{:<12} {}", entry.label, local_time_or_dash(entry.at))?;
    }

    if let Some(action) = &detail.staff_action {
        writeln!(w)?;
        writeln!(w, "Next: {} (`hx request advance {}`)", action.label, request.id)?;
    }
    Ok(())
}
