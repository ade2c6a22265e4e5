//! `hx service`: browse, book, and administer the service catalog.

use std::io::Write;
use std::path::Path;

use clap::{Args, Subcommand};
use hotellyx_core::catalog::ServiceDraft;
use hotellyx_core::error::ErrorCode;
use hotellyx_core::model::{Service, ServiceCategory, UpsellRules};
use serde::Serialize;

use crate::cmd::{Session, check_room_link, fail, persist};
use crate::output::{CliError, OutputMode, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

/// Admin-editable fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct DraftArgs {
    #[arg(long)]
    pub name: Option<String>,

    /// Housekeeping, food, wellness, transport, conference, or other.
    #[arg(long)]
    pub category: Option<ServiceCategory>,

    /// Display price, e.g. "from €40".
    #[arg(long)]
    pub price: Option<String>,

    /// Comma-separated bookable slots (RFC 3339).
    #[arg(long)]
    pub slots: Option<String>,

    /// Offer before arrival.
    #[arg(long)]
    pub pre_arrival: bool,

    /// Offer when late checkout was not bought.
    #[arg(long)]
    pub late_checkout: bool,
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    /// List services guests can see, or all with `--all`.
    List {
        #[arg(long)]
        all: bool,
    },
    /// Show one service.
    Show {
        id: String,

        /// Count this as a guest view; hidden services are not found.
        #[arg(long)]
        guest: bool,
    },
    /// Book a service for a room.
    Book {
        id: String,

        /// Room link token (or room number).
        #[arg(long)]
        room: String,

        /// One of the service's availability slots.
        #[arg(long)]
        slot: Option<String>,

        #[arg(long)]
        note: Option<String>,
    },
    /// Add a service to the catalog.
    Add(DraftArgs),
    /// Change a service; omitted fields keep their value.
    Edit {
        id: String,

        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Show or hide a service for guests.
    Toggle { id: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceRow {
    #[serde(flatten)]
    service: Service,
    views: u64,
}

/// Execute `hx service <subcommand>`.
///
/// # Errors
///
/// Returns an error when the service or room is unknown, a booking slot is
/// missing or not offered, a draft is incomplete, or the store cannot be
/// written.
pub fn run_service(
    args: &ServiceArgs,
    store_flag: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let session = Session::open(project_root, store_flag, output)?;
    let catalog = session.catalog();

    match &args.command {
        ServiceCommand::List { all } => {
            let services = if *all {
                catalog.list()
            } else {
                catalog.guest_services()
            };
            let views = catalog.views();
            let rows: Vec<ServiceRow> = services
                .into_iter()
                .map(|service| ServiceRow {
                    views: views.get(&service.id).copied().unwrap_or(0),
                    service,
                })
                .collect();
            render_mode(
                output,
                &rows,
                |rows, w| render_list_text(rows, w),
                |rows, w| render_list_pretty(rows, w),
            )
        }
        ServiceCommand::Show { id, guest } => {
            let Some(service) = catalog.by_id(id, !guest) else {
                return service_not_found(output, id);
            };
            let views = if *guest {
                persist(output, catalog.increment_view(id))?
            } else {
                catalog.views()
            };
            let row = ServiceRow {
                views: views.get(id).copied().unwrap_or(0),
                service,
            };
            render(output, &row, |row, w| render_detail(row, w))
        }
        ServiceCommand::Book {
            id,
            room,
            slot,
            note,
        } => {
            check_room_link(output, room)?;
            let requests = session.requests();
            match catalog.book(&requests, room, id, slot.as_deref(), note.clone()) {
                Ok(request) => render(output, &request, |request, w| {
                    writeln!(
                        w,
                        "✓ {} booked for room {} ({})",
                        request.kind,
                        request.room_label(),
                        request.id
                    )
                }),
                Err(err) => fail(output, CliError::from(&err)),
            }
        }
        ServiceCommand::Add(draft) => {
            let Some(category) = draft.category else {
                return fail(output, CliError::new("--category is required"));
            };
            let new = ServiceDraft {
                name: draft.name.clone().unwrap_or_default(),
                category,
                price_text: draft.price.clone().unwrap_or_default(),
                availability: ServiceDraft::parse_availability(
                    draft.slots.as_deref().unwrap_or_default(),
                ),
                upsell_rules: UpsellRules {
                    show_pre_arrival: draft.pre_arrival,
                    show_when_late_checkout_not_bought: draft.late_checkout,
                },
            };
            match persist(output, catalog.create(&new))? {
                Some(service) => render_saved(output, &service, "added"),
                None => incomplete_draft(output),
            }
        }
        ServiceCommand::Edit { id, draft } => {
            let Some(current) = catalog.by_id(id, true) else {
                return service_not_found(output, id);
            };
            let merged = merge_draft(&current, draft);
            match persist(output, catalog.update(id, &merged))? {
                Some(service) => render_saved(output, &service, "updated"),
                None => incomplete_draft(output),
            }
        }
        ServiceCommand::Toggle { id } => match persist(output, catalog.toggle_active(id))? {
            Some(service) => {
                let verb = if service.active { "shown to guests" } else { "hidden" };
                render_saved(output, &service, verb)
            }
            None => service_not_found(output, id),
        },
    }
}

/// Start from the stored service and apply only the flags that were passed.
fn merge_draft(current: &Service, args: &DraftArgs) -> ServiceDraft {
    let rules = current.upsell_rules.unwrap_or_default();
    ServiceDraft {
        name: args.name.clone().unwrap_or_else(|| current.name.clone()),
        category: args.category.unwrap_or(current.category),
        price_text: args.price.clone().unwrap_or_else(|| current.price_text.clone()),
        availability: args.slots.as_deref().map_or_else(
            || current.availability.clone().unwrap_or_default(),
            ServiceDraft::parse_availability,
        ),
        upsell_rules: UpsellRules {
            show_pre_arrival: args.pre_arrival || rules.show_pre_arrival,
            show_when_late_checkout_not_bought: args.late_checkout
                || rules.show_when_late_checkout_not_bought,
        },
    }
}

fn service_not_found(output: OutputMode, id: &str) -> anyhow::Result<()> {
    fail(
        output,
        CliError::coded(ErrorCode::ServiceNotFound, format!("service '{id}' not found")),
    )
}

fn incomplete_draft(output: OutputMode) -> anyhow::Result<()> {
    fail(
        output,
        CliError {
            suggestion: Some("pass both --name and --price".into()),
            ..CliError::new("service name and price are required")
        },
    )
}

fn render_saved(output: OutputMode, service: &Service, verb: &str) -> anyhow::Result<()> {
    render(output, service, |service, w| {
        writeln!(w, "✓ {} ({}) {verb}", service.name, service.id)
    })
}

fn render_list_text(rows: &[ServiceRow], w: &mut dyn Write) -> std::io::Result<()> {
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.service.id,
            row.service.name,
            row.service.category,
            row.service.price_text,
            if row.service.active { "active" } else { "hidden" },
            row.views
        )?;
    }
    Ok(())
}

fn render_list_pretty(rows: &[ServiceRow], w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Services ({})", rows.len()))?;
    for row in rows {
        let hidden = if row.service.active { "" } else { "  (hidden)" };
        writeln!(
            w,
            "{:<22} {:<14} {:<12} {}{hidden}",
            row.service.name, row.service.category, row.service.price_text, row.service.id
        )?;
    }
    Ok(())
}

fn render_detail(row: &ServiceRow, w: &mut dyn Write) -> std::io::Result<()> {
    let service = &row.service;
    pretty_section(w, &service.name)?;
    pretty_kv(w, "id", &service.id)?;
    pretty_kv(w, "category", service.category.as_str())?;
    pretty_kv(w, "price", &service.price_text)?;
    pretty_kv(w, "action", service.action_label.as_str())?;
    pretty_kv(w, "visible", if service.active { "yes" } else { "no" })?;
    pretty_kv(w, "views", row.views.to_string())?;
    for (key, value) in [
        ("duration", &service.duration),
        ("location", &service.location),
        ("notes", &service.notes),
    ] {
        if let Some(value) = value {
            pretty_kv(w, key, value)?;
        }
    }
    if let Some(description) = &service.description {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }
    if let Some(slots) = service.availability.as_ref().filter(|slots| !slots.is_empty()) {
        writeln!(w)?;
        pretty_section(w, "Slots")?;
        for slot in slots {
            writeln!(w, "{slot}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use hotellyx_core::model::RequestStatus;

    #[derive(Parser)]
    struct Wrapper {
        #[command(subcommand)]
        command: ServiceCommand,
    }

    fn run(dir: &Path, command: ServiceCommand) -> anyhow::Result<()> {
        run_service(&ServiceArgs { command }, None, OutputMode::Json, dir)
    }

    #[test]
    fn add_parses_draft_flags() {
        let parsed = Wrapper::parse_from([
            "service",
            "add",
            "--name",
            "Late checkout",
            "--category",
            "other",
            "--price",
            "€30",
            "--late-checkout",
        ]);
        let ServiceCommand::Add(draft) = parsed.command else {
            panic!("expected add");
        };
        assert_eq!(draft.category, Some(ServiceCategory::Other));
        assert!(draft.late_checkout);
        assert!(!draft.pre_arrival);
    }

    #[test]
    fn edit_keeps_unset_fields() {
        let current = hotellyx_core::catalog::default_services()
            .into_iter()
            .find(|service| service.id == "svc_spa_massage")
            .unwrap();
        let draft = merge_draft(
            &current,
            &DraftArgs {
                price: Some("€70".into()),
                ..DraftArgs::default()
            },
        );
        assert_eq!(draft.name, current.name);
        assert_eq!(draft.price_text, "€70");
        assert_eq!(Some(draft.availability), current.availability);
    }

    #[test]
    fn guest_show_counts_views_and_hides_inactive() {
        let dir = tempfile::tempdir().unwrap();
        let show = |guest| ServiceCommand::Show {
            id: "svc_breakfast".into(),
            guest,
        };
        run(dir.path(), show(true)).unwrap();
        run(dir.path(), show(true)).unwrap();
        run(dir.path(), show(false)).unwrap();
        let session = Session::open(dir.path(), None, OutputMode::Json).unwrap();
        assert_eq!(session.catalog().views().get("svc_breakfast"), Some(&2));

        run(dir.path(), ServiceCommand::Toggle { id: "svc_breakfast".into() }).unwrap();
        assert!(run(dir.path(), show(true)).is_err());
        assert!(run(dir.path(), show(false)).is_ok());
    }

    #[test]
    fn booking_requires_registered_room_and_offered_slot() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(dir.path(), None, OutputMode::Json).unwrap();
        let room = session.rooms().add("305").unwrap().unwrap();
        let book = |slot: Option<&str>| ServiceCommand::Book {
            id: "svc_spa_massage".into(),
            room: room.token.clone(),
            slot: slot.map(str::to_string),
            note: None,
        };

        assert!(run(dir.path(), book(None)).is_err());
        assert!(run(dir.path(), book(Some("2030-01-01T00:00:00Z"))).is_err());
        assert!(
            run(
                dir.path(),
                ServiceCommand::Book {
                    id: "svc_spa_massage".into(),
                    room: "unregistered".into(),
                    slot: None,
                    note: None,
                }
            )
            .is_err()
        );
        assert!(session.requests().all().is_empty());

        let slot = session
            .catalog()
            .by_id("svc_spa_massage", false)
            .and_then(|service| service.availability)
            .and_then(|slots| slots.into_iter().next())
            .unwrap();
        run(dir.path(), book(Some(&slot))).unwrap();
        let booked = session.requests().all();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].kind, "Service: Spa massage");
        assert_eq!(booked[0].status, RequestStatus::New);
        assert!(booked[0].scheduled_for.is_some());
    }

    #[test]
    fn add_without_price_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(
            dir.path(),
            ServiceCommand::Add(DraftArgs {
                name: Some("Bike rental".into()),
                category: Some(ServiceCategory::Transport),
                ..DraftArgs::default()
            }),
        );
        assert!(result.is_err());
    }
}
