//! Service catalog, view counters, and guest bookings.
//!
//! An empty or unreadable catalog is reseeded with [`default_services`] the
//! first time it is listed, so guests always see something to book.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ErrorCode, StoreError};
use crate::lifecycle::{NewRequest, RequestEngine};
use crate::model::{ActionLabel, Request, Room, Service, ServiceCategory, UpsellRules, parse_iso};
use crate::rooms;
use crate::store::{self, RecordStore};

/// 2026-02-07T00:00:00Z, the creation time of the seeded services.
const SEED_EPOCH: i64 = 1_770_422_400;

/// Fresh service id: `svc_` plus eight characters of a UUID.
#[must_use]
pub fn new_service_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("svc_{}", &uuid[..8])
}

fn seed(
    id: &str,
    name: &str,
    category: ServiceCategory,
    price_text: &str,
    action_label: ActionLabel,
    description: &str,
) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        category,
        price_text: price_text.to_string(),
        active: true,
        created_at: DateTime::from_timestamp(SEED_EPOCH, 0).unwrap_or(DateTime::UNIX_EPOCH),
        action_label,
        availability: None,
        upsell_rules: None,
        description: Some(description.to_string()),
        duration: None,
        location: None,
        notes: None,
    }
}

fn slots(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|slot| (*slot).to_string()).collect())
}

/// The catalog a new property starts with.
#[must_use]
pub fn default_services() -> Vec<Service> {
    let mut spa = seed(
        "svc_spa_massage",
        "Spa massage",
        ServiceCategory::Wellness,
        "from €60",
        ActionLabel::Book,
        "Relaxing full-body massage by certified therapists.",
    );
    spa.availability = slots(&[
        "2026-02-07T13:00:00.000Z",
        "2026-02-07T15:00:00.000Z",
        "2026-02-07T17:00:00.000Z",
    ]);
    spa.duration = Some("60 min".into());
    spa.location = Some("Spa floor, level 2".into());
    spa.notes = Some("Please arrive 10 minutes before your slot.".into());

    let mut taxi = seed(
        "svc_airport_taxi",
        "Airport taxi",
        ServiceCategory::Transport,
        "from €35",
        ActionLabel::Book,
        "Private transfer service between hotel and airport.",
    );
    taxi.availability = slots(&[
        "2026-02-07T12:30:00.000Z",
        "2026-02-07T14:00:00.000Z",
        "2026-02-07T18:00:00.000Z",
    ]);
    taxi.duration = Some("30–60 min".into());
    taxi.location = Some("Hotel main entrance".into());

    let mut breakfast = seed(
        "svc_breakfast",
        "Breakfast",
        ServiceCategory::FoodAndDrinks,
        "€12",
        ActionLabel::Add,
        "Continental breakfast buffet with hot and cold options.",
    );
    breakfast.availability = slots(&[
        "2026-02-08T07:00:00.000Z",
        "2026-02-08T08:00:00.000Z",
        "2026-02-08T09:00:00.000Z",
    ]);
    breakfast.location = Some("Restaurant, ground floor".into());

    let mut towels = seed(
        "svc_extra_towels",
        "Extra towels",
        ServiceCategory::Housekeeping,
        "Included",
        ActionLabel::Request,
        "Additional towel set delivered to your room.",
    );
    towels.duration = Some("10–20 min".into());

    let mut meeting = seed(
        "svc_meeting_room",
        "Meeting room setup",
        ServiceCategory::Conference,
        "from €40",
        ActionLabel::Book,
        "Reserve and prepare a private meeting space.",
    );
    meeting.availability = slots(&["2026-02-07T11:00:00.000Z", "2026-02-07T16:00:00.000Z"]);
    meeting.location = Some("Business center, level 1".into());

    vec![spa, taxi, breakfast, towels, meeting]
}

/// Editable fields of a service, as entered by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDraft {
    pub name: String,
    pub category: ServiceCategory,
    pub price_text: String,
    pub availability: Vec<String>,
    pub upsell_rules: UpsellRules,
}

impl ServiceDraft {
    /// Split a comma-separated slot list, dropping blanks.
    #[must_use]
    pub fn parse_availability(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|slot| !slot.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Trimmed name and price, or `None` when either is blank.
    fn required(&self) -> Option<(String, String)> {
        let name = self.name.trim();
        let price = self.price_text.trim();
        (!name.is_empty() && !price.is_empty()).then(|| (name.to_string(), price.to_string()))
    }

    fn availability(&self) -> Option<Vec<String>> {
        let slots: Vec<String> = self
            .availability
            .iter()
            .map(|slot| slot.trim())
            .filter(|slot| !slot.is_empty())
            .map(str::to_string)
            .collect();
        (!slots.is_empty()).then_some(slots)
    }
}

/// Why a guest booking was refused.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("no room matches link '{0}'")]
    UnknownRoom(String),
    #[error("service '{0}' is not available")]
    UnknownService(String),
    #[error("{service} needs a slot; choose one of: {}", .offered.join(", "))]
    SlotRequired {
        service: String,
        offered: Vec<String>,
    },
    #[error("slot '{slot}' is not offered for {service}")]
    SlotNotOffered { service: String, slot: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BookingError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownRoom(_) => ErrorCode::RoomNotFound,
            Self::UnknownService(_) => ErrorCode::ServiceNotFound,
            Self::SlotRequired { .. } | Self::SlotNotOffered { .. } => ErrorCode::InvalidServiceSlot,
            Self::Store(err) => err.code(),
        }
    }
}

/// Read-modify-write access to the catalog and its view counters.
pub struct ServiceCatalog<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: RecordStore + ?Sized> ServiceCatalog<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Every service, active or not. Reseeds the defaults when nothing
    /// usable is stored.
    pub fn list(&self) -> Vec<Service> {
        let services: Vec<Service> = store::load(self.store, self.clock.now());
        if !services.is_empty() {
            return services;
        }

        let defaults = default_services();
        match store::save(self.store, &defaults) {
            Ok(()) => info!(count = defaults.len(), "seeded default services"),
            Err(err) => warn!(error = %err, "could not persist default services"),
        }
        defaults
    }

    /// Services a guest may browse.
    pub fn guest_services(&self) -> Vec<Service> {
        self.list()
            .into_iter()
            .filter(|service| service.active)
            .collect()
    }

    pub fn by_id(&self, id: &str, include_inactive: bool) -> Option<Service> {
        self.list()
            .into_iter()
            .find(|service| service.id == id && (include_inactive || service.active))
    }

    pub fn views(&self) -> BTreeMap<String, u64> {
        store::load_views(self.store)
    }

    /// Count one guest view of a service detail page.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn increment_view(&self, id: &str) -> Result<BTreeMap<String, u64>, StoreError> {
        let mut views = self.views();
        *views.entry(id.to_string()).or_insert(0) += 1;
        store::save_views(self.store, &views)?;
        Ok(views)
    }

    fn save(&self, services: &[Service]) -> Result<(), StoreError> {
        store::save(self.store, services)
    }

    /// Add a service, offered with the `Request` action label.
    ///
    /// Returns `None` when the draft's name or price is blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn create(&self, draft: &ServiceDraft) -> Result<Option<Service>, StoreError> {
        let Some((name, price_text)) = draft.required() else {
            return Ok(None);
        };

        let service = Service {
            id: new_service_id(),
            name,
            category: draft.category,
            price_text,
            active: true,
            created_at: self.clock.now(),
            action_label: ActionLabel::Request,
            availability: draft.availability(),
            upsell_rules: Some(draft.upsell_rules),
            description: None,
            duration: None,
            location: None,
            notes: None,
        };

        let mut services = vec![service.clone()];
        services.extend(self.list());
        self.save(&services)?;

        info!(id = %service.id, name = %service.name, "service created");
        Ok(Some(service))
    }

    /// Replace a service's editable fields, keeping everything else.
    ///
    /// Returns `None` when the id is unknown or the draft is incomplete.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn update(&self, id: &str, draft: &ServiceDraft) -> Result<Option<Service>, StoreError> {
        let Some((name, price_text)) = draft.required() else {
            return Ok(None);
        };

        self.modify(id, |service| {
            service.name = name;
            service.category = draft.category;
            service.price_text = price_text;
            service.availability = draft.availability();
            service.upsell_rules = Some(draft.upsell_rules);
        })
    }

    /// Show or hide a service for guests.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn set_active(&self, id: &str, active: bool) -> Result<Option<Service>, StoreError> {
        self.modify(id, |service| service.active = active)
    }

    /// Flip a service's active flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn toggle_active(&self, id: &str) -> Result<Option<Service>, StoreError> {
        self.modify(id, |service| service.active = !service.active)
    }

    fn modify(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Service),
    ) -> Result<Option<Service>, StoreError> {
        let mut services = self.list();
        let Some(service) = services.iter_mut().find(|service| service.id == id) else {
            return Ok(None);
        };

        mutate(service);
        let updated = service.clone();
        self.save(&services)?;
        info!(id = %updated.id, active = updated.active, "service updated");
        Ok(Some(updated))
    }

    /// Book an active service for a room.
    ///
    /// The request type is `Service: <name>`. Services with availability
    /// slots require one of them, which becomes the request's scheduled time.
    ///
    /// # Errors
    ///
    /// Returns an error when the room or service is unknown, the slot is
    /// missing or not offered, or the store write fails.
    pub fn book(
        &self,
        requests: &RequestEngine<'_, S>,
        room_token: &str,
        service_id: &str,
        slot: Option<&str>,
        note: Option<String>,
    ) -> Result<Request, BookingError> {
        let rooms_list: Vec<Room> = store::load(self.store, self.clock.now());
        let Some(room) = rooms::resolve(&rooms_list, room_token) else {
            return Err(BookingError::UnknownRoom(room_token.to_string()));
        };

        let service = self
            .by_id(service_id, false)
            .ok_or_else(|| BookingError::UnknownService(service_id.to_string()))?;

        let scheduled_for = match (service.availability.as_deref(), slot) {
            (Some(offered), None) if !offered.is_empty() => {
                return Err(BookingError::SlotRequired {
                    service: service.name.clone(),
                    offered: offered.to_vec(),
                });
            }
            (Some(offered), Some(chosen)) if !offered.is_empty() => {
                let chosen = chosen.trim();
                let wanted = parse_iso(chosen);
                let matched = offered.iter().find(|offered_slot| {
                    offered_slot.as_str() == chosen
                        || (wanted.is_some() && parse_iso(offered_slot) == wanted)
                });
                let Some(matched) = matched else {
                    return Err(BookingError::SlotNotOffered {
                        service: service.name.clone(),
                        slot: chosen.to_string(),
                    });
                };
                parse_iso(matched)
            }
            (_, chosen) => chosen.and_then(parse_iso),
        };

        let request = requests.create(
            &room.token,
            &service.request_type(),
            NewRequest {
                note,
                scheduled_for,
                room_number: Some(room.room_number.clone()),
                ..NewRequest::default()
            },
        )?;
        info!(service = %service.id, request = %request.id, "service booked");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::rooms::RoomEngine;
    use crate::store::{MemoryStore, SERVICES_KEY};
    use chrono::TimeZone;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 7, 10, 0, 0).unwrap())
    }

    fn draft(name: &str, price: &str) -> ServiceDraft {
        ServiceDraft {
            name: name.into(),
            category: ServiceCategory::Other,
            price_text: price.into(),
            availability: Vec::new(),
            upsell_rules: UpsellRules::default(),
        }
    }

    #[test]
    fn empty_catalog_seeds_defaults() {
        let store = MemoryStore::new();
        let clock = clock();
        let catalog = ServiceCatalog::new(&store, &clock);

        let services = catalog.list();
        assert_eq!(services.len(), 5);
        assert_eq!(services[0].id, "svc_spa_massage");
        assert_eq!(
            crate::model::format_iso(services[0].created_at),
            "2026-02-07T00:00:00.000Z"
        );
        assert!(store.get(SERVICES_KEY).unwrap().is_some());

        store.set(SERVICES_KEY, "not json").unwrap();
        assert_eq!(catalog.list().len(), 5);
    }

    #[test]
    fn new_ids_have_prefix_and_length() {
        let id = new_service_id();
        assert!(id.starts_with("svc_"));
        assert_eq!(id.len(), 12);
    }

    #[test]
    fn create_requires_name_and_price() {
        let store = MemoryStore::new();
        let clock = clock();
        let catalog = ServiceCatalog::new(&store, &clock);

        assert_eq!(catalog.create(&draft("  ", "€5")).unwrap(), None);
        assert_eq!(catalog.create(&draft("Late checkout", " ")).unwrap(), None);

        let mut late = draft(" Late checkout ", " €20 ");
        late.availability = ServiceDraft::parse_availability(" 2026-02-08T11:00:00.000Z, ,");
        let created = catalog.create(&late).unwrap().unwrap();
        assert_eq!(created.name, "Late checkout");
        assert_eq!(created.price_text, "€20");
        assert_eq!(created.action_label, ActionLabel::Request);
        assert!(created.active);
        assert_eq!(created.availability.as_ref().map(Vec::len), Some(1));

        let services = catalog.list();
        assert_eq!(services.len(), 6);
        assert_eq!(services[0].id, created.id);
    }

    #[test]
    fn update_keeps_identity_and_clears_empty_availability() {
        let store = MemoryStore::new();
        let clock = clock();
        let catalog = ServiceCatalog::new(&store, &clock);

        let mut edit = draft("Spa ritual", "from €80");
        edit.category = ServiceCategory::Wellness;
        let updated = catalog.update("svc_spa_massage", &edit).unwrap().unwrap();
        assert_eq!(updated.id, "svc_spa_massage");
        assert_eq!(updated.name, "Spa ritual");
        assert_eq!(updated.availability, None);
        assert_eq!(updated.action_label, ActionLabel::Book);
        assert_eq!(updated.duration.as_deref(), Some("60 min"));

        assert_eq!(catalog.update("svc_missing", &edit).unwrap(), None);
    }

    #[test]
    fn inactive_services_hidden_from_guests() {
        let store = MemoryStore::new();
        let clock = clock();
        let catalog = ServiceCatalog::new(&store, &clock);

        catalog.set_active("svc_breakfast", false).unwrap();
        assert_eq!(catalog.guest_services().len(), 4);
        assert!(catalog.by_id("svc_breakfast", false).is_none());
        assert!(catalog.by_id("svc_breakfast", true).is_some());

        let toggled = catalog.toggle_active("svc_breakfast").unwrap().unwrap();
        assert!(toggled.active);
        assert_eq!(catalog.toggle_active("svc_nope").unwrap(), None);
    }

    #[test]
    fn views_accumulate_per_service() {
        let store = MemoryStore::new();
        let clock = clock();
        let catalog = ServiceCatalog::new(&store, &clock);

        catalog.increment_view("svc_spa_massage").unwrap();
        catalog.increment_view("svc_spa_massage").unwrap();
        let views = catalog.increment_view("svc_breakfast").unwrap();
        assert_eq!(views.get("svc_spa_massage"), Some(&2));
        assert_eq!(catalog.views(), views);
    }

    #[test]
    fn booking_records_service_request_with_slot() {
        let store = MemoryStore::new();
        let clock = clock();
        let room = RoomEngine::new(&store, &clock).add("305").unwrap().unwrap();
        let catalog = ServiceCatalog::new(&store, &clock);
        let requests = RequestEngine::new(&store, &clock);

        let err = catalog
            .book(&requests, &room.token, "svc_spa_massage", None, None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidServiceSlot);

        let err = catalog
            .book(&requests, &room.token, "svc_spa_massage", Some("2026-02-07T14:00:00.000Z"), None)
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotNotOffered { .. }));

        let booked = catalog
            .book(
                &requests,
                "305",
                "svc_spa_massage",
                Some("2026-02-07T15:00:00Z"),
                Some("  quiet room please ".into()),
            )
            .unwrap();
        assert_eq!(booked.kind, "Service: Spa massage");
        assert_eq!(booked.room_token, room.token);
        assert_eq!(booked.room_number.as_deref(), Some("305"));
        assert_eq!(booked.note.as_deref(), Some("quiet room please"));
        assert_eq!(
            booked.scheduled_for,
            Some(Utc.with_ymd_and_hms(2026, 2, 7, 15, 0, 0).unwrap())
        );

        let towels = catalog
            .book(&requests, &room.token, "svc_extra_towels", None, None)
            .unwrap();
        assert_eq!(towels.scheduled_for, None);
        assert_eq!(requests.all().len(), 2);
    }

    #[test]
    fn booking_rejects_unknown_room_and_inactive_service() {
        let store = MemoryStore::new();
        let clock = clock();
        let room = RoomEngine::new(&store, &clock).add("305").unwrap().unwrap();
        let catalog = ServiceCatalog::new(&store, &clock);
        let requests = RequestEngine::new(&store, &clock);

        let err = catalog
            .book(&requests, "ghost", "svc_extra_towels", None, None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RoomNotFound);

        catalog.set_active("svc_extra_towels", false).unwrap();
        let err = catalog
            .book(&requests, &room.token, "svc_extra_towels", None, None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ServiceNotFound);
        assert!(requests.all().is_empty());
    }
}
