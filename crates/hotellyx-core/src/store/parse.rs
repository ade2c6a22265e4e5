//! Tolerant per-record parsers for stored collections.
//!
//! Each parser checks only the minimal required fields of its record. Fields
//! outside a recognized enum fall back to that enum's default instead of
//! rejecting the record; legacy field aliases are still honored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::{REQUESTS_KEY, ROOMS_KEY, Record, SERVICES_KEY};
use crate::model::{
    Priority, Request, RequestStatus, Room, RoomStatus, Service, StatusStamps, UpsellRules,
    parse_iso,
};

/// Legacy spellings of a request's guest note, in lookup order.
const NOTE_ALIASES: [&str; 4] = ["note", "notes", "message", "details"];

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| str_field(obj, key))
}

fn trimmed_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_str(obj, keys)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn owned_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(obj, key).map(str::to_string)
}

fn time_field(obj: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    str_field(obj, key).and_then(parse_iso)
}

fn enum_field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Option<T> {
    obj.get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn whole_minutes(value: &Value) -> Option<u32> {
    let minutes = value.as_f64().filter(|m| m.is_finite() && *m > 0.0)?;
    let rounded = minutes.round();
    (rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

impl Record for Request {
    const KEY: &'static str = REQUESTS_KEY;

    fn from_value(value: &Value, _now: DateTime<Utc>) -> Option<Self> {
        let obj = value.as_object()?;

        let id = owned_field(obj, "id")?;
        let room_token = owned_field(obj, "roomToken")?;
        let kind = owned_field(obj, "type")?;
        let status: RequestStatus = enum_field(obj, "status")?;
        let created_at = time_field(obj, "createdAt")?;

        Some(Self {
            id,
            room_token,
            room_number: owned_field(obj, "roomNumber"),
            kind,
            status,
            created_at,
            note: trimmed_field(obj, &NOTE_ALIASES),
            scheduled_for: time_field(obj, "scheduledFor"),
            priority: enum_field(obj, "priority").unwrap_or(Priority::Normal),
            staff_note: trimmed_field(obj, &["staffNote"]),
            assigned_team: owned_field(obj, "assignedTeam"),
            assigned_person: owned_field(obj, "assignedPerson"),
            eta_minutes: obj.get("etaMinutes").and_then(whole_minutes),
            stamps: StatusStamps {
                accepted_at: time_field(obj, "acceptedAt"),
                in_progress_at: time_field(obj, "inProgressAt"),
                done_at: time_field(obj, "doneAt"),
                cancelled_at: time_field(obj, "cancelledAt"),
            },
        })
    }
}

impl Record for Room {
    const KEY: &'static str = ROOMS_KEY;

    fn from_value(value: &Value, now: DateTime<Utc>) -> Option<Self> {
        let obj = value.as_object()?;

        let room_number = first_str(obj, &["roomNumber", "roomToken", "token"]).unwrap_or("");
        let token = first_str(obj, &["token", "roomToken"]).unwrap_or("");
        if room_number.is_empty() || token.is_empty() {
            return None;
        }

        let created_at = time_field(obj, "createdAt")
            .or_else(|| time_field(obj, "updatedAt"))
            .unwrap_or(now);
        let room_status = str_field(obj, "roomStatus")
            .and_then(RoomStatus::from_stored)
            .unwrap_or_default();

        Some(Self {
            room_number: room_number.to_string(),
            token: token.to_string(),
            created_at,
            room_status,
        })
    }
}

fn availability(obj: &Map<String, Value>) -> Option<Vec<String>> {
    let candidate = ["availability", "availableSlots"]
        .iter()
        .find_map(|key| obj.get(*key).filter(|value| !value.is_null()))?;

    candidate
        .as_array()?
        .iter()
        .map(|slot| slot.as_str().map(str::to_string))
        .collect()
}

fn upsell_rules(obj: &Map<String, Value>) -> Option<UpsellRules> {
    let raw = obj.get("upsellRules")?.as_object()?;
    let pre_arrival = raw.get("showPreArrival").and_then(Value::as_bool);
    let late_checkout = raw
        .get("showWhenLateCheckoutNotBought")
        .and_then(Value::as_bool);

    if pre_arrival.is_none() && late_checkout.is_none() {
        return None;
    }

    Some(UpsellRules {
        show_pre_arrival: pre_arrival.unwrap_or(false),
        show_when_late_checkout_not_bought: late_checkout.unwrap_or(false),
    })
}

impl Record for Service {
    const KEY: &'static str = SERVICES_KEY;

    fn from_value(value: &Value, now: DateTime<Utc>) -> Option<Self> {
        let obj = value.as_object()?;

        let id = owned_field(obj, "id")?;
        let name = owned_field(obj, "name")?;
        let category = enum_field(obj, "category")?;
        let price_text = owned_field(obj, "priceText")?;

        Some(Self {
            id,
            name,
            category,
            price_text,
            active: obj.get("active").and_then(Value::as_bool).unwrap_or(true),
            created_at: time_field(obj, "createdAt").unwrap_or(now),
            action_label: enum_field(obj, "actionLabel").unwrap_or_default(),
            availability: availability(obj),
            upsell_rules: upsell_rules(obj),
            description: owned_field(obj, "description"),
            duration: owned_field(obj, "duration"),
            location: owned_field(obj, "location"),
            notes: owned_field(obj, "notes"),
        })
    }
}

/// Parse per-service view counters, keeping only finite non-negative counts.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn service_views(raw: &str) -> BTreeMap<String, u64> {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "stored service views are not valid JSON, ignoring");
            return BTreeMap::new();
        }
    };

    let Value::Object(entries) = parsed else {
        warn!("stored service views are not an object, ignoring");
        return BTreeMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(id, count)| {
            let count = count.as_f64().filter(|c| c.is_finite() && *c >= 0.0)?;
            Some((id, count.floor() as u64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionLabel, ServiceCategory, format_iso};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap()
    }

    fn base_request() -> Value {
        json!({
            "id": "r1",
            "roomToken": "A1B2",
            "type": "towels",
            "status": "new",
            "createdAt": "2026-02-07T10:00:00.000Z",
        })
    }

    #[test]
    fn request_requires_core_fields() {
        assert!(Request::from_value(&base_request(), now()).is_some());

        for missing in ["id", "roomToken", "type", "status", "createdAt"] {
            let mut value = base_request();
            value.as_object_mut().unwrap().remove(missing);
            assert!(
                Request::from_value(&value, now()).is_none(),
                "accepted request without {missing}"
            );
        }

        let mut bad_time = base_request();
        bad_time["createdAt"] = json!("not a date");
        assert!(Request::from_value(&bad_time, now()).is_none());
    }

    #[test]
    fn request_optional_fields_fall_back() {
        let mut value = base_request();
        value["priority"] = json!("urgent");
        value["notes"] = json!("  extra pillows ");
        value["staffNote"] = json!("   ");
        value["etaMinutes"] = json!(12.6);
        value["acceptedAt"] = json!("garbage");
        value["doneAt"] = json!("2026-02-07T10:30:00.000Z");

        let request = Request::from_value(&value, now()).unwrap();
        assert_eq!(request.priority, Priority::Normal);
        assert_eq!(request.note.as_deref(), Some("extra pillows"));
        assert_eq!(request.staff_note, None);
        assert_eq!(request.eta_minutes, Some(13));
        assert_eq!(request.stamps.accepted_at, None);
        assert_eq!(
            request.stamps.done_at.map(format_iso).as_deref(),
            Some("2026-02-07T10:30:00.000Z")
        );
    }

    #[test]
    fn stored_eta_reads_like_the_engine_writes_it() {
        for (stored, expected) in [
            (json!(0), None),
            (json!(-3), None),
            (json!("15"), None),
            (json!(14.5), Some(15)),
        ] {
            let mut value = base_request();
            value["etaMinutes"] = stored;
            let request = Request::from_value(&value, now()).unwrap();
            assert_eq!(request.eta_minutes, expected);
        }
    }

    #[test]
    fn note_aliases_are_checked_in_order() {
        let mut value = base_request();
        value["message"] = json!("from message");
        value["details"] = json!("from details");
        let request = Request::from_value(&value, now()).unwrap();
        assert_eq!(request.note.as_deref(), Some("from message"));

        value["note"] = json!("   ");
        let request = Request::from_value(&value, now()).unwrap();
        assert_eq!(request.note, None);
    }

    #[test]
    fn room_fields_fall_back_to_legacy_names() {
        let legacy = json!({ "roomToken": "305", "roomStatus": "do_not_disturb" });
        let room = Room::from_value(&legacy, now()).unwrap();
        assert_eq!(room.room_number, "305");
        assert_eq!(room.token, "305");
        assert_eq!(room.room_status, RoomStatus::Dnd);
        assert_eq!(room.created_at, now());

        let updated = json!({
            "roomNumber": "12",
            "token": "tok",
            "updatedAt": "2026-01-01T00:00:00.000Z",
            "roomStatus": "flooded",
        });
        let room = Room::from_value(&updated, now()).unwrap();
        assert_eq!(format_iso(room.created_at), "2026-01-01T00:00:00.000Z");
        assert_eq!(room.room_status, RoomStatus::Normal);

        assert!(Room::from_value(&json!({ "roomNumber": "12" }), now()).is_none());
        assert!(Room::from_value(&json!("12"), now()).is_none());
    }

    #[test]
    fn service_requires_core_fields_and_defaults_the_rest() {
        let value = json!({
            "id": "svc_x",
            "name": "Late checkout",
            "category": "Other",
            "priceText": "€20",
            "actionLabel": "Reserve",
            "availableSlots": ["2026-02-07T13:00:00.000Z"],
            "upsellRules": { "showPreArrival": true },
        });
        let service = Service::from_value(&value, now()).unwrap();
        assert!(service.active);
        assert_eq!(service.category, ServiceCategory::Other);
        assert_eq!(service.action_label, ActionLabel::Request);
        assert_eq!(service.availability.as_deref().map(<[String]>::len), Some(1));
        assert_eq!(
            service.upsell_rules,
            Some(UpsellRules {
                show_pre_arrival: true,
                show_when_late_checkout_not_bought: false,
            })
        );

        let bad_category = json!({ "id": "a", "name": "b", "category": "Golf", "priceText": "c" });
        assert!(Service::from_value(&bad_category, now()).is_none());
    }

    #[test]
    fn service_availability_must_be_all_strings() {
        let value = json!({
            "id": "svc_x",
            "name": "Taxi",
            "category": "Transport",
            "priceText": "€35",
            "availability": ["2026-02-07T13:00:00.000Z", 7],
            "upsellRules": { "showPreArrival": "yes" },
        });
        let service = Service::from_value(&value, now()).unwrap();
        assert_eq!(service.availability, None);
        assert_eq!(service.upsell_rules, None);
    }

    #[test]
    fn service_views_keep_finite_non_negative_counts() {
        let views = service_views(r#"{"a": 3.9, "b": -1, "c": "7", "d": 0}"#);
        assert_eq!(views.get("a"), Some(&3));
        assert_eq!(views.get("b"), None);
        assert_eq!(views.get("c"), None);
        assert_eq!(views.get("d"), Some(&0));

        assert!(service_views("[1,2]").is_empty());
        assert!(service_views("nope").is_empty());
    }
}
