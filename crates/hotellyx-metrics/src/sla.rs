//! Point-in-time activity and SLA predicates.
//!
//! Activity at an instant is reconstructed from the first-arrival stamps, so
//! no status history needs to be stored.

use chrono::{DateTime, Duration, Utc};
use hotellyx_core::model::Request;

/// Whether `request` was open at `at`: created no later than `at`, and
/// neither done nor cancelled by then.
#[must_use]
pub fn is_active_at(request: &Request, at: DateTime<Utc>) -> bool {
    if request.created_at > at {
        return false;
    }
    let closed_by = |stamp: Option<DateTime<Utc>>| stamp.is_some_and(|ts| ts <= at);
    !closed_by(request.stamps.done_at) && !closed_by(request.stamps.cancelled_at)
}

/// Whether `request` was active at `at` and strictly older than
/// `threshold_minutes`.
///
/// Age alone decides; team and priority play no part.
#[must_use]
pub fn is_sla_risk_at(request: &Request, at: DateTime<Utc>, threshold_minutes: u32) -> bool {
    is_active_at(request, at)
        && at - request.created_at > Duration::minutes(i64::from(threshold_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hotellyx_core::model::{Priority, RequestStatus, StatusStamps};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 0).unwrap()
    }

    fn request() -> Request {
        Request {
            id: "r".into(),
            room_token: "305".into(),
            room_number: None,
            kind: "towels".into(),
            status: RequestStatus::New,
            created_at: t0(),
            note: None,
            scheduled_for: None,
            priority: Priority::Normal,
            staff_note: None,
            assigned_team: None,
            assigned_person: None,
            eta_minutes: None,
            stamps: StatusStamps::default(),
        }
    }

    #[test]
    fn inactive_before_creation_and_after_close() {
        let mut req = request();
        assert!(!is_active_at(&req, t0() - Duration::seconds(1)));
        assert!(is_active_at(&req, t0()));

        req.stamps.done_at = Some(t0() + Duration::minutes(25));
        assert!(is_active_at(&req, t0() + Duration::minutes(24)));
        assert!(!is_active_at(&req, t0() + Duration::minutes(25)));

        let mut cancelled = request();
        cancelled.stamps.cancelled_at = Some(t0() + Duration::minutes(5));
        assert!(!is_active_at(&cancelled, t0() + Duration::minutes(6)));
    }

    #[test]
    fn sla_risk_with_thirty_minute_threshold() {
        let mut req = request();
        assert!(is_sla_risk_at(&req, t0() + Duration::minutes(31), 30));
        assert!(!is_sla_risk_at(&req, t0() + Duration::minutes(30), 30));

        req.stamps.done_at = Some(t0() + Duration::minutes(25));
        assert!(!is_sla_risk_at(&req, t0() + Duration::minutes(31), 30));
    }

    #[test]
    fn threshold_is_a_parameter() {
        let req = request();
        let at = t0() + Duration::minutes(27);
        assert!(is_sla_risk_at(&req, at, 25));
        assert!(!is_sla_risk_at(&req, at, 30));
    }
}
