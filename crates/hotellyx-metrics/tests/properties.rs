use chrono::{DateTime, Duration, TimeZone, Utc};
use hotellyx_core::model::{Priority, Request, RequestStatus, StatusStamps};
use hotellyx_metrics::trend::trend_count;
use hotellyx_metrics::{
    Transition, Window, average_transition_minutes, is_active_at, is_sla_risk_at, trend_percent,
};
use proptest::prelude::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 7, 8, 0, 0).unwrap()
}

fn request_at(created: DateTime<Utc>, stamps: StatusStamps) -> Request {
    Request {
        id: "r".into(),
        room_token: "305".into(),
        room_number: Some("305".into()),
        kind: "towels".into(),
        status: RequestStatus::New,
        created_at: created,
        note: None,
        scheduled_for: None,
        priority: Priority::Normal,
        staff_note: None,
        assigned_team: None,
        assigned_person: None,
        eta_minutes: None,
        stamps,
    }
}

fn arb_request() -> impl Strategy<Value = Request> {
    (
        0_i64..600,
        prop::option::of(0_i64..600),
        prop::option::of(0_i64..600),
    )
        .prop_map(|(created, done_after, cancelled_after)| {
            let created_at = t0() + Duration::minutes(created);
            request_at(
                created_at,
                StatusStamps {
                    done_at: done_after.map(|m| created_at + Duration::minutes(m)),
                    cancelled_at: cancelled_after.map(|m| created_at + Duration::minutes(m)),
                    ..StatusStamps::default()
                },
            )
        })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn never_active_before_creation(req in arb_request(), before in 1_i64..10_000) {
        prop_assert!(!is_active_at(&req, req.created_at - Duration::seconds(before)));
    }

    #[test]
    fn never_active_once_done(req in arb_request(), after in 0_i64..10_000) {
        if let Some(done) = req.stamps.done_at {
            prop_assert!(!is_active_at(&req, done + Duration::seconds(after)));
        }
    }

    #[test]
    fn risk_implies_active(req in arb_request(), offset in -60_i64..1_200, threshold in 1_u32..120) {
        let at = t0() + Duration::minutes(offset);
        if !is_active_at(&req, at) {
            prop_assert!(!is_sla_risk_at(&req, at, threshold));
        }
    }

    #[test]
    fn no_trend_without_baseline(current in prop::option::of(-1e6_f64..1e6)) {
        prop_assert_eq!(trend_percent(current, None), None);
        prop_assert_eq!(trend_percent(current, Some(0.0)), None);
    }

    #[test]
    fn count_trend_sign_follows_direction(current in 0_usize..500, previous in 1_usize..500) {
        let trend = trend_count(current, previous).unwrap();
        if current > previous {
            prop_assert!(trend.starts_with('+') || trend == "0%");
        } else if current < previous {
            prop_assert!(trend.starts_with('-') || trend == "0%");
        } else {
            prop_assert_eq!(trend.as_str(), "0%");
        }
        prop_assert!(trend.ends_with('%'));
    }

    #[test]
    fn average_lies_between_extremes(
        minutes in prop::collection::vec(0_i32..300, 1..20)
    ) {
        let requests: Vec<Request> = minutes
            .iter()
            .map(|m| request_at(t0(), StatusStamps {
                accepted_at: Some(t0() + Duration::minutes(i64::from(*m))),
                ..StatusStamps::default()
            }))
            .collect();
        let window = Window::new(t0(), t0() + Duration::hours(6));
        let avg = average_transition_minutes(&requests, Transition::Accepted, window).unwrap();

        let lo = f64::from(minutes.iter().copied().min().unwrap());
        let hi = f64::from(minutes.iter().copied().max().unwrap());
        prop_assert!(avg >= lo - 1e-9 && avg <= hi + 1e-9);
    }
}

#[test]
fn sla_scenario_with_thirty_minute_threshold() {
    let open = request_at(t0(), StatusStamps::default());
    assert!(is_sla_risk_at(&open, t0() + Duration::minutes(31), 30));

    let done_early = request_at(
        t0(),
        StatusStamps {
            done_at: Some(t0() + Duration::minutes(25)),
            ..StatusStamps::default()
        },
    );
    assert!(!is_sla_risk_at(&done_early, t0() + Duration::minutes(31), 30));
}

#[test]
fn average_response_scenario() {
    let accepted = |m: i64| {
        request_at(
            t0(),
            StatusStamps {
                accepted_at: Some(t0() + Duration::minutes(m)),
                ..StatusStamps::default()
            },
        )
    };
    let window = Window::new(t0() - Duration::hours(1), t0() + Duration::hours(1));
    assert_eq!(
        average_transition_minutes(&[accepted(10), accepted(20)], Transition::Accepted, window),
        Some(15.0)
    );
}
