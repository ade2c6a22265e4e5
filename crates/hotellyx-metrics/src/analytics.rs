//! Catalog analytics: top request types, service conversion, unused
//! services.

use std::collections::BTreeMap;

use hotellyx_core::model::{Request, Service};
use serde::Serialize;

use crate::format::format_percent;

/// How many request types the top list keeps.
pub const TOP_REQUESTED_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
}

/// Views and resulting requests for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionRow {
    pub id: String,
    pub name: String,
    pub views: u64,
    pub requests: u64,
    pub conversion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    pub top_requested: Vec<TypeCount>,
    pub conversion: Vec<ConversionRow>,
    pub unused: Vec<ConversionRow>,
    pub unused_view_threshold: u64,
}

/// The `limit` most frequent request types. Ties keep first-seen order.
#[must_use]
pub fn top_requested(requests: &[Request], limit: usize) -> Vec<TypeCount> {
    let mut counts: Vec<TypeCount> = Vec::new();
    for request in requests {
        match counts.iter_mut().find(|entry| entry.kind == request.kind) {
            Some(entry) => entry.count += 1,
            None => counts.push(TypeCount {
                kind: request.kind.clone(),
                count: 1,
            }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// One row per service: views, `Service: <name>` requests, and conversion.
#[must_use]
pub fn conversion_rows(
    services: &[Service],
    views: &BTreeMap<String, u64>,
    requests: &[Request],
) -> Vec<ConversionRow> {
    services
        .iter()
        .map(|service| {
            let request_type = service.request_type();
            let viewed = views.get(&service.id).copied().unwrap_or(0);
            let requested = requests
                .iter()
                .filter(|request| request.kind == request_type)
                .count();
            let requested = u64::try_from(requested).unwrap_or(u64::MAX);

            ConversionRow {
                id: service.id.clone(),
                name: service.name.clone(),
                views: viewed,
                requests: requested,
                conversion: format_percent(requested, viewed),
            }
        })
        .collect()
}

/// Rows viewed fewer than `threshold` times.
#[must_use]
pub fn unused_services(rows: &[ConversionRow], threshold: u64) -> Vec<ConversionRow> {
    rows.iter()
        .filter(|row| row.views < threshold)
        .cloned()
        .collect()
}

/// Everything on the analytics page in one pass.
#[must_use]
pub fn catalog_report(
    requests: &[Request],
    services: &[Service],
    views: &BTreeMap<String, u64>,
    unused_view_threshold: u64,
) -> CatalogReport {
    let conversion = conversion_rows(services, views, requests);
    let unused = unused_services(&conversion, unused_view_threshold);
    CatalogReport {
        top_requested: top_requested(requests, TOP_REQUESTED_LIMIT),
        conversion,
        unused,
        unused_view_threshold,
    }
}
