//! Subscriber-list KPIs.
//!
//! The subscriber list arrives under `listSubscriber.subscriberList`; the
//! dashboard's headline tiles only need counts out of it.

use serde::Serialize;
use serde_json::Value;

/// Headline counts over one subscriber list.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SubscriberKpis {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

/// The subscriber array of a list response, if the response has one.
pub fn subscriber_list(response: &Value) -> Option<&Vec<Value>> {
    response.get("listSubscriber")?.get("subscriberList")?.as_array()
}

/// Compute headline KPIs from a parsed list response.
///
/// A subscriber is active when its `status` array holds an entry whose
/// `status` field equals `ACTIVE` ignoring case. A missing or oddly shaped
/// list yields all-zero KPIs, never an error.
pub fn kpis(response: &Value) -> SubscriberKpis {
    let Some(list) = subscriber_list(response) else {
        return SubscriberKpis::default();
    };
    let total = list.len();
    let active = list.iter().filter(|entry| is_active(entry)).count();
    SubscriberKpis {
        total,
        active,
        inactive: total - active,
    }
}

fn is_active(subscriber: &Value) -> bool {
    subscriber
        .get("status")
        .and_then(Value::as_array)
        .map(|statuses| {
            statuses.iter().any(|status| {
                status
                    .get("status")
                    .and_then(Value::as_str)
                    .map(|s| s.eq_ignore_ascii_case("ACTIVE"))
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}
