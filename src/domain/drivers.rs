//! Driver performance roll-up over flat delivery rows

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::instrument;

use crate::domain::entities::{coalesce, DeliveryRecord};

/// Bucket id for deliveries whose driver is missing.
pub const UNKNOWN_DRIVER_ID: &str = "__unknown__";

/// Default display name for the unknown-driver bucket.
pub const UNKNOWN_DRIVER_LABEL: &str = "Unknown driver";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStat {
    pub driver_id: String,
    pub driver_name: String,
    /// Plate of the most recent delivery that carries one
    pub latest_truck_plate: Option<String>,
    /// Sum of `tonnage_loaded`: what left the yard, not what was received
    pub total_tonnage: f64,
    pub trip_count: usize,
    /// Most recent first; rows without a timestamp last
    pub deliveries: Vec<DeliveryRecord>,
}

impl DriverStat {
    fn new(driver_id: String) -> Self {
        Self {
            driver_id,
            driver_name: String::new(),
            latest_truck_plate: None,
            total_tonnage: 0.0,
            trip_count: 0,
            deliveries: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.driver_id == UNKNOWN_DRIVER_ID
    }
}

/// One stat per distinct driver id, heaviest first.
///
/// Ties keep the order in which drivers were first encountered.
#[instrument(level = "debug", skip(deliveries), fields(rows = deliveries.len()))]
pub fn driver_rollup(deliveries: &[DeliveryRecord], unknown_label: &str) -> Vec<DriverStat> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<DriverStat> = Vec::new();

    for delivery in deliveries {
        let driver_id = match delivery.driver_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => UNKNOWN_DRIVER_ID.to_string(),
        };
        let slot = *index.entry(driver_id.clone()).or_insert_with(|| {
            stats.push(DriverStat::new(driver_id));
            stats.len() - 1
        });
        let stat = &mut stats[slot];

        if stat.driver_name.is_empty() {
            if let Some(name) = delivery.driver_name.as_deref().filter(|n| !n.trim().is_empty()) {
                stat.driver_name = name.to_string();
            }
        }
        stat.total_tonnage += coalesce(Some(delivery.tonnage_loaded));
        stat.trip_count += 1;
        stat.deliveries.push(delivery.clone());
    }

    for stat in &mut stats {
        if stat.is_unknown() || stat.driver_name.is_empty() {
            stat.driver_name = unknown_label.to_string();
        }
        stat.deliveries.sort_by(most_recent_first);
        stat.latest_truck_plate = stat
            .deliveries
            .iter()
            .find_map(|d| d.truck_plate.clone().filter(|p| !p.trim().is_empty()));
    }

    stats.sort_by(|a, b| b.total_tonnage.total_cmp(&a.total_tonnage));
    stats
}

fn most_recent_first(a: &DeliveryRecord, b: &DeliveryRecord) -> Ordering {
    match (a.delivered_at, b.delivered_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(driver: Option<&str>, plate: Option<&str>, tonnage: f64, day: Option<u32>) -> DeliveryRecord {
        DeliveryRecord {
            id: format!("{:?}-{tonnage}", driver),
            driver_id: driver.map(str::to_string),
            driver_name: driver.map(|d| format!("Driver {d}")),
            truck_plate: plate.map(str::to_string),
            tonnage_loaded: tonnage,
            tonnage_delivered: tonnage,
            delivered_at: day.map(|d| Utc.with_ymd_and_hms(2024, 6, d, 8, 0, 0).unwrap()),
            allocation_key: None,
        }
    }

    #[test]
    fn given_deliveries_with_dates_when_rolling_up_then_latest_plate_wins() {
        let rows = vec![
            row(Some("A"), Some("TH-1111-A"), 10.0, Some(1)),
            row(Some("A"), Some("DK-2222-B"), 10.0, Some(3)),
            row(Some("A"), None, 10.0, None),
        ];

        let stats = driver_rollup(&rows, UNKNOWN_DRIVER_LABEL);

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].latest_truck_plate.as_deref(), Some("DK-2222-B"));
        assert!(stats[0].deliveries[2].delivered_at.is_none());
    }

    #[test]
    fn given_blank_driver_id_when_rolling_up_then_goes_to_unknown_bucket() {
        let rows = vec![row(Some("  "), None, 5.0, None), row(None, None, 7.0, None)];

        let stats = driver_rollup(&rows, "Chauffeur inconnu");

        assert_eq!(stats.len(), 1);
        assert!(stats[0].is_unknown());
        assert_eq!(stats[0].trip_count, 2);
        assert_eq!(stats[0].total_tonnage, 12.0);
    }

    #[test]
    fn given_tied_tonnage_when_sorting_then_keeps_first_encountered_order() {
        let rows = vec![
            row(Some("B"), None, 20.0, None),
            row(Some("A"), None, 20.0, None),
            row(Some("C"), None, 30.0, None),
        ];

        let ids: Vec<_> = driver_rollup(&rows, UNKNOWN_DRIVER_LABEL)
            .into_iter()
            .map(|s| s.driver_id)
            .collect();

        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[test]
    fn given_no_deliveries_when_rolling_up_then_returns_empty() {
        assert!(driver_rollup(&[], UNKNOWN_DRIVER_LABEL).is_empty());
    }
}
