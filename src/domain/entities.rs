//! Domain entities: the campaign hierarchy and flat delivery rows
//!
//! Every tonnage field coalesces `null`/missing/non-numeric/non-finite/negative
//! to `0.0`, numeric strings are parsed, ids accept strings or numbers, and every
//! child collection coalesces `null`/missing to empty, so a partial payload
//! never reaches the aggregation as an error.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Top of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_string")]
    pub name: String,
    #[serde(deserialize_with = "coalesce_vec")]
    pub departments: Vec<Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Department {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_string")]
    pub name: String,
    #[serde(deserialize_with = "coalesce_vec")]
    pub communes: Vec<Commune>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commune {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_string")]
    pub name: String,
    #[serde(deserialize_with = "coalesce_vec")]
    pub operators: Vec<Operator>,
}

/// Distributor receiving allocations; either a cooperative or an individual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operator {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_string")]
    pub name: String,
    #[serde(deserialize_with = "coalesce_bool")]
    pub is_cooperative: bool,
    #[serde(deserialize_with = "coalesce_vec")]
    pub allocations: Vec<Allocation>,
}

/// Tonnage promised to one operator, the leaf of every roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allocation {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    /// Human-readable allocation key, e.g. `THS-FAN-001`
    #[serde(deserialize_with = "coalesce_string")]
    pub key: String,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub target: f64,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub delivered: f64,
    #[serde(deserialize_with = "coalesce_vec")]
    pub deliveries: Vec<Delivery>,
}

/// One truck trip against an allocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delivery {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub tonnage_loaded: f64,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub tonnage_delivered: f64,
    #[serde(deserialize_with = "coalesce_timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub truck_plate: Option<String>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub driver_id: Option<String>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub driver_name: Option<String>,
}

/// The nested payload handed over by the record-fetch collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hierarchy {
    #[serde(deserialize_with = "coalesce_vec")]
    pub regions: Vec<Region>,
}

impl Hierarchy {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Flatten every delivery into a driver-view row, tagged with its allocation key.
    pub fn flatten_deliveries(&self) -> Vec<DeliveryRecord> {
        self.regions
            .iter()
            .flat_map(|r| &r.departments)
            .flat_map(|d| &d.communes)
            .flat_map(|c| &c.operators)
            .flat_map(|o| &o.allocations)
            .flat_map(|a| {
                a.deliveries
                    .iter()
                    .map(move |d| DeliveryRecord::from_delivery(d, Some(a.key.clone())))
            })
            .collect()
    }
}

/// Flat delivery row consumed by the driver roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryRecord {
    #[serde(deserialize_with = "coalesce_string")]
    pub id: String,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub driver_id: Option<String>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub driver_name: Option<String>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub truck_plate: Option<String>,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub tonnage_loaded: f64,
    #[serde(deserialize_with = "coalesce_tonnage")]
    pub tonnage_delivered: f64,
    #[serde(deserialize_with = "coalesce_timestamp")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "coalesce_opt_string")]
    pub allocation_key: Option<String>,
}

impl DeliveryRecord {
    pub fn from_delivery(delivery: &Delivery, allocation_key: Option<String>) -> Self {
        Self {
            id: delivery.id.clone(),
            driver_id: delivery.driver_id.clone(),
            driver_name: delivery.driver_name.clone(),
            truck_plate: delivery.truck_plate.clone(),
            tonnage_loaded: delivery.tonnage_loaded,
            tonnage_delivered: delivery.tonnage_delivered,
            delivered_at: delivery.delivered_at,
            allocation_key,
        }
    }
}

/// On-disk snapshot: the hierarchy plus an optional pre-joined delivery list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    #[serde(deserialize_with = "coalesce_vec")]
    pub regions: Vec<Region>,
    pub deliveries: Option<Vec<DeliveryRecord>>,
}

impl Snapshot {
    pub fn into_parts(self) -> (Hierarchy, Vec<DeliveryRecord>) {
        let hierarchy = Hierarchy::new(self.regions);
        let deliveries = match self.deliveries {
            Some(rows) => rows,
            None => hierarchy.flatten_deliveries(),
        };
        (hierarchy, deliveries)
    }
}

/// Coalesce a tonnage value: missing, `null`, non-finite and negative become `0.0`.
pub fn coalesce(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Any JSON value where a scalar is expected; anything else is kept as `Other`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
    Other(IgnoredAny),
}

impl Scalar {
    fn into_text(self) -> Option<String> {
        match self {
            Scalar::Number(n) => Some(n.to_string()),
            Scalar::Text(s) => Some(s),
            Scalar::Other(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Other(IgnoredAny),
}

fn coalesce_tonnage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(coalesce(value.and_then(|v| v.as_f64())))
}

fn coalesce_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn coalesce_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coalesce_opt_string(deserializer)?.unwrap_or_default())
}

/// Strings pass through, numbers (relational ids) are stringified.
fn coalesce_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(Scalar::into_text))
}

fn coalesce_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(
        Option::<Flag>::deserialize(deserializer)?,
        Some(Flag::Bool(true))
    ))
}

/// RFC 3339 timestamps; anything unparseable is treated as undated.
fn coalesce_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(|v| match v {
        Scalar::Text(s) => s.parse::<DateTime<Utc>>().ok(),
        _ => None,
    }))
}
