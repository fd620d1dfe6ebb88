//! External record shapes and their conversion into the placement model.
//!
//! Shipment and vehicle records arrive from upstream systems and may be
//! incomplete. Missing measurements are filled from a [`FallbackPolicy`] here,
//! so the placement engine only ever sees fully specified values.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InputError, PlanError};
use crate::model::{CargoItem, Container, validate_capacity};

/// Cubic centimetres per cubic metre.
pub const CM3_PER_M3: f64 = 1_000_000.0;

/// Defaults applied when a record leaves a value out.
///
/// Lengths in cm, weights in kg, volume in m³.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub item_dimension_cm: f64,
    pub item_weight_kg: f64,
    pub item_value: f64,
    pub delivery_stop: u32,
    pub max_stack_weight_kg: f64,
    pub vehicle_capacity_kg: f64,
    pub cargo_length_cm: f64,
    pub cargo_width_cm: f64,
    pub cargo_height_cm: f64,
    pub max_volume_m3: f64,
}

impl FallbackPolicy {
    pub const DEFAULT_ITEM_DIMENSION_CM: f64 = 100.0;
    pub const DEFAULT_ITEM_WEIGHT_KG: f64 = 10.0;
    pub const DEFAULT_ITEM_VALUE: f64 = 100.0;
    pub const DEFAULT_DELIVERY_STOP: u32 = 1;
    pub const DEFAULT_MAX_STACK_WEIGHT_KG: f64 = 1000.0;
    pub const DEFAULT_VEHICLE_CAPACITY_KG: f64 = 10_000.0;
    pub const DEFAULT_CARGO_LENGTH_CM: f64 = 1200.0;
    pub const DEFAULT_CARGO_WIDTH_CM: f64 = 250.0;
    pub const DEFAULT_CARGO_HEIGHT_CM: f64 = 280.0;
    pub const DEFAULT_MAX_VOLUME_M3: f64 = 50.0;
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            item_dimension_cm: Self::DEFAULT_ITEM_DIMENSION_CM,
            item_weight_kg: Self::DEFAULT_ITEM_WEIGHT_KG,
            item_value: Self::DEFAULT_ITEM_VALUE,
            delivery_stop: Self::DEFAULT_DELIVERY_STOP,
            max_stack_weight_kg: Self::DEFAULT_MAX_STACK_WEIGHT_KG,
            vehicle_capacity_kg: Self::DEFAULT_VEHICLE_CAPACITY_KG,
            cargo_length_cm: Self::DEFAULT_CARGO_LENGTH_CM,
            cargo_width_cm: Self::DEFAULT_CARGO_WIDTH_CM,
            cargo_height_cm: Self::DEFAULT_CARGO_HEIGHT_CM,
            max_volume_m3: Self::DEFAULT_MAX_VOLUME_M3,
        }
    }
}

/// Catalog entry describing one dangerous good.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DangerousGoodEntry {
    pub un_number: String,
    pub hazard_class: String,
    #[serde(default)]
    pub subsidiary_risks: Vec<String>,
    /// Minimum distance to any other dangerous good, in cm.
    #[serde(default)]
    pub min_separation_cm: f64,
    #[serde(default)]
    pub segregation_groups: Vec<String>,
}

impl DangerousGoodEntry {
    pub fn new(un_number: impl Into<String>, hazard_class: impl Into<String>) -> Self {
        Self {
            un_number: un_number.into(),
            hazard_class: hazard_class.into(),
            subsidiary_risks: Vec::new(),
            min_separation_cm: 0.0,
            segregation_groups: Vec::new(),
        }
    }

    pub fn with_subsidiary_risk(mut self, class: impl Into<String>) -> Self {
        self.subsidiary_risks.push(class.into());
        self
    }

    pub fn with_min_separation(mut self, cm: f64) -> Self {
        self.min_separation_cm = cm;
        self
    }

    pub fn with_segregation_group(mut self, group: impl Into<String>) -> Self {
        self.segregation_groups.push(group.into());
        self
    }

    /// Primary class followed by subsidiary risks, without duplicates.
    ///
    /// Explosive divisions such as `1.4S` also yield their bare class `1`.
    pub fn hazard_classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for raw in std::iter::once(&self.hazard_class).chain(&self.subsidiary_risks) {
            let class = raw.trim();
            if class.is_empty() {
                continue;
            }
            let mut push = |c: &str| {
                if !classes.iter().any(|existing| existing == c) {
                    classes.push(c.to_string());
                }
            };
            push(class);
            if class.starts_with("1.") {
                push("1");
            }
        }
        classes
    }

    /// The group used for the item's segregation label (first listed).
    pub fn primary_segregation_group(&self) -> &str {
        self.segregation_groups.first().map(String::as_str).unwrap_or("")
    }
}

/// One consignment item as delivered by the shipment system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsignmentRecord {
    pub id: String,
    #[serde(default)]
    pub length_cm: Option<f64>,
    #[serde(default)]
    pub width_cm: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub delivery_stop: Option<u32>,
    #[serde(default)]
    pub stackable: Option<bool>,
    #[serde(default)]
    pub max_stack_weight_kg: Option<f64>,
    #[serde(default)]
    pub is_dangerous_good: bool,
    #[serde(default)]
    pub dangerous_good: Option<DangerousGoodEntry>,
}

impl ConsignmentRecord {
    /// Weight used for capacity allocation before any geometry is known.
    pub fn effective_weight(&self, policy: &FallbackPolicy) -> f64 {
        self.weight_kg.unwrap_or(policy.item_weight_kg)
    }

    /// Converts the record into a validated [`CargoItem`].
    ///
    /// # Parameters
    /// * `shipment_stop` - Delivery stop of the owning shipment, used when the item has none
    /// * `policy` - Defaults for missing values
    ///
    /// # Returns
    /// `Err(PlanError::MissingDangerousGoodEntry)` for a DG item without a
    /// catalog entry, `Err(PlanError::InvalidInput)` for values that fail
    /// validation, otherwise the item.
    pub fn to_cargo_item(
        &self,
        shipment_stop: Option<u32>,
        policy: &FallbackPolicy,
    ) -> Result<CargoItem, PlanError> {
        let fallback = policy.item_dimension_cm;
        let dims = (
            self.length_cm.unwrap_or(fallback),
            self.width_cm.unwrap_or(fallback),
            self.height_cm.unwrap_or(fallback),
        );

        let mut builder = CargoItem::builder(self.id.clone(), dims, self.effective_weight(policy))
            .value(self.value.unwrap_or(policy.item_value))
            .delivery_stop(
                self.delivery_stop
                    .or(shipment_stop)
                    .unwrap_or(policy.delivery_stop),
            )
            .stackable(self.stackable.unwrap_or(true))
            .max_stack_weight(self.max_stack_weight_kg.unwrap_or(policy.max_stack_weight_kg));

        if self.is_dangerous_good {
            let entry = self.dangerous_good.as_ref().ok_or_else(|| {
                PlanError::MissingDangerousGoodEntry {
                    item_id: self.id.clone(),
                }
            })?;
            builder = builder
                .dangerous_goods(entry.primary_segregation_group(), entry.min_separation_cm)
                .un_number(entry.un_number.clone());
        }

        builder
            .build()
            .map_err(|err| PlanError::invalid_input(format!("consignment '{}'", self.id), err))
    }
}

/// A shipment: one customer consignment with one or more items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: String,
    /// Delivery stop for items that do not carry their own.
    #[serde(default)]
    pub delivery_stop: Option<u32>,
    #[serde(default)]
    pub items: Vec<ConsignmentRecord>,
}

impl ShipmentRecord {
    /// Sum of item weights, with missing weights taken from the policy.
    pub fn total_weight(&self, policy: &FallbackPolicy) -> f64 {
        self.items.iter().map(|item| item.effective_weight(policy)).sum()
    }
}

/// A vehicle as described by the fleet system.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub capacity_kg: Option<f64>,
    #[serde(default)]
    pub cargo_length_cm: Option<f64>,
    #[serde(default)]
    pub cargo_width_cm: Option<f64>,
    #[serde(default)]
    pub cargo_height_cm: Option<f64>,
    #[serde(default)]
    pub max_volume_m3: Option<f64>,
}

impl VehicleRecord {
    /// Capacity used when ranking vehicles; unknown capacity ranks last.
    pub fn ranking_capacity(&self) -> f64 {
        self.capacity_kg.unwrap_or(0.0)
    }

    /// Weight limit for allocation and placement.
    pub fn weight_limit(&self, policy: &FallbackPolicy) -> f64 {
        self.capacity_kg.unwrap_or(policy.vehicle_capacity_kg)
    }

    /// Validated volume capacity in m³.
    pub fn max_volume_m3(&self, policy: &FallbackPolicy) -> Result<f64, PlanError> {
        let volume = self.max_volume_m3.unwrap_or(policy.max_volume_m3);
        validate_capacity(volume, "Vehicle max volume")
            .map_err(|err| PlanError::invalid_input(format!("vehicle '{}'", self.id), err))?;
        Ok(volume)
    }

    /// Registration number if known, otherwise the id.
    pub fn label(&self) -> &str {
        self.registration_number.as_deref().unwrap_or(&self.id)
    }

    /// Builds the validated cargo volume of this vehicle.
    pub fn container(&self, policy: &FallbackPolicy) -> Result<Container, PlanError> {
        let dims = (
            self.cargo_length_cm.unwrap_or(policy.cargo_length_cm),
            self.cargo_width_cm.unwrap_or(policy.cargo_width_cm),
            self.cargo_height_cm.unwrap_or(policy.cargo_height_cm),
        );
        Container::new(dims, self.weight_limit(policy))
            .map_err(|err| PlanError::invalid_input(format!("vehicle '{}'", self.id), err))
    }
}

/// Input of one planning run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    #[serde(default)]
    pub shipments: Vec<ShipmentRecord>,
    #[serde(default)]
    pub vehicles: Vec<VehicleRecord>,
}

impl PlanningRequest {
    /// Parses a request from any JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InputError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads a request from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Ids of shipments that do not appear in `assigned`, in request order.
    pub fn unassigned_shipment_ids<'b>(
        &self,
        assigned: impl IntoIterator<Item = &'b str>,
    ) -> Vec<&str> {
        let assigned: HashSet<&str> = assigned.into_iter().collect();
        self.shipments
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| !assigned.contains(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_values_fall_back_to_policy() {
        let record = ConsignmentRecord {
            id: "C-1".to_string(),
            ..Default::default()
        };
        let item = record
            .to_cargo_item(None, &FallbackPolicy::default())
            .unwrap();

        assert_eq!(item.length(), 100.0);
        assert_eq!(item.width(), 100.0);
        assert_eq!(item.height(), 100.0);
        assert_eq!(item.weight(), 10.0);
        assert_eq!(item.value(), 100.0);
        assert_eq!(item.delivery_stop(), 1);
        assert_eq!(item.max_stack_weight(), 1000.0);
        assert!(item.is_stackable());
        assert!(!item.is_dangerous());
    }

    #[test]
    fn item_stop_wins_over_shipment_stop() {
        let policy = FallbackPolicy::default();
        let mut record = ConsignmentRecord {
            id: "C-1".to_string(),
            ..Default::default()
        };
        assert_eq!(record.to_cargo_item(Some(3), &policy).unwrap().delivery_stop(), 3);

        record.delivery_stop = Some(5);
        assert_eq!(record.to_cargo_item(Some(3), &policy).unwrap().delivery_stop(), 5);
    }

    #[test]
    fn dangerous_item_takes_catalog_attributes() {
        let record = ConsignmentRecord {
            id: "C-7".to_string(),
            is_dangerous_good: true,
            dangerous_good: Some(
                DangerousGoodEntry::new("UN1203", "3")
                    .with_min_separation(300.0)
                    .with_segregation_group("flammables"),
            ),
            ..Default::default()
        };
        let item = record
            .to_cargo_item(None, &FallbackPolicy::default())
            .unwrap();

        assert!(item.is_dangerous());
        assert_eq!(item.un_number(), Some("UN1203"));
        assert_eq!(item.min_separation(), 300.0);
        assert_eq!(item.segregation_group(), "flammables");
    }

    #[test]
    fn dangerous_item_without_entry_is_rejected() {
        let record = ConsignmentRecord {
            id: "C-9".to_string(),
            is_dangerous_good: true,
            ..Default::default()
        };
        let err = record
            .to_cargo_item(None, &FallbackPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::MissingDangerousGoodEntry {
                item_id: "C-9".to_string()
            }
        );
    }

    #[test]
    fn invalid_measurements_are_rejected_not_defaulted() {
        let record = ConsignmentRecord {
            id: "C-2".to_string(),
            length_cm: Some(-5.0),
            ..Default::default()
        };
        let err = record
            .to_cargo_item(None, &FallbackPolicy::default())
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn hazard_classes_include_subsidiary_risks_and_explosive_class() {
        let entry = DangerousGoodEntry::new("UN0336", "1.4S")
            .with_subsidiary_risk("6.1")
            .with_subsidiary_risk("1.4S");
        assert_eq!(entry.hazard_classes(), vec!["1.4S", "1", "6.1"]);
    }

    #[test]
    fn shipment_weight_uses_fallback_for_missing_weights() {
        let shipment = ShipmentRecord {
            id: "S-1".to_string(),
            delivery_stop: None,
            items: vec![
                ConsignmentRecord {
                    id: "a".to_string(),
                    weight_kg: Some(25.0),
                    ..Default::default()
                },
                ConsignmentRecord {
                    id: "b".to_string(),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(shipment.total_weight(&FallbackPolicy::default()), 35.0);
    }

    #[test]
    fn vehicle_defaults_and_validation() {
        let policy = FallbackPolicy::default();
        let vehicle = VehicleRecord {
            id: "V-1".to_string(),
            ..Default::default()
        };
        let container = vehicle.container(&policy).unwrap();
        assert_eq!(container.length(), 1200.0);
        assert_eq!(container.width(), 250.0);
        assert_eq!(container.height(), 280.0);
        assert_eq!(container.max_weight(), 10_000.0);
        assert_eq!(vehicle.ranking_capacity(), 0.0);
        assert_eq!(vehicle.max_volume_m3(&policy).unwrap(), 50.0);
        assert_eq!(vehicle.label(), "V-1");

        let broken = VehicleRecord {
            id: "V-2".to_string(),
            capacity_kg: Some(0.0),
            ..Default::default()
        };
        assert!(broken.container(&policy).is_err());

        let no_room = VehicleRecord {
            id: "V-3".to_string(),
            max_volume_m3: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(no_room.max_volume_m3(&policy).unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn request_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "shipments": [{{"id": "S-1", "items": [{{"id": "C-1", "weight_kg": 12.5}}]}}],
                "vehicles": [{{"id": "V-1", "capacity_kg": 3000}}]
            }}"#
        )
        .unwrap();

        let request = PlanningRequest::from_path(file.path()).unwrap();
        assert_eq!(request.shipments.len(), 1);
        assert_eq!(request.shipments[0].items[0].weight_kg, Some(12.5));
        assert_eq!(request.vehicles[0].capacity_kg, Some(3000.0));
    }

    #[test]
    fn missing_request_file_reports_path() {
        let err = PlanningRequest::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn unassigned_ids_preserve_request_order() {
        let request = PlanningRequest {
            shipments: ["S-1", "S-2", "S-3"]
                .iter()
                .map(|id| ShipmentRecord {
                    id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
            vehicles: Vec::new(),
        };
        assert_eq!(request.unassigned_shipment_ids(["S-2"]), vec!["S-1", "S-3"]);
    }
}
