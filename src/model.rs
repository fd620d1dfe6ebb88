//! Data models for cargo placement.
//!
//! This module defines the value types the placement engine works on:
//! - `CargoItem`: an item to be loaded, with dimensions, weight and handling attributes
//! - `Position` / `Orientation`: where and how an item sits in the cargo volume
//! - `Container`: the cargo volume of one vehicle with its weight limit
//! - `Placement`: an item committed to a position and orientation
//!
//! Items and containers are validated on construction, so the placement logic only
//! ever sees fully specified, well-formed values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{BoundingBox, Dimensional, Vec3};

/// Validation error for item and container data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Invalid delivery stop: {0}")]
    InvalidDeliveryStop(String),
}

/// Validates a single dimension (must be positive and finite).
pub(crate) fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Validates an item weight (must be non-negative and finite).
fn validate_item_weight(value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must not be negative, got: {}",
            value
        )));
    }
    Ok(())
}

/// Validates a capacity (must be positive and finite).
pub(crate) fn validate_capacity(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Represents a cargo item to be loaded.
///
/// Fields are private so that every `CargoItem` in circulation has passed
/// validation. Use [`CargoItem::new`] for a plain item or [`CargoItem::builder`]
/// to set the optional handling attributes.
///
/// Dimensions are in cm, weights in kg.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CargoItem {
    id: String,
    length: f64,
    width: f64,
    height: f64,
    weight: f64,
    value: f64,
    is_dangerous: bool,
    segregation_group: String,
    un_number: Option<String>,
    min_separation: f64,
    delivery_stop: u32,
    stackable: bool,
    max_stack_weight: f64,
}

impl CargoItem {
    /// Creates a new item with default handling attributes.
    ///
    /// # Parameters
    /// * `id` - Identifier of the item
    /// * `dims` - Dimensions (length, width, height)
    /// * `weight` - Weight in kg
    ///
    /// # Returns
    /// `Ok(CargoItem)` for valid values, otherwise `Err(ValidationError)`
    ///
    /// # Examples
    /// ```
    /// use load_planner::model::CargoItem;
    ///
    /// let item = CargoItem::new("pallet-1", (120.0, 80.0, 100.0), 250.0);
    /// assert!(item.is_ok());
    ///
    /// let invalid = CargoItem::new("pallet-2", (-120.0, 80.0, 100.0), 250.0);
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        dims: (f64, f64, f64),
        weight: f64,
    ) -> Result<Self, ValidationError> {
        Self::builder(id, dims, weight).build()
    }

    /// Starts a builder for an item with optional attributes.
    pub fn builder(id: impl Into<String>, dims: (f64, f64, f64), weight: f64) -> CargoItemBuilder {
        CargoItemBuilder {
            item: CargoItem {
                id: id.into(),
                length: dims.0,
                width: dims.1,
                height: dims.2,
                weight,
                value: 0.0,
                is_dangerous: false,
                segregation_group: String::new(),
                un_number: None,
                min_separation: 0.0,
                delivery_stop: 1,
                stackable: true,
                max_stack_weight: f64::INFINITY,
            },
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, "Length")?;
        validate_dimension(self.width, "Width")?;
        validate_dimension(self.height, "Height")?;
        validate_item_weight(self.weight)?;
        if !self.value.is_finite() {
            return Err(ValidationError::InvalidValue(format!(
                "Value must be finite, got: {}",
                self.value
            )));
        }
        if self.delivery_stop == 0 {
            return Err(ValidationError::InvalidDeliveryStop(
                "Delivery stop index starts at 1".to_string(),
            ));
        }
        if self.max_stack_weight.is_nan() || self.max_stack_weight < 0.0 {
            return Err(ValidationError::InvalidWeight(format!(
                "Max stack weight must not be negative, got: {}",
                self.max_stack_weight
            )));
        }
        if self.min_separation < 0.0 || !self.min_separation.is_finite() {
            return Err(ValidationError::InvalidDimension(format!(
                "Minimum separation must not be negative, got: {}",
                self.min_separation
            )));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Declared revenue value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_dangerous(&self) -> bool {
        self.is_dangerous
    }

    /// Segregation group label; empty for non-DG items.
    pub fn segregation_group(&self) -> &str {
        &self.segregation_group
    }

    pub fn un_number(&self) -> Option<&str> {
        self.un_number.as_deref()
    }

    /// Minimum distance (cm) this item must keep from other dangerous goods.
    pub fn min_separation(&self) -> f64 {
        self.min_separation
    }

    pub fn delivery_stop(&self) -> u32 {
        self.delivery_stop
    }

    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    /// Maximum weight (kg) this item can carry on top of itself.
    pub fn max_stack_weight(&self) -> f64 {
        self.max_stack_weight
    }

    /// Weight this item contributes as support to items stacked above it.
    ///
    /// This is `min(max_stack_weight, weight)`, independent of how much of the
    /// footprint is actually covered.
    pub fn support_capacity(&self) -> f64 {
        self.max_stack_weight.min(self.weight)
    }

    /// Revenue value per unit of volume.
    pub fn value_density(&self) -> f64 {
        self.value / self.volume()
    }

    /// Whether length and width are equal, making a rotation pointless.
    pub fn has_square_footprint(&self, tolerance: f64) -> bool {
        (self.length - self.width).abs() <= tolerance
    }

    /// Human-readable label for reports: UN number for DG, otherwise the id.
    pub fn label(&self) -> &str {
        self.un_number.as_deref().unwrap_or(&self.id)
    }
}

impl Dimensional for CargoItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Builder for [`CargoItem`] (validates on `build`).
#[derive(Clone, Debug)]
pub struct CargoItemBuilder {
    item: CargoItem,
}

impl CargoItemBuilder {
    /// Sets the declared revenue value.
    pub fn value(mut self, value: f64) -> Self {
        self.item.value = value;
        self
    }

    /// Marks the item as dangerous goods.
    ///
    /// # Parameters
    /// * `segregation_group` - Segregation group code (may be empty)
    /// * `min_separation` - Minimum distance in cm from other dangerous goods
    pub fn dangerous_goods(
        mut self,
        segregation_group: impl Into<String>,
        min_separation: f64,
    ) -> Self {
        self.item.is_dangerous = true;
        self.item.segregation_group = segregation_group.into();
        self.item.min_separation = min_separation;
        self
    }

    pub fn un_number(mut self, un_number: impl Into<String>) -> Self {
        self.item.un_number = Some(un_number.into());
        self
    }

    pub fn delivery_stop(mut self, stop: u32) -> Self {
        self.item.delivery_stop = stop;
        self
    }

    pub fn stackable(mut self, stackable: bool) -> Self {
        self.item.stackable = stackable;
        self
    }

    pub fn max_stack_weight(mut self, max_stack_weight: f64) -> Self {
        self.item.max_stack_weight = max_stack_weight;
        self
    }

    /// Validates and returns the item.
    pub fn build(self) -> Result<CargoItem, ValidationError> {
        self.item.validate()?;
        Ok(self.item)
    }
}

/// Minimum corner of a placed item inside the container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The front-left floor corner of the container.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Whether two positions coincide on every axis within `tolerance`.
    #[inline]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }
}

impl From<Vec3> for Position {
    fn from(vec: Vec3) -> Self {
        Self::new(vec.x, vec.y, vec.z)
    }
}

/// Rotation about the vertical axis.
///
/// Cargo is handled upright only, so height never rotates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Unrotated,
    /// Turned 90° so that length and width are swapped.
    Rotated90,
}

impl Orientation {
    /// Effective (length, width, height) of `item` in this orientation.
    #[inline]
    pub fn effective_dims(self, item: &CargoItem) -> Vec3 {
        match self {
            Orientation::Unrotated => item.dimensions(),
            Orientation::Rotated90 => Vec3::new(item.width, item.length, item.height),
        }
    }
}

/// Cargo volume of a vehicle with its weight limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Container {
    length: f64,
    width: f64,
    height: f64,
    max_weight: f64,
}

impl Container {
    /// Creates a new container with validation.
    ///
    /// # Parameters
    /// * `dims` - Dimensions (length, width, height) in cm
    /// * `max_weight` - Maximum total weight in kg
    ///
    /// # Returns
    /// `Ok(Container)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(dims: (f64, f64, f64), max_weight: f64) -> Result<Self, ValidationError> {
        validate_dimension(dims.0, "Container length")?;
        validate_dimension(dims.1, "Container width")?;
        validate_dimension(dims.2, "Container height")?;
        validate_capacity(max_weight, "Container max weight")?;

        Ok(Self {
            length: dims.0,
            width: dims.1,
            height: dims.2,
            max_weight,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// The interior as a bounding box anchored at the origin.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(Vec3::zero(), self.dimensions())
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// An item committed to a position and orientation.
///
/// Placements are only created by the optimizer and never moved afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub item: CargoItem,
    pub position: Position,
    pub orientation: Orientation,
}

impl Placement {
    pub fn new(item: CargoItem, position: Position, orientation: Orientation) -> Self {
        Self {
            item,
            position,
            orientation,
        }
    }

    /// Dimensions after applying the orientation.
    #[inline]
    pub fn effective_dims(&self) -> Vec3 {
        self.orientation.effective_dims(&self.item)
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position.as_vec3(), self.effective_dims())
    }

    /// Z coordinate of the top surface.
    #[inline]
    pub fn top_z(&self) -> f64 {
        self.position.z + self.item.height
    }
}
