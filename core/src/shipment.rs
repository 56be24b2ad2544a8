//! Shipment records and their embedded progress history.

use crate::{
    error::{DeskError, DeskResult},
    fields::{required, Field, Fields},
    types::{text_enum, RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    ShipmentStatus {
        Pending        => "Pending",
        InTransit      => "In Transit",
        OutForDelivery => "Out for Delivery",
        Delivered      => "Delivered",
        Exception      => "Exception",
        OnHold         => "On Hold",
        Returned       => "Returned",
    }
}

impl Default for ShipmentStatus {
    fn default() -> Self {
        ShipmentStatus::InTransit
    }
}

text_enum! {
    CustomsStatus {
        Cleared     => "Cleared",
        OnHold      => "On Hold",
        Pending     => "Pending",
        UnderReview => "Under Review",
        Rejected    => "Rejected",
    }
}

impl Default for CustomsStatus {
    fn default() -> Self {
        CustomsStatus::OnHold
    }
}

text_enum! {
    PackageType {
        Package  => "Package",
        Envelope => "Envelope",
        Pallet   => "Pallet",
        Freight  => "Freight",
    }
}

impl Default for PackageType {
    fn default() -> Self {
        PackageType::Package
    }
}

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DIMENSION_UNIT: &str = "inches";

/// One milestone in a shipment's delivery history. Steps are embedded in
/// order and have no identity of their own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProgressStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub completed: bool,
}

impl ProgressStep {
    fn from_fields(fields: &Fields) -> DeskResult<Self> {
        let mut step = ProgressStep::default();
        if let Field::Set(v) = fields.string("title")? {
            step.title = v;
        }
        if let Field::Set(v) = fields.string("description")? {
            step.description = v;
        }
        if let Field::Set(v) = fields.string("location")? {
            step.location = v;
        }
        fields.date("timestamp")?.merge_into(&mut step.timestamp);
        if let Field::Set(v) = fields.boolean("completed")? {
            step.completed = v;
        }
        Ok(step)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageDimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    DEFAULT_DIMENSION_UNIT.to_string()
}

impl Default for PackageDimensions {
    fn default() -> Self {
        Self {
            length: None,
            width: None,
            height: None,
            unit: default_unit(),
        }
    }
}

impl PackageDimensions {
    fn merge(&mut self, fields: &Fields) -> DeskResult<()> {
        fields.number("length")?.merge_into(&mut self.length);
        fields.number("width")?.merge_into(&mut self.width);
        fields.number("height")?.merge_into(&mut self.height);
        match fields.string("unit")? {
            Field::Set(unit) => self.unit = unit,
            Field::Null => self.unit = default_unit(),
            Field::Missing => {}
        }
        Ok(())
    }
}

/// Contact, package and delivery details. None of these are required and
/// none feed any rule; they are carried as submitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShipmentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_weight: Option<f64>,
    #[serde(default)]
    pub package_dimensions: PackageDimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<String>,
    #[serde(
        rename = "outDelivered_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub out_delivered_at: Option<String>,
}

impl ShipmentDetails {
    fn merge(&mut self, fields: &Fields) -> DeskResult<()> {
        fields.string("recipient_name")?.merge_into(&mut self.recipient_name);
        fields.string("recipient_phone")?.merge_into(&mut self.recipient_phone);
        fields.string("recipient_email")?.merge_into(&mut self.recipient_email);
        fields.string("sender_name")?.merge_into(&mut self.sender_name);
        fields.string("sender_phone")?.merge_into(&mut self.sender_phone);
        fields.string("sender_email")?.merge_into(&mut self.sender_email);
        fields.number("package_weight")?.merge_into(&mut self.package_weight);
        match fields.object("package_dimensions")? {
            Field::Set(dims) => self.package_dimensions.merge(&dims)?,
            Field::Null => self.package_dimensions = PackageDimensions::default(),
            Field::Missing => {}
        }
        fields.date("shipping_date")?.merge_into(&mut self.shipping_date);
        fields.date("delivery_date")?.merge_into(&mut self.delivery_date);
        fields.string("delivery_signature")?.merge_into(&mut self.delivery_signature);
        fields.string("delivery_notes")?.merge_into(&mut self.delivery_notes);
        fields.number("insurance_value")?.merge_into(&mut self.insurance_value);
        fields.number("declared_value")?.merge_into(&mut self.declared_value);
        fields
            .string("special_instructions")?
            .merge_into(&mut self.special_instructions);
        fields.date("last_update")?.merge_into(&mut self.last_update);
        fields.string("delivered_at")?.merge_into(&mut self.delivered_at);
        fields.string("outDelivered_at")?.merge_into(&mut self.out_delivered_at);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shipment {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub tracking_id: String,
    pub service_type: String,
    pub origin: String,
    pub destination: String,
    pub estimated_delivery: Timestamp,
    pub shipment_value: f64,
    pub current_location: String,
    #[serde(default)]
    pub customs_status: CustomsStatus,
    #[serde(default)]
    pub status: ShipmentStatus,
    #[serde(default)]
    pub progress: Vec<ProgressStep>,
    #[serde(default)]
    pub package_type: PackageType,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub delivery_attempts: i64,
    #[serde(flatten)]
    pub details: ShipmentDetails,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Bumped on every write; guards read-path repairs against lost updates.
    #[serde(skip)]
    pub revision: i64,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Default)]
struct ShipmentDraft {
    tracking_id: Option<String>,
    service_type: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    estimated_delivery: Option<Timestamp>,
    shipment_value: Option<f64>,
    current_location: Option<String>,
    customs_status: Option<CustomsStatus>,
    status: Option<ShipmentStatus>,
    progress: Vec<ProgressStep>,
    package_type: Option<PackageType>,
    currency: Option<String>,
    delivery_attempts: Option<i64>,
    details: ShipmentDetails,
}

impl ShipmentDraft {
    fn merge(&mut self, fields: &Fields) -> DeskResult<()> {
        fields.string("tracking_id")?.merge_into(&mut self.tracking_id);
        fields.string("service_type")?.merge_into(&mut self.service_type);
        fields.string("origin")?.merge_into(&mut self.origin);
        fields.string("destination")?.merge_into(&mut self.destination);
        fields
            .date("estimated_delivery")?
            .merge_into(&mut self.estimated_delivery);
        fields.number("shipment_value")?.merge_into(&mut self.shipment_value);
        fields
            .string("current_location")?
            .merge_into(&mut self.current_location);
        fields.choice("customs_status")?.merge_into(&mut self.customs_status);
        fields.choice("status")?.merge_into(&mut self.status);
        match fields.object_list("progress")? {
            Field::Set(steps) => {
                self.progress = steps
                    .iter()
                    .map(ProgressStep::from_fields)
                    .collect::<DeskResult<_>>()?;
            }
            Field::Null => self.progress.clear(),
            Field::Missing => {}
        }
        fields.choice("package_type")?.merge_into(&mut self.package_type);
        fields.string("currency")?.merge_into(&mut self.currency);
        fields
            .integer("delivery_attempts")?
            .merge_into(&mut self.delivery_attempts);
        self.details.merge(fields)
    }

    fn finish(
        self,
        id: RecordId,
        created_at: Timestamp,
        updated_at: Timestamp,
        revision: i64,
    ) -> DeskResult<Shipment> {
        let mut missing = Vec::new();
        let tracking_id = required(self.tracking_id, "tracking_id", &mut missing);
        let service_type = required(self.service_type, "service_type", &mut missing);
        let origin = required(self.origin, "origin", &mut missing);
        let destination = required(self.destination, "destination", &mut missing);
        if self.estimated_delivery.is_none() {
            missing.push("estimated_delivery");
        }
        if self.shipment_value.is_none() {
            missing.push("shipment_value");
        }
        let current_location = required(self.current_location, "current_location", &mut missing);

        let (
            Some(tracking_id),
            Some(service_type),
            Some(origin),
            Some(destination),
            Some(estimated_delivery),
            Some(shipment_value),
            Some(current_location),
        ) = (
            tracking_id,
            service_type,
            origin,
            destination,
            self.estimated_delivery,
            self.shipment_value,
            current_location,
        )
        else {
            return Err(DeskError::validation(format!(
                "Shipment validation failed: {} required",
                missing.join(", ")
            )));
        };

        Ok(Shipment {
            id,
            tracking_id,
            service_type,
            origin,
            destination,
            estimated_delivery,
            shipment_value,
            current_location,
            customs_status: self.customs_status.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            progress: self.progress,
            package_type: self.package_type.unwrap_or_default(),
            currency: self.currency.unwrap_or_else(default_currency),
            delivery_attempts: self.delivery_attempts.unwrap_or(0),
            details: self.details,
            created_at,
            updated_at,
            revision,
        })
    }
}

impl From<Shipment> for ShipmentDraft {
    fn from(s: Shipment) -> Self {
        Self {
            tracking_id: Some(s.tracking_id),
            service_type: Some(s.service_type),
            origin: Some(s.origin),
            destination: Some(s.destination),
            estimated_delivery: Some(s.estimated_delivery),
            shipment_value: Some(s.shipment_value),
            current_location: Some(s.current_location),
            customs_status: Some(s.customs_status),
            status: Some(s.status),
            progress: s.progress,
            package_type: Some(s.package_type),
            currency: Some(s.currency),
            delivery_attempts: Some(s.delivery_attempts),
            details: s.details,
        }
    }
}

impl Shipment {
    /// Build a new shipment from a submitted body. Progress is taken as
    /// submitted; the service adds the terminal step.
    pub fn from_fields(id: RecordId, fields: &Fields, now: Timestamp) -> DeskResult<Self> {
        let mut draft = ShipmentDraft::default();
        draft.merge(fields)?;
        draft.finish(id, now, now, 0)
    }

    /// Merge a partial body and re-validate. On error `self` is unchanged.
    pub fn apply(&mut self, fields: &Fields, now: Timestamp) -> DeskResult<()> {
        let mut draft = ShipmentDraft::from(self.clone());
        draft.merge(fields)?;
        *self = draft.finish(self.id.clone(), self.created_at, now, self.revision)?;
        Ok(())
    }
}
