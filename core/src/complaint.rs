//! Complaint records: scam reports filed by victims.
//!
//! A complaint is created on submission, mutated only through an explicit
//! update, and deleted explicitly. Nothing touches it in the background.

use crate::{
    error::{DeskError, DeskResult},
    fields::{required, Fields},
    types::{text_enum, RecordId, Timestamp},
};
use serde::{Deserialize, Serialize};

text_enum! {
    ScamType {
        Crypto      => "crypto",
        Transaction => "transaction",
        GiftCard    => "gift_card",
        Other       => "other",
    }
}

text_enum! {
    ComplaintStatus {
        Pending  => "pending",
        InReview => "in_review",
        Resolved => "resolved",
        Closed   => "closed",
    }
}

impl Default for ComplaintStatus {
    fn default() -> Self {
        ComplaintStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub scam_type: ScamType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_lost: Option<f64>,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

/// Every complaint field as optional, so create and update share one
/// merge-then-validate path.
#[derive(Debug, Clone, Default)]
struct ComplaintDraft {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    country: Option<String>,
    currency: Option<String>,
    scam_type: Option<ScamType>,
    description: Option<String>,
    amount_lost: Option<f64>,
    status: Option<ComplaintStatus>,
    admin_notes: Option<String>,
}

impl ComplaintDraft {
    fn merge(&mut self, fields: &Fields) -> DeskResult<()> {
        fields.string("name")?.merge_into(&mut self.name);
        fields.string("email")?.merge_into(&mut self.email);
        fields.string("phone")?.merge_into(&mut self.phone);
        fields.string("country")?.merge_into(&mut self.country);
        fields.string("currency")?.merge_into(&mut self.currency);
        fields.choice("scam_type")?.merge_into(&mut self.scam_type);
        fields.string("description")?.merge_into(&mut self.description);
        fields.number("amount_lost")?.merge_into(&mut self.amount_lost);
        fields.choice("status")?.merge_into(&mut self.status);
        fields.string("admin_notes")?.merge_into(&mut self.admin_notes);
        Ok(())
    }

    fn finish(
        self,
        id: RecordId,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> DeskResult<Complaint> {
        let mut missing = Vec::new();
        let name = required(self.name, "name", &mut missing);
        let email = required(self.email, "email", &mut missing);
        let description = required(self.description, "description", &mut missing);
        if self.scam_type.is_none() {
            missing.push("scam_type");
        }
        let (Some(name), Some(email), Some(description), Some(scam_type)) =
            (name, email, description, self.scam_type)
        else {
            return Err(DeskError::validation(format!(
                "Complaint validation failed: {} required",
                missing.join(", ")
            )));
        };

        Ok(Complaint {
            id,
            name,
            email,
            phone: self.phone,
            country: self.country,
            currency: self.currency,
            scam_type,
            description,
            amount_lost: self.amount_lost,
            status: self.status.unwrap_or_default(),
            admin_notes: self.admin_notes,
            created_at,
            updated_at,
        })
    }
}

impl From<Complaint> for ComplaintDraft {
    fn from(c: Complaint) -> Self {
        Self {
            name: Some(c.name),
            email: Some(c.email),
            phone: c.phone,
            country: c.country,
            currency: c.currency,
            scam_type: Some(c.scam_type),
            description: Some(c.description),
            amount_lost: c.amount_lost,
            status: Some(c.status),
            admin_notes: c.admin_notes,
        }
    }
}

impl Complaint {
    /// Build a new complaint from a submitted body.
    pub fn from_fields(id: RecordId, fields: &Fields, now: Timestamp) -> DeskResult<Self> {
        let mut draft = ComplaintDraft::default();
        draft.merge(fields)?;
        draft.finish(id, now, now)
    }

    /// Merge a partial body into this complaint and re-validate the result.
    /// On error `self` is left unchanged.
    pub fn apply(&mut self, fields: &Fields, now: Timestamp) -> DeskResult<()> {
        let mut draft = ComplaintDraft::from(self.clone());
        draft.merge(fields)?;
        *self = draft.finish(self.id.clone(), self.created_at, now)?;
        Ok(())
    }
}
