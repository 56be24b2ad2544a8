//! Complaint CRUD. Stateless apart from the store it was built with.

use crate::{
    clock::Clock,
    complaint::Complaint,
    error::{DeskError, DeskResult},
    fields::Fields,
    store::DeskStore,
    types::new_record_id,
};
use std::sync::Arc;

const ENTITY: &str = "Complaint";

#[derive(Clone)]
pub struct ComplaintService {
    store: Arc<DeskStore>,
    clock: Arc<dyn Clock>,
}

impl ComplaintService {
    pub fn new(store: Arc<DeskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn list(&self) -> DeskResult<Vec<Complaint>> {
        self.store.list_complaints()
    }

    pub fn get(&self, id: &str) -> DeskResult<Complaint> {
        self.store
            .get_complaint(id)?
            .ok_or(DeskError::NotFound { entity: ENTITY })
    }

    pub fn create(&self, fields: &Fields) -> DeskResult<Complaint> {
        let complaint = Complaint::from_fields(new_record_id(), fields, self.clock.now())?;
        self.store.insert_complaint(&complaint)?;
        log::info!(
            "complaint {} filed (scam_type={})",
            complaint.id,
            complaint.scam_type
        );
        Ok(complaint)
    }

    /// Last writer wins; there is no derived state to protect.
    pub fn update(&self, id: &str, fields: &Fields) -> DeskResult<Complaint> {
        let mut complaint = self.get(id)?;
        complaint.apply(fields, self.clock.now())?;
        if !self.store.update_complaint(&complaint)? {
            return Err(DeskError::NotFound { entity: ENTITY });
        }
        log::debug!("complaint {id} updated (status={})", complaint.status);
        Ok(complaint)
    }

    pub fn delete(&self, id: &str) -> DeskResult<()> {
        if !self.store.delete_complaint(id)? {
            return Err(DeskError::NotFound { entity: ENTITY });
        }
        log::info!("complaint {id} deleted");
        Ok(())
    }
}
