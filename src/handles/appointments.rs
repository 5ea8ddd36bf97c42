//! Appointment workflow.
//!
//! A confirmed appointment ends in exactly one of arrived, overdue or
//! cancelled.

use super::Appointments;
use crate::error::Result;
use pitlane_core::{AppointmentStatus, Entity, EntityId};

impl Appointments {
    /// Customer showed up.
    pub async fn mark_arrived(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, AppointmentStatus::Arrived).await
    }

    /// Customer missed the slot.
    pub async fn mark_overdue(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, AppointmentStatus::Overdue).await
    }

    /// Cancel the appointment.
    pub async fn cancel(&self, id: impl Into<EntityId>) -> Result<Entity> {
        self.transition(id, AppointmentStatus::Cancelled).await
    }
}
