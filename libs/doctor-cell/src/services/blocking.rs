// libs/doctor-cell/src/services/blocking.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthorizationContext;

use crate::grid;
use crate::models::{BatchBlockOutcome, BlockedSlot, BlockingError, FailedBlock};

/// Lets a doctor remove slots from future availability and restore them,
/// independent of any patient bookings.
pub struct SlotBlockingService {
    supabase: SupabaseClient,
}

impl SlotBlockingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Block one slot. Idempotent: an existing record for the same
    /// (doctor, date, slot) is returned unchanged instead of duplicated.
    pub async fn block_slot(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        reason: Option<&str>,
        auth_token: &str,
    ) -> Result<BlockedSlot, BlockingError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(BlockingError::Unauthorized);
        }

        if !grid::is_catalog_slot(time_slot) {
            return Err(BlockingError::ValidationError(format!(
                "Unknown time slot: {}",
                time_slot
            )));
        }

        if let Some(existing) = self
            .find_blocked(doctor_id, date, time_slot, auth_token)
            .await?
        {
            debug!(
                "Slot {} on {} already blocked for doctor {}, returning existing record",
                time_slot, date, doctor_id
            );
            return Ok(existing);
        }

        let block_data = json!({
            "doctor_id": doctor_id,
            "blocked_date": date,
            "time_slot": time_slot,
            "reason": reason,
            "created_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/blocked_slots",
                Some(auth_token),
                Some(block_data),
                Some(headers),
            )
            .await
            .map_err(|e| BlockingError::Store(e.to_string()))?;

        let created = result
            .into_iter()
            .next()
            .ok_or_else(|| BlockingError::Store("Store returned no blocked slot row".to_string()))?;

        let blocked: BlockedSlot =
            serde_json::from_value(created).map_err(|e| BlockingError::Store(e.to_string()))?;

        debug!("Blocked slot {} on {} for doctor {}", time_slot, date, doctor_id);
        Ok(blocked)
    }

    /// Block several slots for one date. The store offers no transaction, so
    /// records are written one-by-one and the outcome reports exactly which
    /// slots succeeded and which failed.
    pub async fn block_slots(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        date: NaiveDate,
        slots: &[String],
        reason: Option<&str>,
        auth_token: &str,
    ) -> Result<BatchBlockOutcome, BlockingError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(BlockingError::Unauthorized);
        }

        if slots.is_empty() {
            return Err(BlockingError::ValidationError(
                "Select at least one time slot".to_string(),
            ));
        }

        let mut outcome = BatchBlockOutcome {
            blocked: Vec::new(),
            failed: Vec::new(),
        };

        for slot in slots {
            match self
                .block_slot(ctx, doctor_id, date, slot, reason, auth_token)
                .await
            {
                Ok(blocked) => outcome.blocked.push(blocked),
                Err(e) => {
                    warn!("Failed to block slot {} on {}: {}", slot, date, e);
                    outcome.failed.push(FailedBlock {
                        time_slot: slot.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Restore a slot by deleting its block record entirely. Unlike
    /// appointment cancellation this is a hard delete.
    pub async fn unblock_slot(
        &self,
        ctx: &AuthorizationContext,
        blocked_slot_id: Uuid,
        auth_token: &str,
    ) -> Result<(), BlockingError> {
        let record = self
            .get_blocked_slot(blocked_slot_id, auth_token)
            .await?
            .ok_or(BlockingError::NotFound)?;

        if !ctx.can_act_for_doctor(&record.doctor_id) {
            return Err(BlockingError::Unauthorized);
        }

        let path = format!("/rest/v1/blocked_slots?id=eq.{}", blocked_slot_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, Some(auth_token), None, Some(headers))
            .await
            .map_err(|e| BlockingError::Store(e.to_string()))?;

        debug!("Unblocked slot record {}", blocked_slot_id);
        Ok(())
    }

    /// All block records for a doctor, optionally narrowed to one date.
    /// Without a date filter the result is ordered by date ascending.
    pub async fn list_blocked_slots(
        &self,
        ctx: &AuthorizationContext,
        doctor_id: Uuid,
        date: Option<NaiveDate>,
        auth_token: &str,
    ) -> Result<Vec<BlockedSlot>, BlockingError> {
        if !ctx.can_act_for_doctor(&doctor_id) {
            return Err(BlockingError::Unauthorized);
        }

        let path = match date {
            Some(date) => format!(
                "/rest/v1/blocked_slots?doctor_id=eq.{}&blocked_date=eq.{}&order=time_slot.asc",
                doctor_id, date
            ),
            None => format!(
                "/rest/v1/blocked_slots?doctor_id=eq.{}&order=blocked_date.asc,time_slot.asc",
                doctor_id
            ),
        };

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlockingError::Store(e.to_string()))?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| BlockingError::Store(e.to_string())))
            .collect()
    }

    async fn find_blocked(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        auth_token: &str,
    ) -> Result<Option<BlockedSlot>, BlockingError> {
        let path = format!(
            "/rest/v1/blocked_slots?doctor_id=eq.{}&blocked_date=eq.{}&time_slot=eq.{}",
            doctor_id,
            date,
            urlencoding::encode(time_slot)
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlockingError::Store(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(|e| BlockingError::Store(e.to_string())))
            .transpose()
    }

    async fn get_blocked_slot(
        &self,
        blocked_slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<BlockedSlot>, BlockingError> {
        let path = format!("/rest/v1/blocked_slots?id=eq.{}", blocked_slot_id);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| BlockingError::Store(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).map_err(|e| BlockingError::Store(e.to_string())))
            .transpose()
    }
}
