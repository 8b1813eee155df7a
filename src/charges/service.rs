//! Charge lifecycle: create, read, customize, confirm, delete and sweep.

use super::config::{ChargesConfig, ReconfirmPolicy};
use super::types::{
    API_CLIENT_ID, ChargeStatus, ConfirmAction, Confirmation, NewCharge, Origin, RecurringCharge,
    StoredCharge, decorate_return_url,
};
use crate::error::{MockError, Result};
use crate::traits::store::{ChargeStore, ChargeStoreExt, StoreOp};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

const RECORD_PREFIX: &str = "recurring_application_charge:";
const INDEX_KEY: &str = "recurring_application_charges_ids";
const STORE_ALIAS_PREFIX: &str = "recurring_application_charge_by_store:";

/// Key layout for persisted charges.
#[derive(Debug, Clone, Default)]
pub struct ChargeKeys {
    prefix: String,
}

impl ChargeKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `recurring_application_charge:{id}`
    pub fn record(&self, id: i64) -> String {
        format!("{}{}{}", self.prefix, RECORD_PREFIX, id)
    }

    /// The list every charge key is appended to.
    pub fn index(&self) -> String {
        format!("{}{}", self.prefix, INDEX_KEY)
    }

    /// Points at the record key of the store's most recent charge.
    pub fn store_alias(&self, store: &str) -> String {
        format!("{}{}{}", self.prefix, STORE_ALIAS_PREFIX, store)
    }
}

/// Hands out strictly increasing ids based on the wall clock in microseconds.
#[derive(Debug, Default)]
struct IdAllocator {
    last: AtomicI64,
}

impl IdAllocator {
    fn next(&self) -> i64 {
        let now = Utc::now().timestamp_micros();
        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(previous) | Err(previous) => previous,
        };
        now.max(previous + 1)
    }
}

/// Result of one sweep over the charge index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Index entries looked at
    pub scanned: usize,
    /// Expired charges removed
    pub evicted: usize,
    /// Index entries whose record was already gone
    pub pruned: usize,
    /// Entries left alone because they couldn't be read or removed
    pub skipped: usize,
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| MockError::internal(format!("Failed to encode: {}", e)))
}

fn not_found(id: i64) -> MockError {
    MockError::not_found(format!("recurring_application_charge {}", id))
}

/// The charge lifecycle engine.
///
/// Cheap to clone; clones share the store and the id allocator.
#[derive(Clone)]
pub struct ChargeService {
    store: Arc<dyn ChargeStore>,
    keys: ChargeKeys,
    config: ChargesConfig,
    ids: Arc<IdAllocator>,
}

impl ChargeService {
    pub fn new(store: Arc<dyn ChargeStore>, config: ChargesConfig) -> Self {
        Self {
            store,
            keys: ChargeKeys::default(),
            config,
            ids: Arc::new(IdAllocator::default()),
        }
    }

    /// Namespace every key with `prefix`.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.keys = ChargeKeys::new(prefix);
        self
    }

    pub fn store(&self) -> &Arc<dyn ChargeStore> {
        &self.store
    }

    pub fn keys(&self) -> &ChargeKeys {
        &self.keys
    }

    /// Create a pending charge owned by `store`.
    pub async fn create(
        &self,
        store: Option<&str>,
        origin: &Origin,
        input: NewCharge,
    ) -> Result<RecurringCharge> {
        let price = input.validate()?;
        let created_at = now();
        let trial_days = input.trial_days.unwrap_or(0);
        let trial_ends_on = chrono::Duration::try_days(i64::from(trial_days))
            .and_then(|trial| created_at.checked_add_signed(trial))
            .ok_or_else(|| MockError::invalid_field("trial_days", "is too large"))?;
        let id = self.ids.next();

        let charge = RecurringCharge {
            id,
            name: input.name,
            price,
            currency: input.currency.unwrap_or_else(|| "USD".to_string()),
            status: ChargeStatus::Pending,
            capped_amount: input
                .capped_amount
                .unwrap_or_else(|| self.config.default_capped_amount.clone()),
            confirmation_url: origin.confirmation_url(id),
            decorated_return_url: decorate_return_url(&input.return_url, id),
            return_url: input.return_url,
            terms: input.terms.unwrap_or_else(|| "Standard Terms".to_string()),
            trial_days,
            trial_ends_on,
            created_at,
            updated_at: created_at,
            activated_on: None,
            billing_on: None,
            cancelled_on: None,
            test: input.test,
            api_client_id: API_CLIENT_ID.to_string(),
            replacement_behavior: input.replacement_behavior,
        };
        let stored = StoredCharge {
            charge,
            store: store.map(str::to_string),
        };

        let key = self.keys.record(id);
        let mut ops = vec![
            StoreOp::Set {
                key: key.clone(),
                value: encode(&stored)?,
            },
            StoreOp::ListAppend {
                list: self.keys.index(),
                value: key.clone(),
            },
        ];
        if let Some(store) = store {
            ops.push(StoreOp::Set {
                key: self.keys.store_alias(store),
                value: encode(&key)?,
            });
        }
        self.store.apply(ops).await?;

        tracing::info!(charge_id = id, store = ?store, "Charge created");
        Ok(stored.charge)
    }

    /// Fetch one charge. A store scope hides other stores' charges.
    pub async fn get(&self, store: Option<&str>, id: i64) -> Result<RecurringCharge> {
        Ok(self.load(store, id).await?.charge)
    }

    /// All charges in creation order, filtered by owning store when scoped.
    ///
    /// Records that vanished, can't be read or can't be decoded are skipped.
    pub async fn list(&self, store: Option<&str>) -> Result<Vec<RecurringCharge>> {
        let keys = self.store.list_range(&self.keys.index(), 0, -1).await?;
        let mut charges = Vec::with_capacity(keys.len());

        for key in keys {
            let bytes = match self.store.get_bytes(&key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    tracing::warn!(key = %key, "Indexed charge is missing, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to read charge, skipping");
                    continue;
                }
            };
            match serde_json::from_slice::<StoredCharge>(&bytes) {
                Ok(stored) if stored.visible_to(store) => charges.push(stored.charge),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Unreadable charge, skipping");
                }
            }
        }

        Ok(charges)
    }

    /// Replace the capped amount of a charge.
    pub async fn update_capped_amount(
        &self,
        store: Option<&str>,
        id: i64,
        amount: String,
    ) -> Result<RecurringCharge> {
        if amount.trim().is_empty() {
            return Err(MockError::invalid_field("capped_amount", "can't be blank"));
        }

        let mut stored = self.load(store, id).await?;
        stored.charge.capped_amount = amount;
        stored.charge.updated_at = now();
        self.write_back(id, &stored).await?;

        tracing::info!(charge_id = id, capped_amount = %stored.charge.capped_amount, "Charge customized");
        Ok(stored.charge)
    }

    /// Remove a charge together with its index entry and store alias.
    pub async fn delete(&self, store: Option<&str>, id: i64) -> Result<()> {
        let stored = self.load(store, id).await?;
        let key = self.keys.record(id);
        let ops = self.removal_ops(&key, &stored).await?;
        self.store.apply(ops).await?;

        tracing::info!(charge_id = id, "Charge deleted");
        Ok(())
    }

    /// Apply the merchant's decision from the confirmation page.
    ///
    /// [`ConfirmAction::View`] never writes.
    pub async fn confirm(&self, id: i64, action: ConfirmAction) -> Result<Confirmation> {
        let mut stored = self.load(None, id).await?;

        let status = match action {
            ConfirmAction::View => return Ok(Confirmation::Pending(stored.charge)),
            ConfirmAction::Accept => ChargeStatus::Active,
            ConfirmAction::Decline => ChargeStatus::Declined,
        };

        let charge = &mut stored.charge;
        if charge.status.is_confirmed() && self.config.reconfirm == ReconfirmPolicy::Reject {
            return Err(MockError::conflict(format!(
                "Charge has already been {}",
                charge.status
            )));
        }

        let now = now();
        charge.status = status;
        charge.updated_at = now;
        if status == ChargeStatus::Active {
            charge.activated_on = Some(now);
            charge.billing_on = Some(charge.trial_ends_on);
        } else {
            charge.activated_on = None;
            charge.billing_on = None;
        }
        self.write_back(id, &stored).await?;

        tracing::info!(charge_id = id, status = %status, "Charge confirmed");
        Ok(Confirmation::Decided(stored.charge))
    }

    /// The charge a store created most recently, if it still exists.
    pub async fn current_for_store(&self, store: &str) -> Result<Option<RecurringCharge>> {
        let Some(key) = self
            .store
            .get_opt::<String>(&self.keys.store_alias(store))
            .await?
        else {
            return Ok(None);
        };

        let stored = self.store.get_opt::<StoredCharge>(&key).await?;
        if stored.is_none() {
            tracing::debug!(store = %store, key = %key, "Store alias points at a missing charge");
        }
        Ok(stored.map(|s| s.charge))
    }

    /// Evict every charge created more than `retention` before `now`.
    ///
    /// Failures on single records are logged and counted, never fatal.
    pub async fn sweep(&self, now: DateTime<Utc>, retention: chrono::Duration) -> Result<SweepReport> {
        let index = self.keys.index();
        let keys = self.store.list_range(&index, 0, -1).await?;
        let mut report = SweepReport::default();

        for key in keys {
            report.scanned += 1;

            let bytes = match self.store.get_bytes(&key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    match self.store.list_remove(&index, &key).await {
                        Ok(()) => report.pruned += 1,
                        Err(e) => {
                            tracing::warn!(key = %key, error = %e, "Failed to prune stale index entry");
                            report.skipped += 1;
                        }
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to read charge, skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            let stored = match serde_json::from_slice::<StoredCharge>(&bytes) {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Unreadable charge, skipping");
                    report.skipped += 1;
                    continue;
                }
            };

            if now - stored.charge.created_at <= retention {
                continue;
            }

            let result = match self.removal_ops(&key, &stored).await {
                Ok(ops) => self.store.apply(ops).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    tracing::debug!(charge_id = stored.charge.id, "Evicted expired charge");
                    report.evicted += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to evict charge");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    async fn load(&self, store: Option<&str>, id: i64) -> Result<StoredCharge> {
        match self.store.get_opt::<StoredCharge>(&self.keys.record(id)).await? {
            Some(stored) if stored.visible_to(store) => Ok(stored),
            _ => Err(not_found(id)),
        }
    }

    /// Overwrite an existing record; a charge deleted since it was loaded
    /// stays deleted.
    async fn write_back(&self, id: i64, stored: &StoredCharge) -> Result<()> {
        if self.store.replace(&self.keys.record(id), stored).await? {
            return Ok(());
        }
        tracing::debug!(charge_id = id, "Charge removed during update");
        Err(not_found(id))
    }

    /// Writes that remove a record, its index entry and, if it still points
    /// at this record, the owning store's alias.
    async fn removal_ops(&self, key: &str, stored: &StoredCharge) -> Result<Vec<StoreOp>> {
        let mut ops = vec![
            StoreOp::Delete {
                key: key.to_string(),
            },
            StoreOp::ListRemove {
                list: self.keys.index(),
                value: key.to_string(),
            },
        ];

        if let Some(owner) = &stored.store {
            let alias = self.keys.store_alias(owner);
            if self.store.get_opt::<String>(&alias).await?.as_deref() == Some(key) {
                ops.push(StoreOp::Delete { key: alias });
            }
        }

        Ok(ops)
    }
}
