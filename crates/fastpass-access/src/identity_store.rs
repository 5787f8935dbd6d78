use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use fastpass_core::UserId;
use serde::Serialize;

use crate::identity_state_file::{
    IdentityStateDocument, IdentityStateFile, IDENTITY_STATE_SCHEMA_VERSION,
};

#[derive(Debug, Default)]
struct IdentityState {
    consented: BTreeSet<UserId>,
    submitted: BTreeSet<UserId>,
    /// Bumped on every transition; orders snapshots handed to the writer.
    generation: u64,
}

impl IdentityState {
    fn from_document(document: IdentityStateDocument) -> Self {
        Self {
            consented: document.consented_users.into_iter().collect(),
            submitted: document.submitted_users.into_iter().collect(),
            generation: 0,
        }
    }

    fn to_document(&self) -> IdentityStateDocument {
        IdentityStateDocument {
            schema_version: IDENTITY_STATE_SCHEMA_VERSION,
            consented_users: self.consented.iter().cloned().collect(),
            submitted_users: self.submitted.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentitySnapshot {
    pub consented_users: usize,
    pub submitted_users: usize,
    pub persistent: bool,
}

/// Sole owner of per-user consent and submission records.
///
/// Every mutation is a check-and-set under one lock, so two racing calls for
/// the same user never both observe "not yet set". Records only move from
/// absent to present.
///
/// The state file is written outside that lock. Writers serialize on a
/// separate persistence lock and skip any snapshot older than the last one
/// written, so lookups for other users never wait on disk I/O.
#[derive(Debug)]
pub struct IdentityStore {
    state: Mutex<IdentityState>,
    state_file: Option<IdentityStateFile>,
    /// Generation of the last snapshot written to `state_file`.
    persisted_generation: Mutex<u64>,
}

impl IdentityStore {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(IdentityState::default()),
            state_file: None,
            persisted_generation: Mutex::new(0),
        }
    }

    /// Loads records from `state_file` and persists later transitions to it.
    pub fn open(state_file: IdentityStateFile) -> Result<Self> {
        let document = state_file.load()?;
        let state = IdentityState::from_document(document);
        tracing::info!(
            path = %state_file.path().display(),
            consented_users = state.consented.len(),
            submitted_users = state.submitted.len(),
            "identity state loaded"
        );
        Ok(Self {
            state: Mutex::new(state),
            state_file: Some(state_file),
            persisted_generation: Mutex::new(0),
        })
    }

    pub fn has_consented(&self, id: &UserId) -> bool {
        self.lock_state().consented.contains(id)
    }

    /// Returns `true` only for the call that newly records consent.
    pub fn record_consent(&self, id: &UserId) -> bool {
        let pending = {
            let mut state = self.lock_state();
            if !state.consented.insert(id.clone()) {
                return false;
            }
            self.stage_snapshot(&mut state)
        };
        self.persist(pending, id, "consent");
        true
    }

    pub fn has_submitted(&self, id: &UserId) -> bool {
        self.lock_state().submitted.contains(id)
    }

    /// Returns `true` only for the call that moves the user from "not
    /// submitted" to "submitted"; every other caller gets `false`.
    pub fn try_record_submission(&self, id: &UserId) -> bool {
        let pending = {
            let mut state = self.lock_state();
            if !state.submitted.insert(id.clone()) {
                return false;
            }
            self.stage_snapshot(&mut state)
        };
        self.persist(pending, id, "submission");
        true
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        let state = self.lock_state();
        IdentitySnapshot {
            consented_users: state.consented.len(),
            submitted_users: state.submitted.len(),
            persistent: self.state_file.is_some(),
        }
    }

    // The sets are never left half-updated, so a poisoned lock still guards
    // consistent data.
    fn lock_state(&self) -> MutexGuard<'_, IdentityState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_persisted_generation(&self) -> MutexGuard<'_, u64> {
        self.persisted_generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Called with the state lock held, right after a transition.
    fn stage_snapshot(&self, state: &mut IdentityState) -> Option<PendingSnapshot> {
        state.generation = state.generation.saturating_add(1);
        self.state_file.as_ref()?;
        Some(PendingSnapshot {
            generation: state.generation,
            document: state.to_document(),
        })
    }

    fn persist(&self, pending: Option<PendingSnapshot>, id: &UserId, record: &'static str) {
        let (Some(state_file), Some(pending)) = (self.state_file.as_ref(), pending) else {
            return;
        };
        let mut persisted_generation = self.lock_persisted_generation();
        if pending.generation <= *persisted_generation {
            tracing::debug!(
                user_id = %id,
                record,
                generation = pending.generation,
                "newer identity snapshot already persisted"
            );
            return;
        }
        match state_file.save(&pending.document) {
            Ok(()) => *persisted_generation = pending.generation,
            Err(error) => tracing::warn!(
                user_id = %id,
                record,
                path = %state_file.path().display(),
                error = %format!("{error:#}"),
                "failed to persist identity state; keeping in-memory record"
            ),
        }
    }
}

#[derive(Debug)]
struct PendingSnapshot {
    generation: u64,
    document: IdentityStateDocument,
}
