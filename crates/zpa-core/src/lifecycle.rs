// ── Resource lifecycle ──
//
// Drives create/read/update/delete/import for any `Resource` against any
// `Remote`. Every call returns what it could establish about the record
// together with the diagnostics gathered on the way; nothing panics and
// nothing is retried here (the transport already retries).

use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::diag::{Diagnostics, Operation};
use crate::error::CoreError;
use crate::mapper::{Mapper, Phase};
use crate::remote::Remote;
use crate::resources::Resource;

/// What a lifecycle call established about the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The record exists; this is its current state.
    Present(T),
    /// The record does not exist (any more). Drop it from state.
    Removed,
    /// The call failed. State is unchanged; see the diagnostics.
    Failed,
}

impl<T> Outcome<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Self::Present(state) => Some(state),
            Self::Removed | Self::Failed => None,
        }
    }
}

pub type Reconciled<T> = (Outcome<T>, Diagnostics);

/// Lifecycle driver for one resource type.
///
/// Cheap to clone when `R` is; each call scopes the remote handle to the
/// record's microtenant, or to the default one when the record names none.
#[derive(Debug)]
pub struct ResourceService<M, R> {
    remote: R,
    default_microtenant: Option<String>,
    _resource: PhantomData<fn() -> M>,
}

impl<M, R: Clone> Clone for ResourceService<M, R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            default_microtenant: self.default_microtenant.clone(),
            _resource: PhantomData,
        }
    }
}

impl<M: Resource, R: Remote> ResourceService<M, R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            default_microtenant: None,
            _resource: PhantomData,
        }
    }

    pub fn with_default_microtenant(mut self, microtenant_id: Option<String>) -> Self {
        self.default_microtenant = microtenant_id.filter(|m| !m.trim().is_empty());
        self
    }

    fn scope(&self, declared: Option<&M::Declared>) -> R {
        let microtenant = declared
            .and_then(M::microtenant)
            .or(self.default_microtenant.as_deref());
        self.remote.scoped(microtenant)
    }

    /// Fetch `id` and flatten it against `plan`.
    async fn refresh(
        remote: &R,
        id: &str,
        operation: Operation,
        plan: Option<&M::Declared>,
    ) -> Reconciled<M::Declared> {
        let mut diags = Diagnostics::new();
        match M::fetch(remote, id).await {
            Ok(current) => {
                let (state, flattened) = M::flatten(&current, plan);
                diags.append(flattened);
                (Outcome::Present(state), diags)
            }
            Err(e) => {
                let err = CoreError::from(e);
                diags.add_client_error(operation, M::KIND, id, &err);
                if err.is_not_found() {
                    (Outcome::Removed, diags)
                } else {
                    (Outcome::Failed, diags)
                }
            }
        }
    }

    /// Validate, expand and create, then read the record back.
    pub async fn create(&self, declared: &M::Declared) -> Reconciled<M::Declared> {
        let (body, mut diags) = M::expand(declared, None);
        if diags.has_error() {
            return (Outcome::Failed, diags);
        }

        let remote = self.scope(Some(declared));
        let created = match M::create(&remote, &body).await {
            Ok(created) => created,
            Err(e) => {
                diags.add_client_error(Operation::Create, M::KIND, "", &CoreError::from(e));
                return (Outcome::Failed, diags);
            }
        };
        let id = M::remote_id(&created).to_owned();
        info!(kind = %M::KIND, id = %id, "created");

        diags.append(M::after_write(&remote, &id, declared).await);

        let (outcome, read) = Self::refresh(&remote, &id, Operation::Read, Some(declared)).await;
        diags.append(read);
        match outcome {
            // Gone right after creation: report it, keep nothing.
            Outcome::Removed => (Outcome::Failed, diags),
            outcome => (outcome, diags),
        }
    }

    /// Refresh a stored record. A missing record comes back as `Removed`
    /// with a warning.
    pub async fn read(&self, state: &M::Declared) -> Reconciled<M::Declared> {
        let mut diags = Diagnostics::new();
        let Some(id) = M::declared_id(state) else {
            diags.add_validation("id must be known to read a resource");
            return (Outcome::Failed, diags);
        };

        let remote = self.scope(Some(state));
        let (outcome, read) = Self::refresh(&remote, id, Operation::Read, Some(state)).await;
        diags.append(read);
        if matches!(outcome, Outcome::Removed) {
            warn!(kind = %M::KIND, id, "not found, dropping from state");
            diags.downgrade_not_found();
        }
        (outcome, diags)
    }

    /// Apply a changed declaration to an existing record.
    pub async fn update(&self, declared: &M::Declared) -> Reconciled<M::Declared> {
        let mut diags = Diagnostics::new();
        let Some(id) = M::declared_id(declared) else {
            diags.add_validation("id must be known to update a resource");
            return (Outcome::Failed, diags);
        };

        diags.append(M::validate(declared, Phase::Update));
        if diags.has_error() {
            return (Outcome::Failed, diags);
        }

        let remote = self.scope(Some(declared));
        let prior = match M::fetch(&remote, id).await {
            Ok(prior) => prior,
            Err(e) => {
                let err = CoreError::from(e);
                diags.add_client_error(Operation::Read, M::KIND, id, &err);
                if err.is_not_found() {
                    warn!(kind = %M::KIND, id, "not found before update, dropping from state");
                    diags.downgrade_not_found();
                    return (Outcome::Removed, diags);
                }
                return (Outcome::Failed, diags);
            }
        };

        // Validation already ran above and passed; only expansion
        // findings remain.
        let (body, expanded) = M::expand(declared, Some(&prior));
        diags.append(expanded);
        if diags.has_error() {
            return (Outcome::Failed, diags);
        }

        if let Err(e) = M::update(&remote, id, &body).await {
            diags.add_client_error(Operation::Update, M::KIND, id, &CoreError::from(e));
            return (Outcome::Failed, diags);
        }
        info!(kind = %M::KIND, id, "updated");

        diags.append(M::after_write(&remote, id, declared).await);

        let (outcome, read) = Self::refresh(&remote, id, Operation::Read, Some(declared)).await;
        diags.append(read);
        match outcome {
            Outcome::Removed => (Outcome::Failed, diags),
            outcome => (outcome, diags),
        }
    }

    /// Detach the record from whatever references it, then delete it.
    ///
    /// A record that is already gone counts as deleted.
    pub async fn delete(&self, state: &M::Declared) -> Reconciled<M::Declared> {
        let mut diags = Diagnostics::new();
        let Some(id) = M::declared_id(state) else {
            diags.add_validation("id must be known to delete a resource");
            return (Outcome::Failed, diags);
        };

        let remote = self.scope(Some(state));
        diags.append(M::before_delete(&remote, id, state).await);
        if diags.has_error() {
            warn!(kind = %M::KIND, id, "detachment failed, delete cancelled");
            return (Outcome::Failed, diags);
        }

        match M::delete(&remote, id).await {
            Ok(()) => {
                info!(kind = %M::KIND, id, "deleted");
                (Outcome::Removed, diags)
            }
            Err(e) => {
                let err = CoreError::from(e);
                if err.is_not_found() {
                    debug!(kind = %M::KIND, id, "already gone");
                    return (Outcome::Removed, diags);
                }
                diags.add_client_error(Operation::Delete, M::KIND, id, &err);
                (Outcome::Failed, diags)
            }
        }
    }

    /// Adopt an existing record. All-digit input is an id, anything else
    /// a name.
    pub async fn import(&self, id_or_name: &str) -> Reconciled<M::Declared> {
        let mut diags = Diagnostics::new();
        let key = id_or_name.trim();
        if key.is_empty() {
            diags.add_validation("an id or name is required to import a resource");
            return (Outcome::Failed, diags);
        }

        let remote = self.scope(None);
        let fetched = if key.bytes().all(|b| b.is_ascii_digit()) {
            M::fetch(&remote, key).await
        } else {
            M::fetch_by_name(&remote, key).await
        };
        match fetched {
            Ok(current) => {
                info!(kind = %M::KIND, id = M::remote_id(&current), "imported");
                let (state, flattened) = M::flatten(&current, None);
                diags.append(flattened);
                (Outcome::Present(state), diags)
            }
            Err(e) => {
                diags.add_client_error(Operation::Import, M::KIND, key, &CoreError::from(e));
                (Outcome::Failed, diags)
            }
        }
    }
}
