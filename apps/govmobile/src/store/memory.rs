//! In-memory backend.
//!
//! Behaves like the hosted platform for the portal's purposes: users are
//! created on first login, ids and tokens are random, orders get a
//! `created_date` when stored. Unlike the platform it also refuses user
//! updates that would leave `remaining_budget > budget_allowance`.
//!
//! There is no credential store. A password sign-in must carry a non-empty
//! password, but any password is accepted for any e-mail. Sessions never
//! expire unless [`InMemoryStore::with_session_ttl`] sets a lifetime.

use super::{
    Credentials, DataStore, DeviceFilter, OrderFilter, OrderSort, Seed, Session, StoreError,
    query_devices, query_orders,
};
use crate::store::sessions::SessionTable;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use govmobile_core::catalog::DeviceSort;
use govmobile_core::{Device, NewOrder, Order, User, UserPatch};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    /// By user id.
    users: BTreeMap<String, User>,
    /// Token -> user id.
    sessions: SessionTable<String>,
    devices: Vec<Device>,
    /// Insertion order.
    orders: Vec<Order>,
}

impl State {
    fn user_id(&self, session: &Session) -> Result<&str, StoreError> {
        self.sessions
            .get(session.token(), Instant::now())
            .map(String::as_str)
            .ok_or(StoreError::Unauthenticated)
    }

    fn user(&self, session: &Session) -> Result<&User, StoreError> {
        let id = self.user_id(session)?;
        self.users.get(id).ok_or(StoreError::Unauthenticated)
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }
}

/// A seeded, process-local stand-in for the hosted platform.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new(seed: Seed) -> Self {
        let state = State {
            users: seed.users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            sessions: SessionTable::default(),
            devices: seed.devices,
            orders: seed.orders,
        };
        Self {
            state: RwLock::new(state),
        }
    }

    /// Sessions expire `ttl` after sign-in.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.state.get_mut().sessions = SessionTable::new(Some(ttl));
        self
    }

    /// Number of stored sessions, expired ones included until pruned.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}

/// Random bearer token: the 16 bytes of a v4 uuid, base64url.
fn new_token() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

#[async_trait]
impl DataStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, StoreError> {
        let email = credentials.email.trim();
        if email.is_empty() {
            return Err(StoreError::Invalid("email is required".to_string()));
        }
        let has_secret = credentials.secret.as_deref().is_some_and(|s| !s.is_empty());
        if !credentials.trusted && !has_secret {
            return Err(StoreError::Invalid("password is required".to_string()));
        }

        let mut state = self.state.write().await;
        let existing = state.user_by_email(email).map(|u| u.id.clone());
        let user_id = match existing {
            Some(id) => id,
            None => {
                let mut user = User::new(
                    Uuid::new_v4().to_string(),
                    email,
                    credentials.full_name.clone().unwrap_or_default(),
                );
                user.created_date = Some(Utc::now());
                tracing::debug!(user_id = %user.id, "created user on first login");
                let id = user.id.clone();
                state.users.insert(id.clone(), user);
                id
            }
        };

        let token = new_token();
        state
            .sessions
            .insert(token.clone(), user_id, Instant::now());
        Ok(Session::new(token))
    }

    async fn logout(&self, session: &Session) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .sessions
            .remove(session.token(), Instant::now())
            .map(|_| ())
            .ok_or(StoreError::Unauthenticated)
    }

    async fn current_user(&self, session: &Session) -> Result<User, StoreError> {
        let state = self.state.read().await;
        state.user(session).cloned()
    }

    async fn update_current_user(
        &self,
        session: &Session,
        patch: &UserPatch,
    ) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        let id = state.user_id(session)?.to_string();
        let user = state.users.get_mut(&id).ok_or(StoreError::Unauthenticated)?;

        let updated = user.merged(patch);
        if !updated.budget_consistent() {
            return Err(StoreError::Invalid(format!(
                "remaining_budget {} exceeds budget_allowance {}",
                updated.remaining_budget, updated.budget_allowance
            )));
        }
        *user = updated.clone();
        Ok(updated)
    }

    async fn list_devices(&self, session: &Session) -> Result<Vec<Device>, StoreError> {
        let state = self.state.read().await;
        state.user_id(session)?;
        Ok(state.devices.clone())
    }

    async fn filter_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
        sort: Option<DeviceSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Device>, StoreError> {
        let state = self.state.read().await;
        state.user_id(session)?;
        Ok(query_devices(state.devices.iter().cloned(), filter, sort, limit))
    }

    async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().await;
        state.user_id(session)?;
        Ok(state.orders.clone())
    }

    async fn filter_orders(
        &self,
        session: &Session,
        filter: &OrderFilter,
        sort: Option<OrderSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, StoreError> {
        let state = self.state.read().await;
        state.user_id(session)?;
        Ok(query_orders(state.orders.iter().cloned(), filter, sort, limit))
    }

    async fn create_order(
        &self,
        session: &Session,
        order: &NewOrder,
    ) -> Result<Order, StoreError> {
        let mut state = self.state.write().await;
        state.user_id(session)?;

        let created = Order::from_new(Uuid::new_v4().to_string(), order.clone(), Utc::now());
        state.orders.push(created.clone());
        tracing::debug!(order_number = %created.order_number, "stored order");
        Ok(created)
    }
}

// =============================================================================
// TESTS
// =============================================================================
