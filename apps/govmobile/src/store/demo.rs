//! Demo backend.
//!
//! Wraps another store that holds the demo catalog. Every demo session acts
//! as the fixture user from [`govmobile_core::demo::demo_user`]; reads go to
//! the wrapped store, writes are answered locally and never persisted.
//! Demo sessions expire [`DEFAULT_SESSION_TTL`] after the code was entered.

use super::sessions::{DEFAULT_SESSION_TTL, SessionTable};
use super::{
    Credentials, DataStore, DeviceFilter, OrderFilter, OrderSort, Session, StoreError,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use govmobile_core::catalog::DeviceSort;
use govmobile_core::demo::{DEMO_USER_EMAIL, demo_order_number, demo_user};
use govmobile_core::{Device, NewOrder, Order, User, UserPatch};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Token prefix that routes a session to the demo backend.
pub const DEMO_TOKEN_PREFIX: &str = "demo.";

/// How long a demo order placement takes.
pub const DEFAULT_DEMO_DELAY: Duration = Duration::from_millis(1500);

pub struct DemoStore<S> {
    inner: S,
    /// The demo's own session on `inner`.
    inner_session: Session,
    sessions: RwLock<SessionTable<()>>,
    delay: Duration,
}

impl<S: DataStore> DemoStore<S> {
    /// Sign in to `inner` as the fixture user and wrap it.
    pub async fn connect(inner: S, delay: Duration) -> Result<Self, StoreError> {
        let fixture = demo_user();
        let inner_session = inner
            .login(&Credentials::trusted(DEMO_USER_EMAIL, fixture.full_name))
            .await?;

        Ok(Self {
            inner,
            inner_session,
            sessions: RwLock::new(SessionTable::new(Some(DEFAULT_SESSION_TTL))),
            delay,
        })
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = RwLock::new(SessionTable::new(Some(ttl)));
        self
    }

    async fn check(&self, session: &Session) -> Result<(), StoreError> {
        let sessions = self.sessions.read().await;
        if sessions.get(session.token(), Instant::now()).is_some() {
            Ok(())
        } else {
            Err(StoreError::Unauthenticated)
        }
    }
}

#[async_trait]
impl<S: DataStore> DataStore for DemoStore<S> {
    fn backend(&self) -> &'static str {
        "demo"
    }

    /// Credentials are ignored; the demo code is checked by the caller.
    async fn login(&self, _credentials: &Credentials) -> Result<Session, StoreError> {
        let token = format!(
            "{DEMO_TOKEN_PREFIX}{}",
            URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
        );
        self.sessions
            .write()
            .await
            .insert(token.clone(), (), Instant::now());
        Ok(Session::new(token))
    }

    async fn logout(&self, session: &Session) -> Result<(), StoreError> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(session.token(), Instant::now());
        if removed.is_some() {
            Ok(())
        } else {
            Err(StoreError::Unauthenticated)
        }
    }

    async fn current_user(&self, session: &Session) -> Result<User, StoreError> {
        self.check(session).await?;
        Ok(demo_user())
    }

    async fn update_current_user(
        &self,
        session: &Session,
        patch: &UserPatch,
    ) -> Result<User, StoreError> {
        self.check(session).await?;
        Ok(demo_user().merged(patch))
    }

    async fn list_devices(&self, session: &Session) -> Result<Vec<Device>, StoreError> {
        self.check(session).await?;
        self.inner.list_devices(&self.inner_session).await
    }

    async fn filter_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
        sort: Option<DeviceSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Device>, StoreError> {
        self.check(session).await?;
        self.inner
            .filter_devices(&self.inner_session, filter, sort, limit)
            .await
    }

    async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, StoreError> {
        self.check(session).await?;
        self.inner.list_orders(&self.inner_session).await
    }

    async fn filter_orders(
        &self,
        session: &Session,
        filter: &OrderFilter,
        sort: Option<OrderSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, StoreError> {
        self.check(session).await?;
        self.inner
            .filter_orders(&self.inner_session, filter, sort, limit)
            .await
    }

    /// Waits the configured delay, then answers with an `ORD-DEMO-` order.
    async fn create_order(
        &self,
        session: &Session,
        order: &NewOrder,
    ) -> Result<Order, StoreError> {
        self.check(session).await?;
        tokio::time::sleep(self.delay).await;

        let mut order = order.clone();
        order.order_number = demo_order_number(&order.order_number);
        tracing::info!(order_number = %order.order_number, "demo order placed (not persisted)");
        Ok(Order::from_new(
            format!("demo-{}", Uuid::new_v4()),
            order,
            Utc::now(),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, Seed};
    use govmobile_core::demo::DEMO_USER_ID;
    use govmobile_core::{OrderStatus, OrderType, RoleLevel, ShippingAddress};

    async fn store(delay: Duration) -> DemoStore<InMemoryStore> {
        let seed = Seed {
            devices: vec![
                Device::new("d1", "Apple", "iPhone 15 Pro", 4200)
                    .with_eligibility([RoleLevel::Premium]),
            ],
            ..Seed::default()
        };
        DemoStore::connect(InMemoryStore::new(seed), delay)
            .await
            .expect("demo store signs in to its catalog")
    }

    async fn demo_session(store: &DemoStore<InMemoryStore>) -> Session {
        store.login(&Credentials::default()).await.unwrap()
    }

    fn new_order() -> NewOrder {
        NewOrder {
            order_number: "ORD-1700000000000".to_string(),
            user_id: DEMO_USER_ID.to_string(),
            device_id: "d1".to_string(),
            order_type: OrderType::Upgrade,
            status: OrderStatus::Pending,
            total_cost: 4200,
            upgrade_fee: 1700,
            justification: "demo".to_string(),
            shipping_address: ShippingAddress::new("Demo St 1", "", "Tel Aviv", "61000"),
            estimated_delivery: None,
            tracking_number: None,
        }
    }

    #[tokio::test]
    async fn sessions_carry_the_demo_prefix() {
        let store = store(Duration::ZERO).await;
        let session = demo_session(&store).await;
        assert!(session.is_demo());
    }

    #[tokio::test]
    async fn acts_as_the_fixture_user() {
        let store = store(Duration::ZERO).await;
        let session = demo_session(&store).await;
        let user = store.current_user(&session).await.unwrap();
        assert_eq!(user.id, DEMO_USER_ID);
    }

    #[tokio::test]
    async fn reads_delegate_to_the_wrapped_store() {
        let store = store(Duration::ZERO).await;
        let session = demo_session(&store).await;
        let devices = store.list_devices(&session).await.unwrap();
        assert_eq!(devices.len(), 1);
    }

    #[tokio::test]
    async fn orders_are_fabricated_after_the_delay() {
        let delay = Duration::from_millis(30);
        let store = store(delay).await;
        let session = demo_session(&store).await;

        let started = Instant::now();
        let order = store.create_order(&session, &new_order()).await.unwrap();
        assert!(started.elapsed() >= delay);
        assert_eq!(order.order_number, "ORD-DEMO-1700000000000");

        let stored = store.list_orders(&session).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn profile_updates_are_not_persisted() {
        let store = store(Duration::ZERO).await;
        let session = demo_session(&store).await;

        let patch = UserPatch::profile_edit("Renamed", "050-000-0000", "Ops", "Lead");
        let updated = store.update_current_user(&session, &patch).await.unwrap();
        assert_eq!(updated.full_name, "Renamed");

        let reread = store.current_user(&session).await.unwrap();
        assert_eq!(reread.full_name, "Demo User");
    }

    #[tokio::test]
    async fn foreign_tokens_are_rejected() {
        let store = store(Duration::ZERO).await;
        let result = store.current_user(&Session::new("demo.forged")).await;
        assert!(matches!(result, Err(StoreError::Unauthenticated)));
    }

    #[tokio::test]
    async fn expired_demo_sessions_are_rejected() {
        let store = store(Duration::ZERO).await.with_session_ttl(Duration::ZERO);
        let session = demo_session(&store).await;
        assert!(matches!(
            store.current_user(&session).await,
            Err(StoreError::Unauthenticated)
        ));
    }
}
