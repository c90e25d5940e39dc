//! Hosted platform backend.
//!
//! Speaks the platform's generic entity REST surface:
//!
//! ```text
//! POST  {base}/apps/{app}/auth/login            {email, password} -> {token}
//! POST  {base}/apps/{app}/auth/logout
//! GET   {base}/apps/{app}/entities/User/me
//! PUT   {base}/apps/{app}/entities/User/me      partial user
//! GET   {base}/apps/{app}/entities/Device       ?q=<json>&sort=<key>&limit=<n>
//! GET   {base}/apps/{app}/entities/Order        ?q=<json>&sort=<key>&limit=<n>
//! POST  {base}/apps/{app}/entities/Order        order fields minus id
//! ```
//!
//! Every authenticated call sends `Authorization: Bearer <token>`.

use super::{
    Credentials, DataStore, DeviceFilter, OrderFilter, OrderSort, Session, StoreError,
    query_devices,
};
use async_trait::async_trait;
use govmobile_core::catalog::DeviceSort;
use govmobile_core::{Device, NewOrder, Order, User, UserPatch};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "access_token")]
    token: String,
}

/// HTTP client for one platform application.
#[derive(Debug, Clone)]
pub struct PlatformStore {
    base_url: String,
    app_id: String,
    client: reqwest::Client,
}

impl PlatformStore {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/apps/{}/{path}", self.base_url, self.app_id)
    }

    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.bearer_auth(session.token())
    }

    /// Send, map error statuses, decode the body.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        kind: &'static str,
        id: &str,
    ) -> Result<T, StoreError> {
        let response = check(builder.send().await?, kind, id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        session: &Session,
        entity: &'static str,
        q: Option<String>,
        sort: Option<&'static str>,
        limit: Option<usize>,
    ) -> Result<Vec<T>, StoreError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = q {
            params.push(("q", q));
        }
        if let Some(sort) = sort {
            params.push(("sort", sort.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let builder = self
            .client
            .get(self.url(&format!("entities/{entity}")))
            .query(&params);
        self.send(self.authed(builder, session), entity, "").await
    }
}

/// Map a non-success status to a [`StoreError`].
async fn check(response: Response, kind: &'static str, id: &str) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Unauthenticated),
        StatusCode::NOT_FOUND => Err(StoreError::NotFound {
            kind,
            id: id.to_string(),
        }),
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(StoreError::Remote {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// The platform's `q` parameter: the filter as a JSON object, or nothing.
fn q_param<T: Serialize>(filter: &T) -> Result<Option<String>, StoreError> {
    let value = serde_json::to_value(filter)?;
    let empty = value.as_object().is_some_and(|o| o.is_empty());
    Ok((!empty).then(|| value.to_string()))
}

/// The part of a device filter the platform can evaluate.
fn without_role(filter: &DeviceFilter) -> DeviceFilter {
    DeviceFilter {
        role: None,
        ..filter.clone()
    }
}

#[async_trait]
impl DataStore for PlatformStore {
    fn backend(&self) -> &'static str {
        "platform"
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, StoreError> {
        if credentials.trusted {
            return Err(StoreError::Unsupported {
                backend: "platform",
                operation: "trusted login",
            });
        }
        let body = LoginRequest {
            email: credentials.email.trim(),
            password: credentials.secret.as_deref().unwrap_or_default(),
        };
        let builder = self.client.post(self.url("auth/login")).json(&body);
        let response: LoginResponse = self.send(builder, "user", &credentials.email).await?;
        Ok(Session::new(response.token))
    }

    async fn logout(&self, session: &Session) -> Result<(), StoreError> {
        let builder = self.authed(self.client.post(self.url("auth/logout")), session);
        check(builder.send().await?, "session", "").await?;
        Ok(())
    }

    async fn current_user(&self, session: &Session) -> Result<User, StoreError> {
        let builder = self.authed(self.client.get(self.url("entities/User/me")), session);
        self.send(builder, "user", "me").await
    }

    async fn update_current_user(
        &self,
        session: &Session,
        patch: &UserPatch,
    ) -> Result<User, StoreError> {
        let builder = self
            .client
            .put(self.url("entities/User/me"))
            .json(patch);
        self.send(self.authed(builder, session), "user", "me").await
    }

    async fn list_devices(&self, session: &Session) -> Result<Vec<Device>, StoreError> {
        self.query(session, "Device", None, None, None).await
    }

    /// The platform cannot express role membership, so eligibility is
    /// re-applied to whatever it returns, and the limit only after that.
    async fn filter_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
        sort: Option<DeviceSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Device>, StoreError> {
        let remote = without_role(filter);
        let remote_limit = if filter.role.is_some() { None } else { limit };
        let devices: Vec<Device> = self
            .query(
                session,
                "Device",
                q_param(&remote)?,
                sort.map(DeviceSort::as_str),
                remote_limit,
            )
            .await?;
        Ok(query_devices(devices, filter, None, limit))
    }

    async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, StoreError> {
        self.query(session, "Order", None, None, None).await
    }

    async fn filter_orders(
        &self,
        session: &Session,
        filter: &OrderFilter,
        sort: Option<OrderSort>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, StoreError> {
        self.query(
            session,
            "Order",
            q_param(filter)?,
            sort.map(OrderSort::as_str),
            limit,
        )
        .await
    }

    async fn create_order(
        &self,
        session: &Session,
        order: &NewOrder,
    ) -> Result<Order, StoreError> {
        let builder = self.client.post(self.url("entities/Order")).json(order);
        self.send(self.authed(builder, session), "order", &order.order_number)
            .await
    }
}
