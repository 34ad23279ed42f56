//! Back-office calls to the Hearth REST backend.
//!
//! The product, order and user tables are cached per admin session in a
//! `moka` cache whose lifetime comes from `ADMIN_LIST_CACHE_SECS`. A
//! confirmed status change is written into the cached snapshot instead of
//! re-fetching the list. Deletes and product saves drop the snapshot so the
//! next render goes back to the backend.

mod cache;

use moka::future::Cache;
use moka::ops::compute::Op;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use hearth_core::account::{BulkStatusChange, StatusChange, User, apply_status_change};
use hearth_core::api::{ApiClient, BackendError, Credentials, Login};
use hearth_core::catalog::{
    Category, CategoryPayload, Product, ProductPayload, categories_from_value,
};
use hearth_core::envelope::list_of;
use hearth_core::order::Order;
use hearth_core::{ActiveStatus, CategoryId, Envelope, EnvelopeError, ProductId, UserId};

use crate::config::AdminConfig;

pub use cache::{ListKey, ListKind, ListSnapshot};

/// Back-office view of the backend.
#[derive(Clone)]
pub struct AdminClient {
    api: ApiClient,
    lists: Cache<ListKey, ListSnapshot>,
}

impl AdminClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] when the base URL is unusable.
    pub fn new(config: &AdminConfig) -> Result<Self, BackendError> {
        let api = ApiClient::new(&config.api.url, config.api.timeout)?;
        let lists = Cache::builder()
            .max_capacity(500)
            .time_to_live(config.list_cache_ttl)
            .build();
        Ok(Self { api, lists })
    }

    /// The underlying REST client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Admin login.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Login, BackendError> {
        self.api.login(&["admin", "login"], email, password).await
    }

    /// Drop every snapshot held for a session (logout).
    pub async fn forget_session(&self, scope: &str) {
        for kind in [ListKind::Products, ListKind::Orders, ListKind::Users] {
            self.lists.invalidate(&ListKey::new(scope, kind)).await;
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, from the session snapshot when one is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails or the body is not a
    /// product list.
    #[instrument(skip(self, auth))]
    pub async fn products(&self, scope: &str, auth: &Credentials) -> Result<Vec<Product>, BackendError> {
        let key = ListKey::new(scope, ListKind::Products);
        if let Some(ListSnapshot::Products(products)) = self.lists.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let body = self.api.get(&["product"], &[], auth).await?;
        let products: Vec<Product> = Envelope::parse(body)?.into_list("products")?;

        self.lists
            .insert(key, ListSnapshot::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product, for the edit form.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown ids.
    #[instrument(skip(self, auth))]
    pub async fn product(&self, auth: &Credentials, id: &ProductId) -> Result<Product, BackendError> {
        let body = self
            .api
            .get(&["product", "detail", id.as_str()], &[], auth)
            .await?;
        let mut data = Envelope::parse(body)?.data;
        // Some backend versions wrap it as `{product, relatedProducts}`.
        if let Some(product) = data.get_mut("product").map(Value::take) {
            data = product;
        }
        serde_json::from_value(data).map_err(|e| EnvelopeError::Data(e.to_string()).into())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, payload), fields(title = %payload.title))]
    pub async fn create_product(
        &self,
        scope: &str,
        auth: &Credentials,
        payload: &ProductPayload,
    ) -> Result<Option<String>, BackendError> {
        let body = self.api.post(&["product", "create"], payload, auth).await?;
        let message = Envelope::parse(body)?.message;
        self.invalidate(scope, ListKind::Products).await;
        Ok(message)
    }

    /// Save an edited product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, payload))]
    pub async fn update_product(
        &self,
        scope: &str,
        auth: &Credentials,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Option<String>, BackendError> {
        let body = self
            .api
            .patch(&["product", "edit", id.as_str()], payload, auth)
            .await?;
        let message = Envelope::parse(body)?.message;
        self.invalidate(scope, ListKind::Products).await;
        Ok(message)
    }

    /// Soft-delete a product. The snapshot is dropped so the table is
    /// re-fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn delete_product(
        &self,
        scope: &str,
        auth: &Credentials,
        id: &ProductId,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .patch(&["product", "delete", id.as_str()], &json!({}), auth)
            .await?;
        Envelope::acknowledge(body)?;
        self.invalidate(scope, ListKind::Products).await;
        Ok(())
    }

    /// Set one product's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn change_product_status(
        &self,
        scope: &str,
        auth: &Credentials,
        id: &ProductId,
        status: ActiveStatus,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .patch(
                &["product", "change-status", id.as_str()],
                &StatusChange { status },
                auth,
            )
            .await?;
        Envelope::acknowledge(body)?;
        self.apply_to_snapshot(scope, ListKind::Products, &[id.as_str()], status)
            .await;
        Ok(())
    }

    /// Set the status of several products at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, change), fields(count = change.ids.len(), value = %change.value))]
    pub async fn change_products_status(
        &self,
        scope: &str,
        auth: &Credentials,
        change: &BulkStatusChange,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .patch(&["product", "change-multi"], change, auth)
            .await?;
        Envelope::acknowledge(body)?;
        self.apply_to_snapshot(scope, ListKind::Products, &change.ids, change.value)
            .await;
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// The category tree. Never cached: the back-office edits it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn categories(&self, auth: &Credentials) -> Result<Vec<Category>, BackendError> {
        let body = self.api.get(&["product-category"], &[], auth).await?;
        match Envelope::parse(body.clone()) {
            Ok(envelope) => Ok(categories_from_value(&envelope.data)),
            Err(EnvelopeError::Shape) => Ok(categories_from_value(&body)),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, payload), fields(title = %payload.title))]
    pub async fn create_category(
        &self,
        auth: &Credentials,
        payload: &CategoryPayload,
    ) -> Result<Option<String>, BackendError> {
        let body = self
            .api
            .post(&["product-category", "create"], payload, auth)
            .await?;
        Ok(Envelope::parse(body)?.message)
    }

    /// Save an edited category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, payload))]
    pub async fn update_category(
        &self,
        auth: &Credentials,
        id: &CategoryId,
        payload: &CategoryPayload,
    ) -> Result<Option<String>, BackendError> {
        let body = self
            .api
            .patch(&["product-category", "edit", id.as_str()], payload, auth)
            .await?;
        Ok(Envelope::parse(body)?.message)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Every order. The backend has no detail endpoint, so the detail page
    /// reads from this list too.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn orders(&self, scope: &str, auth: &Credentials) -> Result<Vec<Order>, BackendError> {
        let key = ListKey::new(scope, ListKind::Orders);
        if let Some(ListSnapshot::Orders(orders)) = self.lists.get(&key).await {
            debug!("Cache hit for orders");
            return Ok(orders);
        }

        let body = self.api.get(&["order", "all-orders"], &[], auth).await?;
        let orders: Vec<Order> = list_of(Envelope::parse(body)?.data);

        self.lists
            .insert(key, ListSnapshot::Orders(orders.clone()))
            .await;
        Ok(orders)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn users(&self, scope: &str, auth: &Credentials) -> Result<Vec<User>, BackendError> {
        let key = ListKey::new(scope, ListKind::Users);
        if let Some(ListSnapshot::Users(users)) = self.lists.get(&key).await {
            debug!("Cache hit for users");
            return Ok(users);
        }

        let body = self.api.get(&["listUser"], &[], auth).await?;
        let users: Vec<User> = list_of(Envelope::parse(body)?.data);

        self.lists
            .insert(key, ListSnapshot::Users(users.clone()))
            .await;
        Ok(users)
    }

    /// Set one account's status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn change_user_status(
        &self,
        scope: &str,
        auth: &Credentials,
        id: &UserId,
        status: ActiveStatus,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .patch(
                &["listUser", "changeStatus", id.as_str()],
                &StatusChange { status },
                auth,
            )
            .await?;
        Envelope::acknowledge(body)?;
        self.apply_to_snapshot(scope, ListKind::Users, &[id.as_str()], status)
            .await;
        Ok(())
    }

    /// Set the status of several accounts at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, change), fields(count = change.ids.len(), value = %change.value))]
    pub async fn change_users_status(
        &self,
        scope: &str,
        auth: &Credentials,
        change: &BulkStatusChange,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .patch(&["listUser", "change-multi"], change, auth)
            .await?;
        Envelope::acknowledge(body)?;
        self.apply_to_snapshot(scope, ListKind::Users, &change.ids, change.value)
            .await;
        Ok(())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    async fn invalidate(&self, scope: &str, kind: ListKind) {
        self.lists.invalidate(&ListKey::new(scope, kind)).await;
    }

    /// Write a confirmed status change into the live snapshot, if any.
    async fn apply_to_snapshot<S: AsRef<str> + Sync>(
        &self,
        scope: &str,
        kind: ListKind,
        ids: &[S],
        status: ActiveStatus,
    ) {
        let key = ListKey::new(scope, kind);
        self.lists
            .entry(key)
            .and_compute_with(|entry| async move {
                let Some(entry) = entry else {
                    return Op::Nop;
                };
                let mut snapshot = entry.into_value();
                let changed = match &mut snapshot {
                    ListSnapshot::Products(rows) => apply_status_change(rows, ids, status),
                    ListSnapshot::Users(rows) => apply_status_change(rows, ids, status),
                    ListSnapshot::Orders(_) => 0,
                };
                debug!(changed, "Applied status change to cached list");
                Op::Put(snapshot)
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::BackendConfig;

    fn client() -> AdminClient {
        let config = AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 8081,
            base_url: "http://localhost:8081".into(),
            session_secret: SecretString::from("k".repeat(64)),
            api: BackendConfig {
                url: "http://127.0.0.1:9/api/v1".into(),
                timeout: Duration::from_secs(1),
            },
            list_cache_ttl: Duration::from_secs(60),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        AdminClient::new(&config).unwrap_or_else(|e| panic!("{e}"))
    }

    fn products() -> Vec<Product> {
        serde_json::from_value(json!([
            {"_id": "p1", "title": "Oak chair", "status": "active"},
            {"_id": "p2", "title": "Pine desk", "status": "inactive"},
            {"_id": "p3", "title": "Teak bench", "status": "active"}
        ]))
        .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_snapshot_status_change_touches_only_selected() {
        let client = client();
        let key = ListKey::new("s1", ListKind::Products);
        client
            .lists
            .insert(key.clone(), ListSnapshot::Products(products()))
            .await;

        client
            .apply_to_snapshot("s1", ListKind::Products, &["p1", "p2"], ActiveStatus::Inactive)
            .await;

        let Some(ListSnapshot::Products(rows)) = client.lists.get(&key).await else {
            panic!("snapshot missing");
        };
        let statuses: Vec<_> = rows.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            [ActiveStatus::Inactive, ActiveStatus::Inactive, ActiveStatus::Active]
        );
    }

    #[tokio::test]
    async fn test_snapshots_are_scoped_per_session() {
        let client = client();
        client
            .lists
            .insert(
                ListKey::new("s1", ListKind::Products),
                ListSnapshot::Products(products()),
            )
            .await;

        client
            .apply_to_snapshot("s2", ListKind::Products, &["p1"], ActiveStatus::Inactive)
            .await;
        assert!(client.lists.get(&ListKey::new("s2", ListKind::Products)).await.is_none());

        client.forget_session("s1").await;
        assert!(client.lists.get(&ListKey::new("s1", ListKind::Products)).await.is_none());
    }

    #[tokio::test]
    async fn test_status_change_does_not_revive_dropped_snapshot() {
        let client = client();
        let key = ListKey::new("s1", ListKind::Products);
        client
            .lists
            .insert(key.clone(), ListSnapshot::Products(products()))
            .await;
        client.invalidate("s1", ListKind::Products).await;

        client
            .apply_to_snapshot("s1", ListKind::Products, &["p1"], ActiveStatus::Inactive)
            .await;
        assert!(client.lists.get(&key).await.is_none());
    }
}
