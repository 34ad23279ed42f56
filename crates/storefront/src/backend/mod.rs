//! Storefront calls to the Hearth REST backend.
//!
//! Catalog reads (categories, product pages, product detail) are cached
//! with `moka` for five minutes. Cart, checkout and account calls are
//! per-customer and never cached.

mod cache;

use std::time::Duration;

use moka::future::Cache;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use hearth_core::account::{ProfileUpdate, User};
use hearth_core::api::{ApiClient, BackendError, Credentials, Login};
use hearth_core::cart::{Cart, EMPTY_CART_MESSAGE};
use hearth_core::catalog::{Category, Product, ProductDetail, categories_from_value};
use hearth_core::envelope::list_of;
use hearth_core::order::{Order, OrderRequest};
use hearth_core::search::SearchReply;
use hearth_core::{Envelope, EnvelopeError, ProductId};

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};

/// Products per listing page.
pub const PAGE_SIZE: u32 = 12;

/// A room photo attached to an AI search.
#[derive(Debug, Clone)]
pub struct RoomImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Outcome of `checkout/order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacedOrder {
    /// Cash on delivery, nothing more to do.
    Confirmed,
    /// Send the customer to the payment provider.
    Redirect(String),
}

/// Storefront view of the backend.
#[derive(Clone)]
pub struct StorefrontClient {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl StorefrontClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] when the base URL is unusable.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let api = ApiClient::new(&config.url, config.timeout)?;
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Ok(Self { api, cache })
    }

    /// The underlying REST client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// The category tree for the header bar and category listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(tree)) = self.cache.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(tree);
        }

        let body = self
            .api
            .get(&["product-category"], &[], &Credentials::anonymous())
            .await?;
        let tree = match Envelope::parse(body.clone()) {
            Ok(envelope) => categories_from_value(&envelope.data),
            Err(EnvelopeError::Shape) => categories_from_value(&body),
            Err(e) => return Err(e.into()),
        };

        self.cache
            .insert(CacheKey::Categories, CacheValue::Categories(tree.clone()))
            .await;
        Ok(tree)
    }

    /// One page of products, optionally narrowed by a backend slug
    /// (`new`, `featured`, `category/<description>`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails or the response is not a
    /// product list.
    #[instrument(skip(self))]
    pub async fn products(&self, slug: Option<&str>, page: u32) -> Result<Vec<Product>, BackendError> {
        let key = CacheKey::Products {
            slug: slug.map(str::to_owned),
            page,
        };
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut segments = vec!["products"];
        match slug {
            Some(slug) => segments.extend(slug.split('/').filter(|s| !s.is_empty())),
            None => segments.push(""),
        }
        let query = [("page", page.to_string()), ("limit", PAGE_SIZE.to_string())];
        let body = self
            .api
            .get(&segments, &query, &Credentials::anonymous())
            .await?;
        let products: Vec<Product> = Envelope::parse(body)?.into_list("products")?;

        self.cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// Product detail and related products.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for unknown slugs.
    #[instrument(skip(self))]
    pub async fn product_detail(&self, slug: &str) -> Result<ProductDetail, BackendError> {
        let key = CacheKey::Product(slug.to_owned());
        if let Some(CacheValue::Product(detail)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*detail);
        }

        let body = self
            .api
            .get(&["products", "detail", slug], &[], &Credentials::anonymous())
            .await?;
        let detail: ProductDetail = Envelope::data_of(body)?;

        self.cache
            .insert(key, CacheValue::Product(Box::new(detail.clone())))
            .await;
        Ok(detail)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The customer's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn cart(&self, auth: &Credentials) -> Result<Cart, BackendError> {
        let body = self.api.get(&["cart", ""], &[], auth).await?;
        cart_or_empty(Envelope::parse(body))
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn add_to_cart(
        &self,
        auth: &Credentials,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .post(
                &["cart", "add", product_id.as_str()],
                &json!({ "quantity": quantity }),
                auth,
            )
            .await?;
        Envelope::parse(body)?;
        Ok(())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn update_cart_item(
        &self,
        auth: &Credentials,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let quantity = quantity.to_string();
        let body = self
            .api
            .get(&["cart", "update", product_id.as_str(), &quantity], &[], auth)
            .await?;
        Envelope::parse(body)?;
        Ok(())
    }

    /// Drop a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth))]
    pub async fn remove_cart_item(
        &self,
        auth: &Credentials,
        product_id: &ProductId,
    ) -> Result<(), BackendError> {
        let body = self
            .api
            .get(&["cart", "delete", product_id.as_str()], &[], auth)
            .await?;
        Envelope::parse(body)?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Cart summary for the checkout page. An empty or missing cart is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error for any other failure.
    #[instrument(skip(self, auth))]
    pub async fn checkout(&self, auth: &Credentials) -> Result<Cart, BackendError> {
        match self.api.get(&["checkout"], &[], auth).await {
            Ok(body) => cart_or_empty(Envelope::parse(body)),
            Err(e) if e.backend_message() == Some(EMPTY_CART_MESSAGE) => Ok(Cart::empty()),
            Err(e) => Err(e),
        }
    }

    /// Place the order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses, or if it asks for an online
    /// payment without handing out a payment URL.
    #[instrument(skip(self, auth, order), fields(payment_method = order.payment_method.as_str()))]
    pub async fn place_order(
        &self,
        auth: &Credentials,
        order: &OrderRequest,
    ) -> Result<PlacedOrder, BackendError> {
        let body = self.api.post(&["checkout", "order"], order, auth).await?;
        let envelope = Envelope::parse(body)?;
        match order.payment_method {
            hearth_core::PaymentMethod::Cod => Ok(PlacedOrder::Confirmed),
            hearth_core::PaymentMethod::Momo => envelope
                .extra_str("payUrl")
                .or_else(|| envelope.data.get("payUrl").and_then(Value::as_str))
                .map(|url| PlacedOrder::Redirect(url.to_owned()))
                .ok_or_else(|| {
                    EnvelopeError::Data("payment URL missing from order response".to_owned()).into()
                }),
        }
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Orders placed by the logged-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn my_orders(&self, auth: &Credentials) -> Result<Vec<Order>, BackendError> {
        let body = self.api.get(&["my-order"], &[], auth).await?;
        let envelope = Envelope::parse(body)?;
        Ok(list_of(envelope.data))
    }

    /// The logged-in customer's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, auth))]
    pub async fn account(&self, auth: &Credentials) -> Result<User, BackendError> {
        let body = self.api.get(&["my-accountClient"], &[], auth).await?;
        Ok(Envelope::data_of(body)?)
    }

    /// Save the profile or change the password.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses.
    #[instrument(skip(self, auth, update))]
    pub async fn update_account(
        &self,
        auth: &Credentials,
        update: &ProfileUpdate,
    ) -> Result<Option<String>, BackendError> {
        let body = self
            .api
            .patch(&["my-accountClient", "edit"], update, auth)
            .await?;
        Ok(Envelope::parse(body)?.message)
    }

    /// Customer login.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Login, BackendError> {
        self.api.login(&["user", "login"], email, password).await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// AI product search by keyword and/or room photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails or answers with something
    /// that is not JSON.
    #[instrument(skip(self, auth, image), fields(has_image = image.is_some()))]
    pub async fn search(
        &self,
        auth: &Credentials,
        keyword: &str,
        image: Option<RoomImage>,
    ) -> Result<SearchReply, BackendError> {
        let mut form = Form::new().text("keyword", keyword.to_owned());
        if let Some(image) = image {
            let mut part = Part::bytes(image.bytes).file_name(image.file_name);
            if let Some(content_type) = image.content_type {
                part = part.mime_str(&content_type)?;
            }
            form = form.part("roomImage", part);
        }

        let body = self.api.post_multipart(&["searchAi"], form, auth).await?;
        // The search service answers bare or wrapped, depending on version.
        let body = match Envelope::parse(body.clone()) {
            Ok(envelope) if !envelope.data.is_null() => envelope.data,
            Ok(_) | Err(EnvelopeError::Shape) => body,
            Err(e) => return Err(e.into()),
        };
        Ok(SearchReply::deserialize(body).unwrap_or_default())
    }
}

fn cart_or_empty(envelope: Result<Envelope, EnvelopeError>) -> Result<Cart, BackendError> {
    match envelope {
        Ok(envelope) if envelope.data.is_null() => Ok(Cart::empty()),
        Ok(envelope) => Ok(envelope.into_data()?),
        Err(e) if e.message() == Some(EMPTY_CART_MESSAGE) => Ok(Cart::empty()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cart_message_is_not_an_error() {
        let cart = cart_or_empty(Envelope::parse(
            json!({"status": "error", "message": "Cart is empty or not found"}),
        ));
        assert_eq!(cart.ok(), Some(Cart::empty()));

        let cart = cart_or_empty(Envelope::parse(json!({"status": "error", "message": "Token expired"})));
        assert!(cart.is_err());
    }
}
