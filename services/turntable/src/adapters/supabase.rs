//! services/turntable/src/adapters/supabase.rs
//!
//! This module contains the hosted-backend adapter, the concrete implementation
//! of the `CategoryRepository` port from the core crate. It speaks the PostgREST
//! dialect exposed by Supabase over plain HTTP using `reqwest`.

use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use turntable_core::domain::{
    id_from_value, is_truthy, Category, CategoryDraft, CategoryId, CategoryType, Resource,
};
use turntable_core::ports::{CategoryRepository, PortError, PortResult};

use crate::config::BackendConfig;

const CATEGORIES: &str = "categories";
const RESOURCES: &str = "resources";

/// PostgREST's error code for "the requested row does not exist".
const NO_ROWS_CODE: &str = "PGRST116";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A backend adapter that implements the `CategoryRepository` port.
#[derive(Clone)]
pub struct SupabaseAdapter {
    client: Client,
    connection: Option<BackendConfig>,
}

impl SupabaseAdapter {
    /// Creates a new `SupabaseAdapter`. Without a connection every call fails
    /// with `PortError::NotConfigured` before touching the network.
    pub fn new(connection: Option<BackendConfig>) -> Self {
        Self {
            client: Client::new(),
            connection,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.connection.is_some()
    }

    fn connection(&self) -> PortResult<&BackendConfig> {
        self.connection.as_ref().ok_or(PortError::NotConfigured)
    }

    /// Starts an authenticated request against `/rest/v1/{table}`.
    fn request(&self, method: Method, table: &str) -> PortResult<RequestBuilder> {
        let connection = self.connection()?;
        let url = format!("{}/rest/v1/{}", connection.url, table);
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &connection.anon_key)
            .bearer_auth(&connection.anon_key))
    }

    async fn send(&self, request: RequestBuilder) -> PortResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Remote(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

/// The error body PostgREST returns alongside non-2xx statuses.
#[derive(Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

async fn error_from_response(response: Response) -> PortError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<PostgrestError>(&body).ok();

    let code = detail.as_ref().and_then(|d| d.code.clone());
    let message = detail
        .and_then(|d| d.message)
        .unwrap_or_else(|| match body.trim() {
            "" => status.to_string(),
            text => text.to_string(),
        });

    if status == StatusCode::NOT_FOUND
        || code.as_deref() == Some(NO_ROWS_CODE)
        || message.contains("not found")
    {
        PortError::NotFound(message)
    } else {
        PortError::Remote(format!("{}: {}", status, message))
    }
}

/// A `categories` row, possibly with its joined `resources`.
///
/// The join comes back as `null`, an empty array or an array depending on the
/// query and the data, so it stays a raw `Value` until normalization.
#[derive(Deserialize)]
struct CategoryRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    kind: CategoryType,
    #[serde(default)]
    selected: Value,
    #[serde(default)]
    resources: Value,
}

impl CategoryRecord {
    fn to_domain(self) -> Category {
        let resources = match self.resources {
            Value::Array(items) => items.into_iter().filter_map(resource_from_value).collect(),
            _ => Vec::new(),
        };

        Category {
            id: CategoryId::new(self.id.unwrap_or_default()),
            label: self.label.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            kind: self.kind,
            selected: is_truthy(&self.selected),
            resources,
        }
    }
}

#[derive(Deserialize)]
struct ResourceRecord {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    completed: Value,
}

/// Keeps a joined resource only if it has an id, a title and a link.
fn resource_from_value(value: Value) -> Option<Resource> {
    let record: ResourceRecord = serde_json::from_value(value).ok()?;
    let id = id_from_value(&record.id)?;

    let resource = Resource {
        id: Some(id),
        title: record.title.unwrap_or_default(),
        link: record.link.unwrap_or_default(),
        completed: is_truthy(&record.completed),
    };
    resource.is_valid().then_some(resource)
}

/// A `resources` row as inserted.
#[derive(Serialize)]
struct NewResourceRow<'a> {
    category_id: &'a str,
    title: &'a str,
    link: &'a str,
    completed: bool,
}

async fn decode_rows<T: for<'de> Deserialize<'de>>(response: Response) -> PortResult<Vec<T>> {
    response
        .json::<Option<Vec<T>>>()
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| PortError::Remote(format!("Failed to decode response: {}", e)))
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

//=========================================================================================
// `CategoryRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CategoryRepository for SupabaseAdapter {
    async fn fetch_categories(&self) -> PortResult<Vec<Category>> {
        let request = self
            .request(Method::GET, CATEGORIES)?
            .query(&[("select", "*,resources(*)"), ("order", "created_at.asc")]);
        let response = self.send(request).await?;

        let records: Vec<CategoryRecord> = decode_rows(response).await?;
        debug!(rows = records.len(), "Fetched categories");
        Ok(records.into_iter().map(CategoryRecord::to_domain).collect())
    }

    async fn create_category(&self, draft: &CategoryDraft) -> PortResult<Category> {
        let request = self
            .request(Method::POST, CATEGORIES)?
            .header("Prefer", HeaderValue::from_static("return=representation"))
            .json(&[draft]);
        let response = self.send(request).await?;

        let records: Vec<CategoryRecord> = decode_rows(response).await?;
        records
            .into_iter()
            .next()
            .map(CategoryRecord::to_domain)
            .ok_or_else(|| PortError::Unexpected("Insert returned no category".to_string()))
    }

    async fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> PortResult<()> {
        let request = self
            .request(Method::PATCH, CATEGORIES)?
            .query(&[("id", eq(id))])
            .json(draft);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> PortResult<()> {
        let request = self
            .request(Method::DELETE, CATEGORIES)?
            .query(&[("id", eq(id))]);

        match self.send(request).await {
            Ok(_) => Ok(()),
            Err(PortError::NotFound(message)) => {
                debug!(%id, "Category already gone: {}", message);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_category_resources(&self, category_id: &CategoryId) -> PortResult<()> {
        let request = self
            .request(Method::DELETE, RESOURCES)?
            .query(&[("category_id", eq(category_id))]);

        if let Err(e) = self.send(request).await {
            warn!(%category_id, "Failed to delete category resources: {}", e);
        }
        Ok(())
    }

    async fn create_resources(
        &self,
        category_id: &CategoryId,
        resources: &[Resource],
    ) -> PortResult<()> {
        self.connection()?;

        let rows: Vec<NewResourceRow<'_>> = resources
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| NewResourceRow {
                category_id: category_id.as_str(),
                title: &r.title,
                link: &r.link,
                completed: r.completed,
            })
            .collect();
        if rows.is_empty() {
            return Ok(());
        }

        let request = self.request(Method::POST, RESOURCES)?.json(&rows);
        self.send(request).await?;
        Ok(())
    }

    async fn update_selection(
        &self,
        kind: CategoryType,
        id: Option<&CategoryId>,
    ) -> PortResult<()> {
        let clear = self
            .request(Method::PATCH, CATEGORIES)?
            .query(&[("type", eq(kind))])
            .json(&json!({ "selected": false }));
        self.send(clear).await?;

        if let Some(id) = id {
            let select = self
                .request(Method::PATCH, CATEGORIES)?
                .query(&[("id", eq(id))])
                .json(&json!({ "selected": true }));
            self.send(select).await?;
        }
        Ok(())
    }

    async fn has_categories(&self) -> PortResult<bool> {
        let request = self
            .request(Method::GET, CATEGORIES)?
            .query(&[("select", "id"), ("limit", "1")]);
        let response = self.send(request).await?;

        let rows: Vec<Value> = decode_rows(response).await?;
        Ok(!rows.is_empty())
    }
}
