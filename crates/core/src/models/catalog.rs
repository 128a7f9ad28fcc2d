//! Catalogs: named, externally-sourced tabular datasets.
//!
//! A catalog's `source_config` shape depends on its `source_type`; the wire
//! keeps them as two fields and [`Catalog::source`] decodes the pair into a
//! typed [`SourceConfig`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{EntityId, Timestamp};

/// Upper bound on cached rows the backend accepts.
pub const MAX_CACHE_SIZE: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Sql,
    Csv,
    Json,
    Excel,
    Api,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "excel",
            Self::Api => "api",
        }
    }
}

/// Connection settings, one variant per [`SourceType`].
///
/// Serialized untagged: the variant travels separately as `source_type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceConfig {
    Sql {
        connection_string: String,
        query: String,
    },
    Csv {
        location: String,
        delimiter: String,
        has_header: bool,
    },
    Json {
        location: String,
        /// JSON pointer to the array of rows inside the document.
        data_path: Option<String>,
    },
    Excel {
        location: String,
        sheet_name: Option<String>,
        header_row: u32,
    },
    Api {
        url: String,
        method: String,
        headers: BTreeMap<String, String>,
        data_path: Option<String>,
    },
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

impl SourceConfig {
    /// Decode a raw `source_config` object for the given source type.
    pub fn decode(source_type: SourceType, raw: &serde_json::Value) -> Result<Self, CoreError> {
        let invalid = |e: serde_json::Error| {
            CoreError::Validation(format!(
                "Invalid {} source_config: {e}",
                source_type.as_str()
            ))
        };
        // csv/json/excel share `location`; the declared type picks the shape.
        #[derive(Deserialize)]
        struct Sql {
            connection_string: String,
            query: String,
        }
        #[derive(Deserialize)]
        struct Csv {
            location: String,
            #[serde(default = "default_delimiter")]
            delimiter: String,
            #[serde(default = "default_true")]
            has_header: bool,
        }
        #[derive(Deserialize)]
        struct Json {
            location: String,
            #[serde(default)]
            data_path: Option<String>,
        }
        #[derive(Deserialize)]
        struct Excel {
            location: String,
            #[serde(default)]
            sheet_name: Option<String>,
            #[serde(default)]
            header_row: u32,
        }
        #[derive(Deserialize)]
        struct Api {
            url: String,
            #[serde(default = "default_method")]
            method: String,
            #[serde(default)]
            headers: BTreeMap<String, String>,
            #[serde(default)]
            data_path: Option<String>,
        }

        let raw = raw.clone();
        Ok(match source_type {
            SourceType::Sql => {
                let c: Sql = serde_json::from_value(raw).map_err(invalid)?;
                Self::Sql {
                    connection_string: c.connection_string,
                    query: c.query,
                }
            }
            SourceType::Csv => {
                let c: Csv = serde_json::from_value(raw).map_err(invalid)?;
                Self::Csv {
                    location: c.location,
                    delimiter: c.delimiter,
                    has_header: c.has_header,
                }
            }
            SourceType::Json => {
                let c: Json = serde_json::from_value(raw).map_err(invalid)?;
                Self::Json {
                    location: c.location,
                    data_path: c.data_path,
                }
            }
            SourceType::Excel => {
                let c: Excel = serde_json::from_value(raw).map_err(invalid)?;
                Self::Excel {
                    location: c.location,
                    sheet_name: c.sheet_name,
                    header_row: c.header_row,
                }
            }
            SourceType::Api => {
                let c: Api = serde_json::from_value(raw).map_err(invalid)?;
                Self::Api {
                    url: c.url,
                    method: c.method,
                    headers: c.headers,
                    data_path: c.data_path,
                }
            }
        })
    }

    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Sql { .. } => SourceType::Sql,
            Self::Csv { .. } => SourceType::Csv,
            Self::Json { .. } => SourceType::Json,
            Self::Excel { .. } => SourceType::Excel,
            Self::Api { .. } => SourceType::Api,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema, permissions, cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
}

/// One typed column; the order of `Catalog::schema` is the display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type", alias = "data_type")]
    pub data_type: ColumnType,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default = "default_true")]
    pub searchable: bool,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub filterable: bool,
}

impl ColumnSchema {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Per-group visibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPermission {
    pub group: String,
    #[serde(default = "default_true")]
    pub can_view: bool,
    /// Empty means every column is visible to the group.
    #[serde(default)]
    pub visible_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    #[serde(default)]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub max_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_size: 10_000,
        }
    }
}

/// Outcome of the last on-demand sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    #[serde(default)]
    pub row_count: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub synced_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(alias = "catalog_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source_type: SourceType,
    #[serde(default)]
    pub source_config: serde_json::Value,
    #[serde(default)]
    pub schema: Vec<ColumnSchema>,
    #[serde(default)]
    pub permissions: Vec<CatalogPermission>,
    #[serde(default)]
    pub cache_config: CacheConfig,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub last_sync_result: Option<SyncResult>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

impl Catalog {
    pub fn source(&self) -> Result<SourceConfig, CoreError> {
        SourceConfig::decode(self.source_type, &self.source_config)
    }

    /// Columns visible to a group, in schema order.
    pub fn visible_columns(&self, group: &str) -> Vec<&ColumnSchema> {
        let rule = self.permissions.iter().find(|p| p.group == group);
        match rule {
            Some(rule) if !rule.can_view => Vec::new(),
            Some(rule) if !rule.visible_columns.is_empty() => self
                .schema
                .iter()
                .filter(|c| rule.visible_columns.contains(&c.name))
                .collect(),
            _ => self.schema.iter().collect(),
        }
    }
}

/// Body for catalog create/update and for test-connection / preview-data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_type: SourceType,
    pub source_config: SourceConfig,
    pub schema: Vec<ColumnSchema>,
    pub permissions: Vec<CatalogPermission>,
    pub cache_config: CacheConfig,
}

impl CatalogDraft {
    /// Client-side checks run before the dialog submits.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "Catalog name must not be empty".to_string(),
            ));
        }
        if self.source_config.source_type() != self.source_type {
            return Err(CoreError::Validation(format!(
                "source_config does not match source_type '{}'",
                self.source_type.as_str()
            )));
        }
        let mut seen = HashSet::new();
        for column in &self.schema {
            if column.name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate column '{}'",
                    column.name
                )));
            }
        }
        if self.cache_config.enabled {
            if self.cache_config.ttl_seconds == 0 {
                return Err(CoreError::Validation(
                    "Cache TTL must be positive when caching is enabled".to_string(),
                ));
            }
            if self.cache_config.max_size == 0 || self.cache_config.max_size > MAX_CACHE_SIZE {
                return Err(CoreError::Validation(format!(
                    "Cache size must be between 1 and {MAX_CACHE_SIZE}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Data query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Parameters for `GET /admin/catalogs/{id}/data`. `page` is 0-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogDataQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl CatalogDataQuery {
    /// Flatten into query-string pairs; filters travel as one JSON object.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("page_size".to_string(), self.page_size.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_string(), sort_by.clone()));
            let order = self.sort_order.unwrap_or(SortOrder::Asc);
            pairs.push(("sort_order".to_string(), order.as_str().to_string()));
        }
        if !self.filters.is_empty() {
            let encoded = serde_json::to_string(&self.filters).unwrap_or_default();
            pairs.push(("filters".to_string(), encoded));
        }
        pairs
    }
}

/// One page of catalog rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDataPage {
    #[serde(alias = "data", default)]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(alias = "total", default)]
    pub total_count: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}
