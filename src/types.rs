//! Common types used throughout postquery
//!
//! This module contains the domain records returned by the posts API
//! and small shared types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method supported by the fetch gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
        }
    }
}

// ============================================================================
// Domain Records
// ============================================================================

/// A post as served by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Server-assigned id
    pub id: u64,
    pub title: String,
    pub body: String,
    pub user_id: u64,
}

/// Payload submitted by the create mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub user_id: u64,
}

impl NewPost {
    /// Create a new payload
    pub fn new(title: impl Into<String>, body: impl Into<String>, user_id: u64) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            user_id,
        }
    }
}

/// One page of posts together with the collection's total count
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Page {
    /// Posts in server order
    pub items: Vec<Post>,
    /// Total number of posts in the collection
    pub total_count: u64,
}

impl Page {
    /// Create a page
    pub fn new(items: Vec<Post>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    /// Number of posts in this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the page holds no posts
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
