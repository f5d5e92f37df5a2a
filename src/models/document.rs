use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// The canonical shared document plus its version log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    /// Opaque rich-text tree, `null` until the first write
    pub content: Value,
    pub versions: Vec<Version>,
    /// Reserved, passed through untouched
    pub comments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// The shape returned for a document that was never written
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            content: Value::Null,
            versions: Vec::new(),
            comments: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_null()
    }
}

/// An immutable full snapshot, created only on an explicit save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub version_id: String,
    pub created_at: DateTime<Utc>,
    pub content: Value,
}

/// Request body for `PUT /document`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutDocumentRequest {
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub create_version: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_shape() {
        let value = serde_json::to_value(Document::empty("main-doc-1")).unwrap();
        assert_eq!(
            value,
            json!({ "id": "main-doc-1", "content": null, "versions": [], "comments": [] })
        );
    }

    #[test]
    fn test_put_request_defaults() {
        let req: PutDocumentRequest = serde_json::from_str(r#"{"content":{"type":"doc"}}"#).unwrap();
        assert!(!req.create_version);
        assert_eq!(req.content, json!({"type": "doc"}));

        let req: PutDocumentRequest =
            serde_json::from_str(r#"{"content":null,"createVersion":true}"#).unwrap();
        assert!(req.create_version);
        assert!(req.content.is_null());
    }
}
