//! Typed views over workspace API objects
//!
//! Each view keeps the raw JSON next to the handful of fields the assistant
//! reads, so callers that need the full object can still forward it verbatim.

use pagetext::{ContentNode, TextRun};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use super::WorkspaceError;

/// Fallback title for objects without one
pub const UNTITLED: &str = "Untitled";

/// Plain text of the first run in a rich-text array
pub fn first_run_text(rich_text: &Value) -> Option<String> {
    rich_text
        .as_array()
        .and_then(|runs| runs.first())
        .map(TextRun::from_rich_text)
        .map(|run| run.text)
}

/// Title of a page or entry: the first `title`-typed property's first run
pub fn title_from_properties(properties: &Value) -> Option<String> {
    properties
        .as_object()?
        .values()
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("title"))
        .find_map(|p| p.get("title").and_then(first_run_text))
}

fn required_id(value: &Value, what: &str) -> Result<String, WorkspaceError> {
    value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WorkspaceError::InvalidResponse(format!("{} response has no id", what)))
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A page as returned by the workspace API
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub id: String,
    pub url: Option<String>,
    pub title: String,
    pub last_edited_time: Option<String>,
    #[serde(skip)]
    pub raw: Value,
}

impl PageMeta {
    pub fn from_value(raw: Value) -> Result<Self, WorkspaceError> {
        let id = required_id(&raw, "page")?;
        let title = raw
            .get("properties")
            .and_then(title_from_properties)
            .unwrap_or_else(|| UNTITLED.to_string());
        debug!(%id, %title, "PageMeta::from_value: parsed");
        Ok(Self {
            id,
            url: opt_str(&raw, "url"),
            title,
            last_edited_time: opt_str(&raw, "last_edited_time"),
            raw,
        })
    }
}

/// A database schema as returned by the workspace API
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseMeta {
    pub id: String,
    pub title: String,
    /// Property name and type, sorted by name
    pub properties: Vec<(String, String)>,
    #[serde(skip)]
    pub raw: Value,
}

impl DatabaseMeta {
    pub fn from_value(raw: Value) -> Result<Self, WorkspaceError> {
        let id = required_id(&raw, "database")?;
        let title = raw
            .get("title")
            .and_then(first_run_text)
            .unwrap_or_else(|| UNTITLED.to_string());
        let properties = raw
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, p)| {
                        let kind = p.get("type").and_then(Value::as_str).unwrap_or("unknown");
                        (name.clone(), kind.to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(%id, %title, "DatabaseMeta::from_value: parsed");
        Ok(Self {
            id,
            title,
            properties,
            raw,
        })
    }

    /// Name of the property holding entry titles
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, kind)| kind == "title")
            .map(|(name, _)| name.as_str())
    }

    /// Type of the property called `name`
    pub fn property_kind(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| kind.as_str())
    }
}

/// A row of a database query
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    #[serde(skip)]
    pub raw: Value,
}

impl Entry {
    pub fn from_value(raw: Value) -> Result<Self, WorkspaceError> {
        let id = required_id(&raw, "entry")?;
        let title = raw
            .get("properties")
            .and_then(title_from_properties)
            .unwrap_or_else(|| UNTITLED.to_string());
        Ok(Self {
            id,
            title,
            created_time: opt_str(&raw, "created_time"),
            last_edited_time: opt_str(&raw, "last_edited_time"),
            raw,
        })
    }
}

/// What a search hit points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Page,
    Database,
    Other,
}

/// One result of a workspace search
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub object: ObjectKind,
    /// None when the object has no title; formatting picks a fallback per kind
    pub title: Option<String>,
    pub url: Option<String>,
}

impl SearchHit {
    pub fn from_value(raw: &Value) -> Self {
        let object = match raw.get("object").and_then(Value::as_str) {
            Some("page") => ObjectKind::Page,
            Some("database") => ObjectKind::Database,
            _ => ObjectKind::Other,
        };
        let title = match object {
            ObjectKind::Page => raw.get("properties").and_then(title_from_properties),
            ObjectKind::Database => raw.get("title").and_then(first_run_text),
            ObjectKind::Other => None,
        };
        Self {
            id: opt_str(raw, "id").unwrap_or_default(),
            object,
            title,
            url: opt_str(raw, "url"),
        }
    }
}

/// A workspace member
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    /// `person` or `bot`
    pub kind: Option<String>,
}

impl User {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            id: opt_str(raw, "id").unwrap_or_default(),
            name: opt_str(raw, "name"),
            kind: opt_str(raw, "type"),
        }
    }
}

/// Where a new page lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    Page(String),
    Database(String),
}

impl Parent {
    pub fn to_json(&self) -> Value {
        match self {
            Parent::Page(id) => json!({ "page_id": id }),
            Parent::Database(id) => json!({ "database_id": id }),
        }
    }
}

/// Everything needed to create a page or database entry
#[derive(Debug, Clone)]
pub struct PageSpec {
    pub parent: Parent,
    pub title: String,
    /// Name of the title property; `title` for pages, schema-dependent for entries
    pub title_property: String,
    /// Extra properties, sent verbatim
    pub properties: Map<String, Value>,
    pub children: Vec<ContentNode>,
}

impl PageSpec {
    pub fn new(parent: Parent, title: impl Into<String>) -> Self {
        Self {
            parent,
            title: title.into(),
            title_property: "title".to_string(),
            properties: Map::new(),
            children: Vec::new(),
        }
    }

    pub fn with_title_property(mut self, name: impl Into<String>) -> Self {
        self.title_property = name.into();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Shorthand for a select property
    pub fn with_select(self, name: impl Into<String>, option: &str) -> Self {
        self.with_property(name, json!({ "select": { "name": option } }))
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    /// Property map with the title filled in
    pub fn properties_json(&self) -> Value {
        let mut props = self.properties.clone();
        props.insert(
            self.title_property.clone(),
            json!({ "title": [TextRun::plain(self.title.as_str()).to_rich_text()] }),
        );
        Value::Object(props)
    }

    /// Request body carrying at most `max_children` child blocks
    pub fn to_body(&self, max_children: usize) -> Value {
        let children: Vec<Value> = self.children.iter().take(max_children).map(ContentNode::to_block).collect();
        json!({
            "parent": self.parent.to_json(),
            "properties": self.properties_json(),
            "children": children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_json(title: &str) -> Value {
        json!({
            "object": "page",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "url": "https://www.notion.so/Plan-598337872cf94fdf8782e53db20768a5",
            "last_edited_time": "2024-03-01T10:00:00.000Z",
            "properties": {
                "Tags": {"id": "a", "type": "multi_select", "multi_select": []},
                "Name": {"id": "title", "type": "title", "title": [
                    {"type": "text", "text": {"content": title}, "plain_text": title}
                ]}
            }
        })
    }

    #[test]
    fn test_page_meta_reads_title_property() {
        let page = PageMeta::from_value(page_json("Plan")).unwrap();
        assert_eq!(page.id, "59833787-2cf9-4fdf-8782-e53db20768a5");
        assert_eq!(page.title, "Plan");
        assert_eq!(page.last_edited_time.as_deref(), Some("2024-03-01T10:00:00.000Z"));
        assert!(page.url.is_some());
    }

    #[test]
    fn test_page_meta_untitled_fallback() {
        let page = PageMeta::from_value(json!({"id": "p1", "properties": {}})).unwrap();
        assert_eq!(page.title, UNTITLED);

        let page = PageMeta::from_value(json!({
            "id": "p2",
            "properties": {"title": {"type": "title", "title": []}}
        }))
        .unwrap();
        assert_eq!(page.title, UNTITLED);
    }

    #[test]
    fn test_missing_id_is_invalid_response() {
        let err = PageMeta::from_value(json!({"object": "page"})).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidResponse(_)));
    }

    #[test]
    fn test_database_meta() {
        let db = DatabaseMeta::from_value(json!({
            "object": "database",
            "id": "db1",
            "title": [{"plain_text": "Roadmap"}],
            "properties": {
                "Name": {"type": "title"},
                "Status": {"type": "select"}
            }
        }))
        .unwrap();
        assert_eq!(db.title, "Roadmap");
        assert_eq!(
            db.properties,
            vec![
                ("Name".to_string(), "title".to_string()),
                ("Status".to_string(), "select".to_string())
            ]
        );
        assert_eq!(db.title_property(), Some("Name"));
        assert_eq!(db.property_kind("Status"), Some("select"));
        assert_eq!(db.property_kind("Priority"), None);
    }

    #[test]
    fn test_search_hit_kinds() {
        let page = SearchHit::from_value(&page_json("Notes"));
        assert_eq!(page.object, ObjectKind::Page);
        assert_eq!(page.title.as_deref(), Some("Notes"));

        let db = SearchHit::from_value(&json!({"object": "database", "id": "d", "title": []}));
        assert_eq!(db.object, ObjectKind::Database);
        assert!(db.title.is_none());
    }

    #[test]
    fn test_page_spec_body() {
        let spec = PageSpec::new(Parent::Database("db1".to_string()), "AI Suggestions: Onboarding")
            .with_title_property("Title")
            .with_select("Status", "AI Generated")
            .with_children(vec![ContentNode::heading_2("H"), ContentNode::paragraph("P")]);

        let body = spec.to_body(100);
        assert_eq!(body["parent"]["database_id"], "db1");
        assert_eq!(
            body["properties"]["Title"]["title"][0]["text"]["content"],
            "AI Suggestions: Onboarding"
        );
        assert_eq!(body["properties"]["Status"]["select"]["name"], "AI Generated");
        assert_eq!(body["children"].as_array().unwrap().len(), 2);

        let body = spec.to_body(1);
        assert_eq!(body["children"].as_array().unwrap().len(), 1);
    }
}
