use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Block kind the title is read from
pub const HEADER_BLOCK: &str = "header";

/// Page identifier, assigned by the storage backend on first save
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Editor document as produced by the block editor.
/// Passed through untouched; only header blocks are ever inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(pub Value);

impl Body {
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self(json!({ "blocks": blocks }))
    }

    /// Initial document of a fresh editor: a single empty level 2 header
    pub fn placeholder() -> Self {
        Self::from_blocks(vec![Block::header("", 2)])
    }

    /// Text of the first header block, or "" when there is none.
    ///
    /// A body without a `blocks` array, or a header without `data.text`,
    /// is not an error here.
    pub fn title(&self) -> String {
        let Some(blocks) = self.0.get("blocks").and_then(Value::as_array) else {
            return String::new();
        };

        blocks
            .iter()
            .find(|block| block_kind(block) == Some(HEADER_BLOCK))
            .and_then(|block| block.pointer("/data/text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

/// Block discriminator, `type` as the editor writes it or `kind`
fn block_kind(block: &Value) -> Option<&str> {
    block
        .get("type")
        .or_else(|| block.get("kind"))
        .and_then(Value::as_str)
}

/// Empty ids count as absent
fn non_empty(id: Option<PageId>) -> Option<PageId> {
    id.filter(|id| !id.as_str().is_empty())
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Typed editor block, used to build bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
}

impl Block {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    pub fn header(text: &str, level: u8) -> Self {
        Self::new(HEADER_BLOCK, json!({ "text": text, "level": level }))
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new("paragraph", json!({ "text": text }))
    }
}

/// Stored and transmitted shape of a page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PageId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default, alias = "parent", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
}

/// A node in the page forest.
///
/// `title` is derived from `body` on every assignment and cannot be set
/// on its own. A page without `id` has never been saved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    id: Option<PageId>,
    title: String,
    body: Option<Body>,
    parent_id: Option<PageId>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a page from a stored or incoming record.
    /// An incoming `title` is ignored in favour of the body's header, and an
    /// empty `id` leaves the page unsaved.
    pub fn from_record(record: PageRecord) -> Self {
        let mut page = Self {
            id: non_empty(record.id),
            ..Self::default()
        };
        page.merge(PageRecord {
            id: None,
            ..record
        });
        page
    }

    /// Build a page from a lookup result; a miss gives an empty, unsaved page
    pub fn from_lookup(record: Option<PageRecord>) -> Self {
        record.map(Self::from_record).unwrap_or_default()
    }

    pub fn with_body(body: Body) -> Self {
        let mut page = Self::new();
        page.set_body(body);
        page
    }

    pub fn id(&self) -> Option<&PageId> {
        self.id.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    pub fn parent_id(&self) -> Option<&PageId> {
        self.parent_id.as_ref()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_body(&mut self, body: Body) {
        self.body = Some(body);
        self.refresh_title();
    }

    pub fn set_parent_id(&mut self, parent_id: Option<PageId>) {
        self.parent_id = parent_id;
    }

    /// Link the given page as parent. An unsaved parent clears the link.
    pub fn set_parent(&mut self, parent: &Page) {
        self.parent_id = parent.id.clone();
    }

    /// Apply incoming data: `body` and `parent` replace the current values
    /// only when present and non-empty. `id` and `title` are not taken from
    /// the record.
    pub fn merge(&mut self, record: PageRecord) {
        if let Some(body) = record.body {
            self.body = Some(body);
        }
        if let Some(parent_id) = non_empty(record.parent_id) {
            self.parent_id = Some(parent_id);
        }
        self.refresh_title();
    }

    pub fn to_record(&self) -> PageRecord {
        PageRecord {
            id: self.id.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            parent_id: self.parent_id.clone(),
        }
    }

    pub(crate) fn assign_id(&mut self, id: PageId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    fn refresh_title(&mut self) {
        self.title = self.body.as_ref().map(Body::title).unwrap_or_default();
    }
}

impl From<PageRecord> for Page {
    fn from(record: PageRecord) -> Self {
        Self::from_record(record)
    }
}

impl Serialize for Page {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}
