//! The scene document envelope.
//!
//! A [`SceneDocument`] wraps the ordered element sequence in the fixed
//! envelope expected by the drawing tool: a type discriminator, a schema
//! version, a source attribution, a fixed application state and an empty
//! file-attachment map.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::element::ElementRecord;

/// Document type discriminator.
pub const DOCUMENT_TYPE: &str = "excalidraw";

/// Document schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Source attribution written into every document.
pub const DOCUMENT_SOURCE: &str = "https://excalidraw.com";

/// Fixed application state of a freshly assembled document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    grid_size: u32,
    grid_step: u32,
    grid_mode_enabled: bool,
    view_background_color: &'static str,
}

impl AppState {
    /// Grid cell size in scene units.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of cells between major grid lines.
    pub fn grid_step(&self) -> u32 {
        self.grid_step
    }

    /// Whether grid snapping is enabled.
    pub fn grid_mode_enabled(&self) -> bool {
        self.grid_mode_enabled
    }

    /// Canvas background color.
    pub fn view_background_color(&self) -> &str {
        self.view_background_color
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            grid_size: 20,
            grid_step: 5,
            grid_mode_enabled: false,
            view_background_color: "#ffffff",
        }
    }
}

/// A complete scene document.
///
/// Element order is significant: it is the z-order of the scene, first
/// element at the bottom.
///
/// # Example
///
/// ```
/// use sketchscene_core::{document::SceneDocument, element::ElementRecord};
///
/// let mut element = ElementRecord::new();
/// element.insert("type", "rectangle");
///
/// let document = SceneDocument::new(vec![element]);
/// let json = document.to_json_value();
/// assert_eq!(json["type"], "excalidraw");
/// assert_eq!(json["elements"][0]["type"], "rectangle");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    version: u32,
    source: &'static str,
    elements: Vec<ElementRecord>,
    app_state: AppState,
    files: Map<String, Value>,
}

impl SceneDocument {
    /// Wrap an ordered element sequence in the fixed envelope.
    pub fn new(elements: Vec<ElementRecord>) -> Self {
        Self {
            kind: DOCUMENT_TYPE,
            version: SCHEMA_VERSION,
            source: DOCUMENT_SOURCE,
            elements,
            app_state: AppState::default(),
            files: Map::new(),
        }
    }

    /// The elements in z-order.
    pub fn elements(&self) -> &[ElementRecord] {
        &self.elements
    }

    /// The application state.
    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Convert into a JSON value tree.
    pub fn to_json_value(&self) -> Value {
        // Every field is a string, number, bool, map or sequence keyed by strings.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
