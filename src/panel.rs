use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::{Element, ElementId};

/// Unique identifier for a panel ("cut"), assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelId(Uuid);

impl PanelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One comic frame: an AI prompt, the last successful generation result, and an
/// ordered set of overlay elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    pub prompt: String,
    /// Result of the last successful background generation. `image_url` and
    /// `generation_id` are set and cleared together.
    pub image_url: Option<String>,
    pub generation_id: Option<String>,
    pub elements: Vec<Element>,
}

impl Panel {
    pub fn new() -> Self {
        Self {
            id: PanelId::new(),
            prompt: String::new(),
            image_url: None,
            generation_id: None,
            elements: Vec::new(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    /// Removes and returns the element with the given id, if present.
    pub fn take_element(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(index))
    }

    /// Stores a completed generation result. The previous result, if any, is
    /// replaced wholesale.
    pub fn set_generation_result(&mut self, image_url: String, generation_id: String) {
        self.image_url = Some(image_url);
        self.generation_id = Some(generation_id);
    }

    pub fn clear_generation_result(&mut self) {
        self.image_url = None;
        self.generation_id = None;
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}
