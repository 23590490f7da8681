use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{CanvasRatio, Document};
use crate::element::Element;
use crate::panel::{Panel, PanelId};

/// Errors surfaced by a persistence sink.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize project: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write project: {0}")]
    Write(#[from] std::io::Error),

    #[error("save rejected: {0}")]
    Rejected(String),
}

/// Editing metadata persisted alongside each panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditData {
    pub elements: Vec<Element>,
    pub canvas_ratio: CanvasRatio,
    #[serde(default)]
    pub selected_character_ids: Vec<String>,
}

/// Wire shape for one panel, as exchanged with the save/load collaborators.
/// Element coordinates are always in the logical (non-zoomed) unit space of
/// the payload's canvas ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelData {
    pub id: PanelId,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<String>,
    pub edit_data: EditData,
}

/// Full payload handed to a [`PersistenceSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub panels: Vec<PanelData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SavePayload {
    /// Builds the wire payload from a committed document. The character ids
    /// come from the session (they are not part of the undoable document) and
    /// are replicated per panel, matching the persisted layout shape.
    pub fn from_document(
        doc: &Document,
        selected_character_ids: &[String],
        title: Option<String>,
    ) -> Self {
        let ratio = doc.canvas_ratio();
        let panels = doc
            .panels()
            .iter()
            .map(|panel| PanelData {
                id: panel.id,
                prompt: panel.prompt.clone(),
                image_url: panel.image_url.clone(),
                generation_id: panel.generation_id.clone(),
                edit_data: EditData {
                    elements: panel.elements.clone(),
                    canvas_ratio: ratio,
                    selected_character_ids: selected_character_ids.to_vec(),
                },
            })
            .collect();
        Self { panels, title }
    }

    /// Reconstructs a document from persisted panels. An empty payload seeds
    /// the two-panel default; element geometry is re-clamped on the way in so
    /// a payload from an older session can never violate canvas bounds.
    pub fn into_document(self, fallback_ratio: CanvasRatio) -> Document {
        if self.panels.is_empty() {
            return Document::new(fallback_ratio);
        }
        let ratio = self.panels[0].edit_data.canvas_ratio;
        let canvas = ratio.canvas_size();
        let panels = self
            .panels
            .into_iter()
            .map(|data| {
                let mut elements = data.edit_data.elements;
                for element in &mut elements {
                    element.hidden_while_dragging = false;
                    element.clamp_to(canvas);
                }
                Panel {
                    id: data.id,
                    prompt: data.prompt,
                    image_url: data.image_url,
                    generation_id: data.generation_id,
                    elements,
                }
            })
            .collect();
        Document::from_parts(panels, ratio)
    }
}

/// External persistence collaborator. Both explicit "Save" and the autosave
/// scheduler funnel through this.
pub trait PersistenceSink {
    fn save(&mut self, payload: &SavePayload) -> Result<(), SaveError>;
}

/// File-backed sink writing the payload as pretty JSON, the shipped default
/// for the native shell. Tests use an in-memory fake instead.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<SavePayload>, SaveError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }
}

impl PersistenceSink for JsonFileSink {
    fn save(&mut self, payload: &SavePayload) -> Result<(), SaveError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
