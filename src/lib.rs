#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod autosave;
pub mod document;
pub mod element;
pub mod history;
pub mod input;
pub mod overlay;
pub mod panel;
pub mod persist;
pub mod renderer;
pub mod session;

pub use app::StudioApp;
pub use autosave::AutosaveScheduler;
pub use document::{CanvasRatio, Document, ElementPatch, ReorderDirection};
pub use element::{Element, ElementDraft, ElementId, ElementKind};
pub use history::BoundedHistory;
pub use input::{CanvasLayout, PointerController, ResizeHandle};
pub use overlay::DraftOverlay;
pub use panel::{Panel, PanelId};
pub use persist::{JsonFileSink, PanelData, PersistenceSink, SavePayload};
pub use renderer::Renderer;
pub use session::{GeneratedImage, GenerationRequest, ImageGenerator, StudioSession};
