// chat-export: structured document extraction from AI chat responses
//
// A response-container snippet is parsed into an owned tree, cleaned of UI
// chrome and thinking content, walked into a canonical `Document`, and
// rendered as clipboard markup, plain text or a Word document.

pub mod classify;
pub mod clean;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod dom;
pub mod error;
pub mod filename;
pub mod infer;
pub mod pipeline;
pub mod render;
pub mod walkers;

pub use classify::{AuthorType, ClassificationResult, Geometry, classify, is_thinking_content, is_thinking_text_content};
pub use clean::{CleanReport, clean, clean_text};
pub use config::{ExportOptions, Rules};
pub use dispatch::{Dispatched, Dispatcher, Fidelity, Registry, RegistryState};
pub use document::{Block, Cell, Document, Link, Run};
pub use error::{ExportError, Result};
pub use pipeline::{ClipboardPayload, ExportArtifact, ExportOutcome, ExportRequest, Exporter, render_payload};
pub use render::OutputFormat;
pub use walkers::{GenericWalker, SiteInfo, SiteProfile, Walker, site_info, site_profile};
