//! PDF output for statements using lopdf.
//!
//! A [`PageCanvas`] collects drawing operations for one page in PDF user space
//! (origin bottom-left). Finished canvases are handed to a [`PdfDocumentBuilder`],
//! which owns the shared resources (standard fonts, image XObjects) and serializes
//! the document. Output is deterministic: no timestamps or random IDs are written.

mod canvas;
mod document;
mod error;
mod fonts;
mod raster;

pub use canvas::PageCanvas;
pub use document::PdfDocumentBuilder;
pub use error::RenderError;
pub use fonts::{StandardFont, to_win_ansi};
pub use raster::LoadedImage;
