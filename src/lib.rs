//! Sticker Generator Library
//!
//! Produces printable front/back sticker documents (`.docx`) for UPS and
//! battery charger products. This library provides functionality to:
//! - Validate sticker jobs (customer, job number, product fields, theme)
//! - Assemble a two-page document with headings, the sticker image and fields
//! - Shrink each text line's font size until it fits on one line
//! - Expand production orders into many stickers with serial numbers
//! - Inspect generated documents and hand them to the OS to open or print
//!
//! # Example
//!
//! ```no_run
//! use sticker_generator::{Assembler, StickerJob};
//! use std::path::Path;
//!
//! let job = StickerJob::new("Acme Corp", "JOB-2024-001")
//!     .with_field("Model", "UPS-3000")
//!     .with_field("Serial", "SN123456");
//!
//! Assembler::new("sticker.png")
//!     .generate(&job, Path::new("sticker.docx"))
//!     .expect("Failed to generate sticker");
//! ```

pub mod assembler;
pub mod docx;
pub mod error;
pub mod fiscal;
pub mod fit;
pub mod job;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod order;
pub mod output;
pub mod resources;

// Re-export commonly used items
pub use assembler::{generate, Assembler, StickerImage};
pub use error::{Error, Result};
pub use fit::{fit_font_size, SizeRange};
pub use job::{ProductField, StickerJob, Theme};
