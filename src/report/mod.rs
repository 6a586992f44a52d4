//! Report layout and rendering.

pub mod generator;
pub mod layout;

pub use generator::{generate_json_report, generate_markdown_report, write_document};
pub use layout::LayoutOptions;
