//! Output formatting for explanations and errors.

mod render;

pub use render::{format_parse_error, render_json, render_text};
