//! Formatting and extraction for semi-structured LLM prose.
//!
//! Raw model output goes through [`parser::sanitize`], then either the
//! block pipeline ([`parser::blocks`] → [`parser::document`] → [`render`])
//! or the extractors ([`parser::sections`], [`parser::extract`]).

pub mod parser;
pub mod profile;
pub mod render;
pub mod response;

pub use parser::{format_text, process_response, Report};
pub use profile::Profile;
pub use render::Theme;
