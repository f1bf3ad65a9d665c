mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{
    load_field_configs, parse_document_str, read_document, read_field_configs,
};
pub use output::render_document;
