mod config;
mod parser;
mod value;

pub use config::{
    Constraints, FieldConfig, FieldKind, StatusCategory, StatusOverride, StatusOverrides,
};
pub use parser::{parse_field_config, parse_field_configs};
pub use value::{Dimensions, FieldValue, UploadCandidate};
