mod debounce;
mod error;
mod field;
mod state;
mod validation;
pub mod validators;

pub use debounce::Debouncer;
pub use error::{FieldError, ValidationResult};
pub use field::{Field, FieldEvent};
pub use state::FormState;
pub use validation::{FormOutcome, validate_form};
pub use validators::{FieldValidator, Validator};
