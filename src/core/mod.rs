pub mod constraints;
pub mod errors;
pub mod types;

pub use constraints::{
    clamp_to_bounds, validate_bounds, validate_config, validate_parameters, validate_run,
    violation_amounts,
};
pub use errors::{OptError, OptResult};
pub use types::*;
