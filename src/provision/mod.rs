mod logic;
mod modify;
pub mod validation;

pub use logic::{create_instance, wait_until_available};
pub(crate) use logic::endpoint_address;
pub use modify::modify_instance;
pub use validation::{validate_create_params, validate_modify_params};
