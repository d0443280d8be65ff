mod logic; // Restore and clone flows built on the provisioner's polling

pub use logic::{duplicate_instance, restore_from_snapshot};
