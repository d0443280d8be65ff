mod logic;

pub use logic::delete_instance;
