pub mod checks;
pub mod orders;
