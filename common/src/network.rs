pub mod address;
pub mod compress;
pub mod range;
pub mod target;
