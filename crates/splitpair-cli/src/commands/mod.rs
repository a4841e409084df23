pub mod curve;
pub mod restart;
pub mod table;
