pub mod csv;
pub mod device;
pub mod png;
