pub mod clock;
pub mod device_status;
pub mod models;
pub mod signature;
