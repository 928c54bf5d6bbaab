pub mod api;
pub mod csv_export;
pub mod db;
pub mod tuya_cloud;
