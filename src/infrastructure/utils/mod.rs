pub mod get_client_ip;
pub mod request_probe;
pub mod sanitize;
