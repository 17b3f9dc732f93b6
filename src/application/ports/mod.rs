pub mod inbound;
pub mod session_ports;
pub mod storage_ports;
pub mod transform_ports;
pub mod trash_ports;
