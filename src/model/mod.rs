pub mod attendance;
pub mod audit_log;
pub mod holiday;
pub mod leave_request;
pub mod notification;
pub mod role;
