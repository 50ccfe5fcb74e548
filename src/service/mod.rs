pub mod attendance;
pub mod audit;
pub mod leave;
pub mod notification;

/// Who triggered an operation and where the request came from.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub origin: Option<String>,
}
