pub mod federated;
pub mod notifications;
pub mod repositories;
