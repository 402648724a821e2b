pub mod followup_service;

pub use followup_service::FollowupService;
