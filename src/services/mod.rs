pub mod keywords;
pub mod metrics_manager;
pub mod normalize;
pub mod phrases;
pub mod relay;
pub mod session_manager;
