pub mod appeal;
pub mod attendance;
pub mod context;
pub mod history;
pub mod log;
pub mod notify;
pub mod task;
pub mod verification;
pub mod zones;
