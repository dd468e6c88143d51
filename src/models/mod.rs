pub mod appeal;
pub mod attendance;
pub mod notification;
pub mod position;
pub mod task;
pub mod verdict;
pub mod verification;
pub mod zone;
