pub mod geo;
pub mod policy;

pub use policy::{Assessment, Target, Thresholds, evaluate};
