pub mod delivery;
pub mod job;

pub use delivery::DeliveryResult;
pub use job::{InputSpec, RenderJob, ResourceSpec};
