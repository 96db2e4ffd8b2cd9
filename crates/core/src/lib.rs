pub mod config;
pub mod errors;
pub mod models;

pub use config::*;
pub use errors::*;
pub use models::{
    payload_keys, AssignmentFactors, AssignmentResult, PriorityChange, PriorityDistribution,
    SkillCategory, Task, TaskStatus, TaskType, WorkerAvailability, WorkerRuntimeState,
    WorkerSkillProfile, WorkerSnapshot,
};

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
