//! # 调度服务集群
//!
//! 决定哪个工人执行哪个任务、以什么顺序、什么优先级，
//! 以及紧急任务如何打断正常流程。
//!
//! 叶子评分原语自底向上组合：
//! [`SkillMatcher`] 与 [`LoadBalancer`] 给出单维度评分，
//! [`WorkerAssignmentEngine`] 将其组合为单任务的最优工人选择，
//! [`BatchScheduler`] 按优先级排序批量分配，
//! [`UrgentTaskHandler`] 可在任意时刻打断正常批次，
//! [`QueueMonitor`] 与 [`SchedulingOptimizer`] 只读观测结果状态。

pub mod batch;
pub mod engine;
pub mod load_balancer;
pub mod observability;
pub mod optimizer;
pub mod performance;
pub mod priority;
pub mod queue_monitor;
pub mod skill_matcher;
pub mod urgent;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod load_balancer_test;
#[cfg(test)]
mod skill_matcher_test;
#[cfg(test)]
mod urgent_test;

pub use batch::{BatchScheduleResult, BatchScheduler, BatchStatistics, WorkloadSnapshot};
pub use engine::WorkerAssignmentEngine;
pub use load_balancer::LoadBalancer;
pub use observability::StructuredLogger;
pub use optimizer::{AnalysisWindow, OptimizationReport, SchedulingOptimizer};
pub use performance::PerformanceAnalyzer;
pub use priority::{PriorityRecalculation, TaskPriorityCalculator};
pub use queue_monitor::{QueueHealth, QueueHealthSnapshot, QueueMonitor};
pub use skill_matcher::{
    SkillAssignment, SkillAssignmentOptions, SkillAxisScores, SkillMatcher,
};
pub use urgent::{
    HandlingStrategy, LowestPriorityPreemption, PreemptionPolicy, UrgentHandlingResult,
    UrgentTaskHandler, UrgentTaskOptions,
};
