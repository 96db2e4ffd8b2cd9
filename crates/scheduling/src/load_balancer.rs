use tracing::debug;

use warehouse_core::{AssignmentConfig, WorkerSnapshot};

/// 负载均衡器
///
/// 在评分之前先按容量和可用性过滤工人，并为剩余容量打分。
#[derive(Debug, Clone)]
pub struct LoadBalancer {
    max_tasks_per_worker: i32,
}

impl LoadBalancer {
    pub fn new(config: &AssignmentConfig) -> Self {
        Self {
            max_tasks_per_worker: config.max_tasks_per_worker,
        }
    }

    pub fn with_capacity(max_tasks_per_worker: i32) -> Self {
        Self {
            max_tasks_per_worker,
        }
    }

    pub fn max_tasks_per_worker(&self) -> i32 {
        self.max_tasks_per_worker
    }

    /// 过滤出可接受新任务的工人
    ///
    /// 保留 `current_workload < max_tasks_per_worker` 且可用性为AVAILABLE的工人。
    pub fn filter_eligible<'a>(&self, workers: &'a [WorkerSnapshot]) -> Vec<&'a WorkerSnapshot> {
        let eligible: Vec<&WorkerSnapshot> = workers
            .iter()
            .filter(|w| w.state.can_accept_task(self.max_tasks_per_worker))
            .collect();

        if eligible.is_empty() {
            debug!("没有满足容量与可用性条件的工人");
        }
        eligible
    }

    /// 负载余量评分
    ///
    /// 线性衰减：零负载得1.0，达到容量得0.0。
    pub fn workload_score(&self, current_workload: i32) -> f64 {
        if self.max_tasks_per_worker <= 0 {
            return 0.0;
        }
        (1.0 - current_workload as f64 / self.max_tasks_per_worker as f64).clamp(0.0, 1.0)
    }
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new(&AssignmentConfig::default())
    }
}
