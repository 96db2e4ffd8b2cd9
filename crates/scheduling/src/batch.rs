use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use warehouse_core::{AssignmentResult, SchedulerResult, Task, TaskStatus, WorkerSnapshot};
use warehouse_domain::{Clock, TaskRepository, WorkerDirectory};

use crate::engine::WorkerAssignmentEngine;
use crate::observability::StructuredLogger;

/// 未分配比例超过该阈值时建议复核优先级策略
const UNASSIGNED_RATIO_THRESHOLD: f64 = 0.3;

/// 批次内的工人负载快照
///
/// 在批次开始时一次性捕获，之后每次成功分配通过 [`Self::with_assignment`]
/// 推进出下一份快照，而不是原地修改共享map，后续任务看到的是
/// 已扣减的余量。
#[derive(Debug, Clone)]
pub struct WorkloadSnapshot {
    workers: Vec<WorkerSnapshot>,
    max_tasks_per_worker: i32,
}

impl WorkloadSnapshot {
    pub fn new(workers: Vec<WorkerSnapshot>, max_tasks_per_worker: i32) -> Self {
        Self {
            workers,
            max_tasks_per_worker,
        }
    }

    pub fn workers(&self) -> &[WorkerSnapshot] {
        &self.workers
    }

    /// 记录一次分配，返回推进后的新快照
    pub fn with_assignment(&self, worker_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(worker) = next
            .workers
            .iter_mut()
            .find(|w| w.state.worker_id == worker_id)
        {
            worker.state.current_workload += 1;
        }
        next
    }

    /// 各工人当前负载率
    pub fn utilization_map(&self) -> BTreeMap<String, f64> {
        self.workers
            .iter()
            .map(|w| {
                (
                    w.state.worker_id.clone(),
                    w.state.load_percentage(self.max_tasks_per_worker),
                )
            })
            .collect()
    }
}

/// 批次统计
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchStatistics {
    pub total_tasks: usize,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub assignment_rate: f64,
    pub average_match_score: f64,
    pub processing_time_ms: u64,
    pub utilization_before: BTreeMap<String, f64>,
    pub utilization_after: BTreeMap<String, f64>,
}

/// 批量调度结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchScheduleResult {
    pub batch_id: Uuid,
    pub assignments: Vec<AssignmentResult>,
    pub unassigned_task_ids: Vec<i64>,
    pub statistics: BatchStatistics,
    pub recommendations: Vec<String>,
}

impl BatchScheduleResult {
    fn empty(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            assignments: Vec::new(),
            unassigned_task_ids: Vec::new(),
            statistics: BatchStatistics::default(),
            recommendations: Vec::new(),
        }
    }
}

/// 批量调度器
///
/// 按优先级降序贪心地逐个分配任务：每次分配立即扣减所选工人的
/// 余量，后续任务基于扣减后的快照决策。在线贪心算法，不保证
/// 全局最优。
pub struct BatchScheduler {
    engine: WorkerAssignmentEngine,
    task_repo: Arc<dyn TaskRepository>,
    directory: Arc<dyn WorkerDirectory>,
    max_tasks_per_worker: i32,
    clock: Arc<dyn Clock>,
}

impl BatchScheduler {
    pub fn new(
        engine: WorkerAssignmentEngine,
        task_repo: Arc<dyn TaskRepository>,
        directory: Arc<dyn WorkerDirectory>,
        max_tasks_per_worker: i32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            task_repo,
            directory,
            max_tasks_per_worker,
            clock,
        }
    }

    /// 读取一页PENDING任务并批量调度
    pub async fn schedule_pending(&self, limit: usize) -> SchedulerResult<BatchScheduleResult> {
        let tasks = self
            .task_repo
            .find_by_status(TaskStatus::Pending, limit)
            .await?;
        self.schedule_batch(tasks).await
    }

    /// 批量调度一组待分配任务
    ///
    /// 空输入直接返回全零统计。任务按优先级降序排序（稳定排序，
    /// 同优先级保持输入顺序），依次对当前负载快照调用引擎分配。
    pub async fn schedule_batch(&self, mut tasks: Vec<Task>) -> SchedulerResult<BatchScheduleResult> {
        let batch_id = Uuid::new_v4();
        if tasks.is_empty() {
            info!("批次 {} 没有待调度任务", batch_id);
            return Ok(BatchScheduleResult::empty(batch_id));
        }

        let started = Instant::now();
        let total_tasks = tasks.len();
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut snapshot = WorkloadSnapshot::new(
            self.directory.snapshot().await?,
            self.max_tasks_per_worker,
        );
        let utilization_before = snapshot.utilization_map();

        let mut assignments: Vec<AssignmentResult> = Vec::new();
        let mut unassigned_task_ids: Vec<i64> = Vec::new();
        let now = self.clock.now();

        for mut task in tasks {
            if !task.is_pending() {
                warn!(
                    "任务 {} 状态为 {}，不是PENDING，跳过分配",
                    task.id,
                    task.status.as_str()
                );
                unassigned_task_ids.push(task.id);
                continue;
            }

            match self.engine.assign(&task, snapshot.workers())? {
                Some(result) => {
                    task.record_assignment(&result);
                    task.updated_at = now;
                    self.task_repo.save(&task, false).await?;

                    snapshot = snapshot.with_assignment(&result.worker_id);
                    StructuredLogger::log_task_assigned(
                        task.id,
                        &result.worker_id,
                        result.match_score,
                    );
                    assignments.push(result);
                }
                None => {
                    unassigned_task_ids.push(task.id);
                }
            }
        }

        let assigned_count = assignments.len();
        let unassigned_count = unassigned_task_ids.len();
        let assignment_rate = assigned_count as f64 / total_tasks as f64;
        let average_match_score = if assigned_count == 0 {
            0.0
        } else {
            assignments.iter().map(|a| a.match_score).sum::<f64>() / assigned_count as f64
        };

        let mut recommendations = Vec::new();
        if unassigned_count > 0 {
            recommendations.push("存在未分配任务，建议增加可用工人或扩充容量".to_string());
        }
        if unassigned_count as f64 / total_tasks as f64 > UNASSIGNED_RATIO_THRESHOLD {
            recommendations.push("未分配比例超过30%，建议复核任务优先级策略".to_string());
        }

        let statistics = BatchStatistics {
            total_tasks,
            assigned_count,
            unassigned_count,
            assignment_rate,
            average_match_score,
            processing_time_ms: started.elapsed().as_millis() as u64,
            utilization_before,
            utilization_after: snapshot.utilization_map(),
        };

        StructuredLogger::log_batch_completed(
            batch_id,
            total_tasks,
            assigned_count,
            assignment_rate,
            statistics.processing_time_ms,
        );

        Ok(BatchScheduleResult {
            batch_id,
            assignments,
            unassigned_task_ids,
            statistics,
            recommendations,
        })
    }
}
