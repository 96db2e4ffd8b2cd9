use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use warehouse_core::{
    payload_keys, AssignmentResult, SchedulerResult, Task, TaskStatus, UrgentConfig,
    WorkerSnapshot,
};
use warehouse_domain::{Clock, TaskRepository, WorkerDirectory};

use crate::engine::WorkerAssignmentEngine;
use crate::observability::StructuredLogger;
use crate::skill_matcher::SkillMatcher;

/// 查询活跃任务时的页上限
const ACTIVE_SCAN_LIMIT: usize = 500;

/// 紧急处理策略标签
///
/// 仅用于可观测性，不改变任务状态机。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandlingStrategy {
    #[serde(rename = "immediate_preemption")]
    ImmediatePreemption,
    #[serde(rename = "immediate_assignment")]
    ImmediateAssignment,
    #[serde(rename = "priority_queue")]
    PriorityQueue,
    #[serde(rename = "standard_queue")]
    StandardQueue,
}

impl HandlingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlingStrategy::ImmediatePreemption => "immediate_preemption",
            HandlingStrategy::ImmediateAssignment => "immediate_assignment",
            HandlingStrategy::PriorityQueue => "priority_queue",
            HandlingStrategy::StandardQueue => "standard_queue",
        }
    }
}

/// 紧急任务处理选项
#[derive(Debug, Clone)]
pub struct UrgentTaskOptions {
    /// 强制设置的优先级
    pub priority: i32,
    /// 可容忍的最大延迟
    pub max_delay_minutes: i64,
    /// 是否允许抢占
    pub preempt_allowed: bool,
}

/// 紧急任务处理结果
#[derive(Debug, Clone)]
pub struct UrgentHandlingResult {
    /// 更新后的紧急任务
    pub task: Task,
    pub assignment: Option<AssignmentResult>,
    /// 抢占路径下被重新排队的任务
    pub displaced_task: Option<Task>,
    pub handling_strategy: HandlingStrategy,
    pub estimated_start: DateTime<Utc>,
}

/// 抢占选择策略
///
/// 从活跃任务中挑选被抢占者。返回None表示没有可抢占对象。
pub trait PreemptionPolicy: Send + Sync {
    fn select_victim(
        &self,
        urgent_task: &Task,
        active_tasks: &[Task],
        workers: &[WorkerSnapshot],
        now: DateTime<Utc>,
    ) -> Option<Task>;
}

/// 默认抢占策略：最低优先级的技能兼容活跃任务
///
/// 候选必须同时满足：
/// 1. 状态为ASSIGNED或IN_PROGRESS且已有分配工人；
/// 2. 优先级严格低于紧急任务；
/// 3. 其分配工人覆盖紧急任务所需技能中的至少一项。
///
/// 在候选中取优先级最低者，并列时取分配时间最早者。
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestPriorityPreemption;

impl PreemptionPolicy for LowestPriorityPreemption {
    fn select_victim(
        &self,
        urgent_task: &Task,
        active_tasks: &[Task],
        workers: &[WorkerSnapshot],
        now: DateTime<Utc>,
    ) -> Option<Task> {
        let required = SkillMatcher::required_skills(urgent_task);

        active_tasks
            .iter()
            .filter(|t| t.is_active() && t.priority < urgent_task.priority)
            .filter(|t| {
                let Some(worker_id) = t.assigned_worker_id.as_deref() else {
                    return false;
                };
                workers
                    .iter()
                    .find(|w| w.worker_id() == worker_id)
                    .map(|w| required.is_empty() || w.covers_any(&required, now))
                    .unwrap_or(false)
            })
            .min_by_key(|t| (t.priority, t.assigned_at))
            .cloned()
    }
}

/// 紧急任务处理器
///
/// 绕过正常批次排序：先尝试立即分配，失败且允许抢占时回收一个
/// 低优先级活跃任务的工人，否则留在队列中等待下一个批次。
pub struct UrgentTaskHandler {
    engine: WorkerAssignmentEngine,
    task_repo: Arc<dyn TaskRepository>,
    directory: Arc<dyn WorkerDirectory>,
    policy: Arc<dyn PreemptionPolicy>,
    config: UrgentConfig,
    clock: Arc<dyn Clock>,
}

impl UrgentTaskHandler {
    pub fn new(
        engine: WorkerAssignmentEngine,
        task_repo: Arc<dyn TaskRepository>,
        directory: Arc<dyn WorkerDirectory>,
        policy: Arc<dyn PreemptionPolicy>,
        config: UrgentConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            task_repo,
            directory,
            policy,
            config,
            clock,
        }
    }

    /// 处理紧急任务
    ///
    /// 强制设置优先级并在payload上打加急戳，然后依次尝试：
    /// 立即分配 → 抢占（如果允许）→ 排队。排队路径按
    /// `max_delay_minutes` 与阈值的关系打 `priority_queue` 或
    /// `standard_queue` 标签。
    pub async fn handle_urgent_task(
        &self,
        mut task: Task,
        options: &UrgentTaskOptions,
    ) -> SchedulerResult<UrgentHandlingResult> {
        let now = self.clock.now();
        task.set_priority(options.priority);
        task.set_payload_entry(payload_keys::URGENT, serde_json::json!(true));
        task.set_payload_entry(
            payload_keys::ESCALATED_AT,
            serde_json::json!(now.to_rfc3339()),
        );
        task.set_payload_entry(
            payload_keys::MAX_DELAY_MINUTES,
            serde_json::json!(options.max_delay_minutes),
        );
        task.updated_at = now;

        let workers = self.directory.snapshot().await?;

        // 1. 立即分配
        if let Some(result) = self.engine.assign(&task, &workers)? {
            task.record_assignment(&result);
            self.task_repo.save(&task, true).await?;

            let estimated_start = now + Duration::minutes(self.config.assignment_start_minutes);
            StructuredLogger::log_urgent_task_handled(
                task.id,
                HandlingStrategy::ImmediateAssignment.as_str(),
                None,
            );
            return Ok(UrgentHandlingResult {
                task,
                assignment: Some(result),
                displaced_task: None,
                handling_strategy: HandlingStrategy::ImmediateAssignment,
                estimated_start,
            });
        }

        // 2. 抢占
        if options.preempt_allowed {
            if let Some(result) = self.try_preemption(&mut task, &workers, now).await? {
                return Ok(result);
            }
            warn!("任务 {} 允许抢占但没有可抢占的活跃任务", task.id);
        }

        // 3. 排队等待下一个批次
        self.task_repo.save(&task, false).await?;
        let handling_strategy =
            if options.max_delay_minutes < self.config.priority_queue_threshold_minutes {
                HandlingStrategy::PriorityQueue
            } else {
                HandlingStrategy::StandardQueue
            };
        let estimated_start = now + Duration::minutes(self.config.queued_start_minutes);

        info!(
            "紧急任务 {} 暂无可用工人，进入{}等待",
            task.id,
            handling_strategy.as_str()
        );
        StructuredLogger::log_urgent_task_handled(task.id, handling_strategy.as_str(), None);
        Ok(UrgentHandlingResult {
            task,
            assignment: None,
            displaced_task: None,
            handling_strategy,
            estimated_start,
        })
    }

    async fn try_preemption(
        &self,
        task: &mut Task,
        workers: &[WorkerSnapshot],
        now: DateTime<Utc>,
    ) -> SchedulerResult<Option<UrgentHandlingResult>> {
        let mut active_tasks = self
            .task_repo
            .find_by_status(TaskStatus::Assigned, ACTIVE_SCAN_LIMIT)
            .await?;
        active_tasks.extend(
            self.task_repo
                .find_by_status(TaskStatus::InProgress, ACTIVE_SCAN_LIMIT)
                .await?,
        );

        let Some(mut victim) = self
            .policy
            .select_victim(task, &active_tasks, workers, now)
        else {
            return Ok(None);
        };
        // 策略保证被抢占任务已有分配工人
        let Some(worker_id) = victim.assigned_worker_id.clone() else {
            return Ok(None);
        };
        let Some(worker) = workers.iter().find(|w| w.worker_id() == worker_id) else {
            return Ok(None);
        };

        info!(
            "紧急任务 {} 抢占工人 {}：任务 {} (优先级 {}) 被重新排队",
            task.id, worker_id, victim.id, victim.priority
        );

        victim.requeue(now);
        self.task_repo.save(&victim, true).await?;

        let result = self.engine.evaluate_worker(task, worker);
        task.record_assignment(&result);
        self.task_repo.save(task, true).await?;

        let estimated_start = now + Duration::minutes(self.config.preemption_start_minutes);
        StructuredLogger::log_urgent_task_handled(
            task.id,
            HandlingStrategy::ImmediatePreemption.as_str(),
            Some(victim.id),
        );
        Ok(Some(UrgentHandlingResult {
            task: task.clone(),
            assignment: Some(result),
            displaced_task: Some(victim),
            handling_strategy: HandlingStrategy::ImmediatePreemption,
            estimated_start,
        }))
    }
}
