use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use warehouse_core::{
    PriorityChange, PriorityDistribution, PriorityWeights, SchedulerResult, Task, TaskStatus,
    TaskType,
};
use warehouse_domain::{Clock, TaskRepository};

use crate::observability::StructuredLogger;

/// 资源可用性因子占位分
const RESOURCE_AVAILABILITY_SCORE: f64 = 0.5;
/// 业务影响因子占位分
const BUSINESS_IMPACT_SCORE: f64 = 0.5;

/// 批量重算结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityRecalculation {
    /// 本次实际变更的任务
    pub changes: Vec<PriorityChange>,
    /// 重算后的优先级分桶分布（含未变更任务）
    pub distribution: PriorityDistribution,
    /// 变更幅度 |delta| > 20 的高影响子集
    pub high_impact: Vec<PriorityChange>,
    /// 本次扫描的任务数
    pub scanned: usize,
}

/// 任务优先级计算器
///
/// 基于加权多因子模型计算/重算任务的数值优先级，
/// 结果恒定裁剪到 [1, 100]。同一输入重复计算结果一致，
/// 因此对未变化的任务连续重算产生空变更集。
pub struct TaskPriorityCalculator {
    task_repo: Arc<dyn TaskRepository>,
    weights: PriorityWeights,
    clock: Arc<dyn Clock>,
}

impl TaskPriorityCalculator {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        weights: PriorityWeights,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_repo,
            weights,
            clock,
        }
    }

    /// 任务类型乘数
    fn type_multiplier(task_type: TaskType) -> f64 {
        match task_type {
            TaskType::Quality => 1.2,
            TaskType::Outbound => 1.1,
            TaskType::Inbound => 1.0,
            TaskType::Count => 0.9,
            TaskType::Transfer => 0.8,
        }
    }

    /// 加急因子：加急1.0，高优先级标记0.8，否则0.5
    fn urgency_score(task: &Task) -> f64 {
        if task.is_urgent() {
            1.0
        } else if task.is_high_priority() {
            0.8
        } else {
            0.5
        }
    }

    /// 客户等级因子
    fn customer_score(task: &Task) -> f64 {
        match task.customer_tier() {
            "vip" => 1.0,
            "premium" => 0.8,
            "plus" => 0.6,
            _ => 0.4,
        }
    }

    /// 截止时间因子，按剩余时间分桶；缺失或无法解析取中性0.5
    fn deadline_score(&self, task: &Task) -> f64 {
        let Some(deadline) = task.deadline() else {
            return 0.5;
        };
        let minutes_left = (deadline - self.clock.now()).num_minutes();
        if minutes_left <= 0 {
            1.0
        } else if minutes_left <= 60 {
            0.9
        } else if minutes_left <= 120 {
            0.7
        } else if minutes_left <= 1440 {
            0.5
        } else {
            0.3
        }
    }

    /// 计算任务优先级
    ///
    /// `new = round(base × 类型乘数 × (1 + Σ 因子×权重))`，裁剪到 [1, 100]。
    pub fn calculate(&self, task: &Task) -> i32 {
        let weighted = Self::urgency_score(task) * self.weights.urgency
            + Self::customer_score(task) * self.weights.customer_tier
            + self.deadline_score(task) * self.weights.deadline
            + RESOURCE_AVAILABILITY_SCORE * self.weights.resource
            + BUSINESS_IMPACT_SCORE * self.weights.business_impact;

        let raw = task.priority as f64 * Self::type_multiplier(task.task_type) * (1.0 + weighted);
        (raw.round() as i32).clamp(1, 100)
    }

    /// 批量重算PENDING任务的优先级
    ///
    /// 读取一页有界的PENDING任务，逐个重算，只持久化发生变更的任务，
    /// 返回变更集、优先级分桶分布和高影响子集。
    pub async fn recalculate_pending(
        &self,
        limit: usize,
    ) -> SchedulerResult<PriorityRecalculation> {
        let tasks = self
            .task_repo
            .find_by_status(TaskStatus::Pending, limit)
            .await?;
        let scanned = tasks.len();
        info!("开始重算 {} 个PENDING任务的优先级", scanned);

        let now = self.clock.now();
        let mut changes = Vec::new();
        let mut distribution = PriorityDistribution::default();

        for mut task in tasks {
            let old_priority = task.priority;
            let new_priority = self.calculate(&task);
            distribution.record(new_priority);

            if new_priority == old_priority {
                continue;
            }

            task.set_priority(new_priority);
            task.updated_at = now;
            self.task_repo.save(&task, false).await?;

            debug!(
                "任务 {} 优先级调整: {} -> {}",
                task.id, old_priority, new_priority
            );
            changes.push(PriorityChange {
                task_id: task.id,
                task_type: task.task_type,
                old_priority,
                new_priority,
            });
        }

        let high_impact: Vec<PriorityChange> = changes
            .iter()
            .filter(|c| c.is_high_impact())
            .cloned()
            .collect();

        StructuredLogger::log_priority_recalculated(scanned, changes.len(), high_impact.len());
        Ok(PriorityRecalculation {
            changes,
            distribution,
            high_impact,
            scanned,
        })
    }
}
