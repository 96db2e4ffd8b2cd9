use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use warehouse_core::{SchedulerResult, SkillCategory, Task, TaskStatus, WorkerSnapshot};
use warehouse_domain::{Clock, TaskRepository, WorkerDirectory};

use crate::skill_matcher::SkillMatcher;

/// 单次快照的扫描页上限
const SCAN_LIMIT: usize = 1000;

/// 某项技能的积压超过可用工人数的该倍数时视为拥塞
const CONGESTION_FACTOR: usize = 5;

/// 队列健康等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueueHealth {
    #[serde(rename = "healthy")]
    Healthy,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "critical")]
    Critical,
}

impl QueueHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueHealth::Healthy => "healthy",
            QueueHealth::Warning => "warning",
            QueueHealth::Critical => "critical",
        }
    }
}

/// 队列健康快照
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueHealthSnapshot {
    pub pending_count: usize,
    /// ASSIGNED + IN_PROGRESS
    pub active_count: usize,
    /// 有负载的工人占全部工人的比例
    pub worker_utilization: f64,
    pub average_wait_minutes: f64,
    pub median_wait_minutes: i64,
    pub max_wait_minutes: i64,
    /// 描述性瓶颈列表（启发式）
    pub bottlenecks: Vec<String>,
    pub health: QueueHealth,
    pub captured_at: DateTime<Utc>,
}

/// 队列监控器
///
/// 无状态的只读健康快照，不影响调度决策。
pub struct QueueMonitor {
    task_repo: Arc<dyn TaskRepository>,
    directory: Arc<dyn WorkerDirectory>,
    clock: Arc<dyn Clock>,
}

impl QueueMonitor {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        directory: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_repo,
            directory,
            clock,
        }
    }

    pub async fn snapshot(&self) -> SchedulerResult<QueueHealthSnapshot> {
        let now = self.clock.now();
        let pending = self
            .task_repo
            .find_by_status(TaskStatus::Pending, SCAN_LIMIT)
            .await?;
        let assigned = self
            .task_repo
            .find_by_status(TaskStatus::Assigned, SCAN_LIMIT)
            .await?;
        let in_progress = self
            .task_repo
            .find_by_status(TaskStatus::InProgress, SCAN_LIMIT)
            .await?;
        let workers = self.directory.snapshot().await?;

        let pending_count = pending.len();
        let active_count = assigned.len() + in_progress.len();

        let busy_workers = workers
            .iter()
            .filter(|w| w.state.current_workload > 0)
            .count();
        let worker_utilization = if workers.is_empty() {
            0.0
        } else {
            busy_workers as f64 / workers.len() as f64
        };

        let mut waits: Vec<i64> = pending.iter().map(|t| t.wait_minutes(now)).collect();
        waits.sort_unstable();
        let average_wait_minutes = if waits.is_empty() {
            0.0
        } else {
            waits.iter().sum::<i64>() as f64 / waits.len() as f64
        };
        let median_wait_minutes = if waits.is_empty() {
            0
        } else {
            waits[waits.len() / 2]
        };
        let max_wait_minutes = waits.last().copied().unwrap_or(0);

        let bottlenecks = detect_bottlenecks(&pending, &workers, now);

        let health = if worker_utilization > 0.9 || pending_count > 50 {
            QueueHealth::Critical
        } else if worker_utilization > 0.7 || pending_count > 20 {
            QueueHealth::Warning
        } else {
            QueueHealth::Healthy
        };

        debug!(
            "队列快照: 积压 {}, 活跃 {}, 工人利用率 {:.2}, 健康度 {}",
            pending_count,
            active_count,
            worker_utilization,
            health.as_str()
        );

        Ok(QueueHealthSnapshot {
            pending_count,
            active_count,
            worker_utilization,
            average_wait_minutes,
            median_wait_minutes,
            max_wait_minutes,
            bottlenecks,
            health,
            captured_at: now,
        })
    }
}

/// 按技能维度的瓶颈启发式
///
/// 对每项被积压任务需要的技能：没有任何可用工人覆盖则报短缺；
/// 积压量超过覆盖工人数的 [`CONGESTION_FACTOR`] 倍则报拥塞。
fn detect_bottlenecks(
    pending: &[Task],
    workers: &[WorkerSnapshot],
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut demand: BTreeMap<SkillCategory, usize> = BTreeMap::new();
    for task in pending {
        for category in SkillMatcher::required_skills(task) {
            *demand.entry(category).or_default() += 1;
        }
    }

    let mut bottlenecks = Vec::new();
    for (category, backlog) in demand {
        let covering = workers
            .iter()
            .filter(|w| w.state.is_available() && w.best_profile(category, now).is_some())
            .count();
        if covering == 0 {
            bottlenecks.push(format!(
                "技能短缺: {} (积压 {} 个任务，无可用工人覆盖)",
                category.as_str(),
                backlog
            ));
        } else if backlog > covering * CONGESTION_FACTOR {
            bottlenecks.push(format!(
                "技能拥塞: {} (积压 {} 个任务，仅 {} 名可用工人覆盖)",
                category.as_str(),
                backlog,
                covering
            ));
        }
    }
    bottlenecks
}
