use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use warehouse_core::{payload_keys, SchedulerResult, Task, TaskStatus};
use warehouse_domain::{Clock, TaskRepository, WorkerDirectory};

/// 历史扫描页上限
const HISTORY_SCAN_LIMIT: usize = 2000;

/// 无可比数据时的中性时间效率
const NEUTRAL_TIME_EFFICIENCY: f64 = 0.5;

/// 分析时间窗口
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 截止end的最近days天
    pub fn last_days(end: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: end - Duration::days(days),
            end,
        }
    }

    /// 紧邻本窗口之前的等长窗口（用于环比）
    pub fn previous(&self) -> Self {
        let length = self.end - self.start;
        Self {
            start: self.start - length,
            end: self.start,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// 优化分析报告
///
/// 纯咨询性输出，对在线调度无任何影响。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationReport {
    pub window: AnalysisWindow,
    /// `0.4×完成率 + 0.3×时间效率 + 0.3×利用率`
    pub efficiency_score: f64,
    pub completion_rate: f64,
    pub time_efficiency: f64,
    pub worker_utilization: f64,
    pub suggestions: Vec<String>,
    /// 窗口内完成任务的类型分布
    pub task_type_breakdown: BTreeMap<String, usize>,
    /// 各工人当前负载率
    pub worker_load_breakdown: BTreeMap<String, f64>,
    /// 与上一等长窗口的效率环比差值
    pub week_over_week_delta: f64,
}

/// 调度优化器
///
/// 离线/周期性地在历史窗口上产出效率评分与调优建议。
/// 只读，不修改任何任务或工人状态。
pub struct SchedulingOptimizer {
    task_repo: Arc<dyn TaskRepository>,
    directory: Arc<dyn WorkerDirectory>,
    max_tasks_per_worker: i32,
    clock: Arc<dyn Clock>,
}

impl SchedulingOptimizer {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        directory: Arc<dyn WorkerDirectory>,
        max_tasks_per_worker: i32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            task_repo,
            directory,
            max_tasks_per_worker,
            clock,
        }
    }

    /// 分析截止当前时刻的最近days天
    pub async fn analyze_recent_days(&self, days: i64) -> SchedulerResult<OptimizationReport> {
        self.analyze(AnalysisWindow::last_days(self.clock.now(), days))
            .await
    }

    /// 分析指定窗口并产出报告
    pub async fn analyze(&self, window: AnalysisWindow) -> SchedulerResult<OptimizationReport> {
        let completed = self
            .task_repo
            .find_by_status(TaskStatus::Completed, HISTORY_SCAN_LIMIT)
            .await?;
        let failed = self
            .task_repo
            .find_by_status(TaskStatus::Failed, HISTORY_SCAN_LIMIT)
            .await?;
        let workers = self.directory.snapshot().await?;

        let busy_workers = workers
            .iter()
            .filter(|w| w.state.current_workload > 0)
            .count();
        let worker_utilization = if workers.is_empty() {
            0.0
        } else {
            busy_workers as f64 / workers.len() as f64
        };

        let (completion_rate, time_efficiency, task_type_breakdown) =
            window_metrics(&completed, &failed, &window);
        let efficiency_score =
            0.4 * completion_rate + 0.3 * time_efficiency + 0.3 * worker_utilization;

        // 环比：上一窗口用同样的公式，利用率取当前值（无历史负载数据）
        let previous = window.previous();
        let (prev_completion, prev_time, _) = window_metrics(&completed, &failed, &previous);
        let previous_score = 0.4 * prev_completion + 0.3 * prev_time + 0.3 * worker_utilization;
        let week_over_week_delta = efficiency_score - previous_score;

        let mut suggestions = Vec::new();
        if worker_utilization < 0.6 {
            suggestions.push("工人利用率偏低，建议增加任务投放量".to_string());
        }
        if worker_utilization > 0.9 {
            suggestions.push("工人利用率过高，建议增加工人".to_string());
        }

        let worker_load_breakdown: BTreeMap<String, f64> = workers
            .iter()
            .map(|w| {
                (
                    w.state.worker_id.clone(),
                    w.state.load_percentage(self.max_tasks_per_worker),
                )
            })
            .collect();

        info!(
            "优化分析完成: 效率 {:.3} (完成率 {:.3}, 时间效率 {:.3}, 利用率 {:.3}), 环比 {:+.3}",
            efficiency_score, completion_rate, time_efficiency, worker_utilization,
            week_over_week_delta
        );

        Ok(OptimizationReport {
            window,
            efficiency_score,
            completion_rate,
            time_efficiency,
            worker_utilization,
            suggestions,
            task_type_breakdown,
            worker_load_breakdown,
            week_over_week_delta,
        })
    }
}

/// 任务的完结时间：优先completed_at，缺失时退回updated_at
fn finished_at(task: &Task) -> DateTime<Utc> {
    task.completed_at.unwrap_or(task.updated_at)
}

/// 窗口内的完成率、时间效率与类型分布
fn window_metrics(
    completed: &[Task],
    failed: &[Task],
    window: &AnalysisWindow,
) -> (f64, f64, BTreeMap<String, usize>) {
    let completed_in: Vec<&Task> = completed
        .iter()
        .filter(|t| window.contains(finished_at(t)))
        .collect();
    let failed_count = failed
        .iter()
        .filter(|t| window.contains(finished_at(t)))
        .count();

    let finished_total = completed_in.len() + failed_count;
    let completion_rate = if finished_total == 0 {
        0.0
    } else {
        completed_in.len() as f64 / finished_total as f64
    };

    let mut ratios = Vec::new();
    for task in &completed_in {
        if let Some(ratio) = time_efficiency_ratio(task) {
            ratios.push(ratio);
        }
    }
    let time_efficiency = if ratios.is_empty() {
        NEUTRAL_TIME_EFFICIENCY
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };

    let mut task_type_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for task in &completed_in {
        *task_type_breakdown
            .entry(task.task_type.as_str().to_string())
            .or_default() += 1;
    }

    (completion_rate, time_efficiency, task_type_breakdown)
}

/// 单任务的时间效率：预计耗时/实际耗时，上限1.0
///
/// 需要分配时间、完成时间以及payload分配块里的预计完成时间，
/// 任一缺失则该任务不参与统计。
fn time_efficiency_ratio(task: &Task) -> Option<f64> {
    let assigned_at = task.assigned_at?;
    let completed_at = task.completed_at?;
    let estimated_completion = task
        .payload
        .get(payload_keys::ASSIGNMENT)?
        .get("estimated_completion")?
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))?;

    let actual_minutes = (completed_at - assigned_at).num_minutes();
    let estimated_minutes = (estimated_completion - assigned_at).num_minutes();
    if actual_minutes <= 0 || estimated_minutes <= 0 {
        return None;
    }
    Some((estimated_minutes as f64 / actual_minutes as f64).min(1.0))
}
