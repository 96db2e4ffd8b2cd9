use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use warehouse_core::{
    AssignmentFactors, AssignmentResult, CategoryWeights, SchedulerError, SchedulerResult,
    SkillCategory, Task, WorkerSnapshot,
};
use warehouse_domain::Clock;

use crate::load_balancer::LoadBalancer;
use crate::skill_matcher::{estimate_task_minutes, skill_match_score, SkillMatcher};

/// 引擎的固定组合权重
const SKILL_WEIGHT: f64 = 0.4;
const WORKLOAD_WEIGHT: f64 = 0.3;
const PRIORITY_WEIGHT: f64 = 0.1;

/// 技能完全不匹配时的兜底预计耗时（分钟）
const FALLBACK_ESTIMATE_MINUTES: i64 = 60;

/// 工人分配引擎
///
/// 将技能匹配、负载余量和任务优先级组合为单一的最优工人选择。
/// 纯函数式：不修改任务状态，结果由调用方应用。
#[derive(Clone)]
pub struct WorkerAssignmentEngine {
    load_balancer: LoadBalancer,
    category_weights: CategoryWeights,
    clock: Arc<dyn Clock>,
}

impl WorkerAssignmentEngine {
    pub fn new(
        load_balancer: LoadBalancer,
        category_weights: CategoryWeights,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            load_balancer,
            category_weights,
            clock,
        }
    }

    /// 为任务选择最优工人
    ///
    /// 先经负载均衡器过滤，再按 `0.4×技能 + 0.3×负载 + 0.1×min(1, 优先级/100)`
    /// 对每个合格工人评分并取最大值。得分并列时选择遍历顺序中先遇到的
    /// 工人（即输入切片中靠前者）。
    ///
    /// 没有合格工人返回 `Ok(None)`；仅当过滤产出了候选而评分没有产出
    /// 最优者时才返回内部错误，该分支在合法输入下不会触发。
    pub fn assign(
        &self,
        task: &Task,
        workers: &[WorkerSnapshot],
    ) -> SchedulerResult<Option<AssignmentResult>> {
        let eligible = self.load_balancer.filter_eligible(workers);
        if eligible.is_empty() {
            debug!("任务 {} 没有合格工人可分配", task.id);
            return Ok(None);
        }

        let now = self.clock.now();
        let required = SkillMatcher::required_skills(task);
        let priority_term = (task.priority as f64 / 100.0).min(1.0);

        let mut best: Option<(f64, AssignmentFactors, &WorkerSnapshot)> = None;
        for worker in &eligible {
            let (total, factors) = self.score_worker(&required, priority_term, worker, now);
            if best.as_ref().map(|(score, _, _)| total > *score).unwrap_or(true) {
                best = Some((total, factors, worker));
            }
        }

        let Some((score, factors, worker)) = best else {
            // 过滤产出了候选但评分没有选出任何工人：不可达的防御分支
            return Err(SchedulerError::Internal(format!(
                "任务 {} 的评分未能从 {} 个合格工人中选出最优者",
                task.id,
                eligible.len()
            )));
        };

        debug!(
            "任务 {} 选中工人 {} (得分 {:.3}, 技能 {:.3}, 负载 {:.3})",
            task.id,
            worker.worker_id(),
            score,
            factors.skill,
            factors.workload
        );

        Ok(Some(self.build_result(task, worker, score, factors, &required, now)))
    }

    /// 不经合格性过滤，直接对指定工人评分并构造分配结果
    ///
    /// 抢占路径使用：被回收的工人按当前快照看是满载/忙碌的，
    /// 正常过滤不会放行。
    pub fn evaluate_worker(&self, task: &Task, worker: &WorkerSnapshot) -> AssignmentResult {
        let now = self.clock.now();
        let required = SkillMatcher::required_skills(task);
        let priority_term = (task.priority as f64 / 100.0).min(1.0);
        let (score, factors) = self.score_worker(&required, priority_term, worker, now);
        self.build_result(task, worker, score, factors, &required, now)
    }

    fn score_worker(
        &self,
        required: &[SkillCategory],
        priority_term: f64,
        worker: &WorkerSnapshot,
        now: DateTime<Utc>,
    ) -> (f64, AssignmentFactors) {
        let skill = skill_match_score(required, &worker.profiles, &self.category_weights, now);
        let workload = self
            .load_balancer
            .workload_score(worker.state.current_workload);
        let total =
            SKILL_WEIGHT * skill + WORKLOAD_WEIGHT * workload + PRIORITY_WEIGHT * priority_term;
        (
            total,
            AssignmentFactors {
                skill,
                workload,
                priority: priority_term,
            },
        )
    }

    fn build_result(
        &self,
        task: &Task,
        worker: &WorkerSnapshot,
        score: f64,
        factors: AssignmentFactors,
        required: &[SkillCategory],
        now: DateTime<Utc>,
    ) -> AssignmentResult {
        let estimated_minutes = worker
            .profiles
            .iter()
            .filter(|p| required.contains(&p.category) && p.is_usable(now))
            .map(|p| p.level)
            .max()
            .map(estimate_task_minutes)
            .unwrap_or(FALLBACK_ESTIMATE_MINUTES);

        AssignmentResult {
            task_id: task.id,
            worker_id: worker.worker_id().to_string(),
            match_score: score,
            factors,
            assigned_at: now,
            estimated_completion: now + Duration::minutes(estimated_minutes),
        }
    }
}
