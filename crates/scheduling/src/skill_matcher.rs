use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use warehouse_core::{
    payload_keys, AxisWeights, CategoryWeights, SchedulerResult, ScoringAxis, SkillCategory,
    Task, TaskType, WorkerSkillProfile,
};
use warehouse_domain::{Clock, WorkerDirectory, WorkerSkillRepository};

use crate::load_balancer::LoadBalancer;
use crate::performance::PerformanceAnalyzer;

/// 空需求基线分：任务推导不出任何所需技能时的常量匹配分
pub const EMPTY_REQUIREMENT_BASELINE: f64 = 0.8;

/// 位置维度占位分（位置建模在本子系统范围之外）
pub const LOCATION_PLACEHOLDER_SCORE: f64 = 0.5;

/// 目录中查不到运行时状态的工人取中性负载分
const UNKNOWN_WORKLOAD_SCORE: f64 = 0.5;

/// 按最佳匹配技能等级估算的任务耗时（分钟）
pub fn estimate_task_minutes(level: i32) -> i64 {
    (60.0 / (level as f64 / 10.0).max(0.5)).round() as i64
}

/// 计算一组档案对所需技能的匹配分
///
/// 空需求返回 [`EMPTY_REQUIREMENT_BASELINE`]。否则对每项所需技能取
/// 最佳可用档案的 `类别权重 × (等级/10) × (评分/100)`，
/// 最终分 = 各项最佳分的平均值 × 覆盖率，未覆盖的技能既按0计入
/// 平均值，又降低覆盖率。
pub fn skill_match_score(
    required: &[SkillCategory],
    profiles: &[WorkerSkillProfile],
    weights: &CategoryWeights,
    now: DateTime<Utc>,
) -> f64 {
    if required.is_empty() {
        return EMPTY_REQUIREMENT_BASELINE;
    }

    let mut sum = 0.0;
    let mut matched = 0usize;
    for category in required {
        let best = profiles
            .iter()
            .filter(|p| p.category == *category && p.is_usable(now))
            .map(|p| {
                weights.weight_for(*category) * (p.level as f64 / 10.0) * (p.score as f64 / 100.0)
            })
            .fold(None::<f64>, |acc, s| match acc {
                Some(prev) if prev >= s => Some(prev),
                _ => Some(s),
            });
        if let Some(score) = best {
            sum += score;
            matched += 1;
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let average = sum / required.len() as f64;
    let coverage = matched as f64 / required.len() as f64;
    average * coverage
}

/// 技能分配选项
#[derive(Debug, Clone, Default)]
pub struct SkillAssignmentOptions {
    /// 不参与本次分配的工人
    pub exclude_worker_ids: Vec<String>,
    /// 覆盖默认的四维度权重
    pub axes: Option<AxisWeights>,
}

/// 各评分维度得分
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SkillAxisScores {
    pub skill: f64,
    pub workload: f64,
    pub location: f64,
    pub performance: f64,
}

/// 基于技能的分配结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillAssignment {
    pub task_id: i64,
    pub worker_id: String,
    pub worker_name: String,
    pub score: f64,
    pub axis_scores: SkillAxisScores,
    /// 得分贡献最大的维度名，仅用于可观测性
    pub assignment_reason: String,
    pub estimated_minutes: i64,
}

/// 技能匹配器
///
/// 从任务类型与payload标记推导所需技能，对候选工人按
/// 技能/负载/位置/表现四个加权维度评分并取最优。
pub struct SkillMatcher {
    skill_repo: Arc<dyn WorkerSkillRepository>,
    directory: Arc<dyn WorkerDirectory>,
    load_balancer: LoadBalancer,
    performance: PerformanceAnalyzer,
    category_weights: CategoryWeights,
    axes: AxisWeights,
    clock: Arc<dyn Clock>,
}

impl SkillMatcher {
    pub fn new(
        skill_repo: Arc<dyn WorkerSkillRepository>,
        directory: Arc<dyn WorkerDirectory>,
        load_balancer: LoadBalancer,
        category_weights: CategoryWeights,
        axes: AxisWeights,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            skill_repo,
            directory,
            load_balancer,
            performance: PerformanceAnalyzer::new(),
            category_weights,
            axes,
            clock,
        }
    }

    /// 推导任务的所需技能
    ///
    /// 按任务类型给出基础技能，再根据payload标记追加条件技能，去重。
    pub fn required_skills(task: &Task) -> Vec<SkillCategory> {
        let mut required: Vec<SkillCategory> = match task.task_type {
            TaskType::Inbound => vec![SkillCategory::Receiving],
            TaskType::Outbound => vec![SkillCategory::Picking, SkillCategory::Packing],
            TaskType::Quality => vec![SkillCategory::Quality],
            TaskType::Count => vec![SkillCategory::Counting],
            TaskType::Transfer => vec![SkillCategory::Equipment],
        };

        let extras = [
            (payload_keys::REQUIRES_QUALITY_CHECK, SkillCategory::Quality),
            (payload_keys::HAZARDOUS, SkillCategory::Hazardous),
            (payload_keys::COLD_STORAGE, SkillCategory::ColdStorage),
        ];
        for (flag, category) in extras {
            if task.payload_flag(flag) && !required.contains(&category) {
                required.push(category);
            }
        }
        required
    }

    /// 对一组档案计算技能匹配分（见 [`skill_match_score`]）
    pub fn skill_match(
        &self,
        required: &[SkillCategory],
        profiles: &[WorkerSkillProfile],
    ) -> f64 {
        skill_match_score(required, profiles, &self.category_weights, self.clock.now())
    }

    /// 基于技能为任务挑选工人
    ///
    /// 推导不出所需技能时返回None并记录告警；没有候选工人时返回None。
    /// 两者都是合法的非错误结果，调用方需自行区分。
    pub async fn assign_worker_by_skill(
        &self,
        task: &Task,
        options: &SkillAssignmentOptions,
    ) -> SchedulerResult<Option<SkillAssignment>> {
        let required = Self::required_skills(task);
        if required.is_empty() {
            warn!("任务 {} 推导不出所需技能，跳过技能分配", task.id);
            return Ok(None);
        }

        let profiles = self
            .skill_repo
            .find_workers_by_skills(&required, &options.exclude_worker_ids)
            .await?;
        if profiles.is_empty() {
            debug!("任务 {} 没有覆盖所需技能的候选工人", task.id);
            return Ok(None);
        }

        // 按工人分组；BTreeMap保证遍历顺序确定
        let mut by_worker: BTreeMap<String, Vec<WorkerSkillProfile>> = BTreeMap::new();
        for profile in profiles {
            by_worker
                .entry(profile.worker_id.clone())
                .or_default()
                .push(profile);
        }

        let workers = self.directory.snapshot().await?;
        let workload_of: BTreeMap<&str, i32> = workers
            .iter()
            .map(|w| (w.worker_id(), w.state.current_workload))
            .collect();

        let axes = options.axes.clone().unwrap_or_else(|| self.axes.clone());
        let now = self.clock.now();

        let mut best: Option<SkillAssignment> = None;
        for (worker_id, worker_profiles) in &by_worker {
            let skill = skill_match_score(&required, worker_profiles, &self.category_weights, now);
            let workload = match workload_of.get(worker_id.as_str()) {
                Some(load) => self.load_balancer.workload_score(*load),
                None => UNKNOWN_WORKLOAD_SCORE,
            };
            let location = LOCATION_PLACEHOLDER_SCORE;
            let performance = self.performance.performance_score(worker_id);

            let axis_scores = SkillAxisScores {
                skill,
                workload,
                location,
                performance,
            };
            let total = axes.skill * skill
                + axes.workload * workload
                + axes.location * location
                + axes.performance * performance;

            if best.as_ref().map(|b| total > b.score).unwrap_or(true) {
                let level = worker_profiles
                    .iter()
                    .filter(|p| required.contains(&p.category) && p.is_usable(now))
                    .map(|p| p.level)
                    .max()
                    .unwrap_or(1);
                best = Some(SkillAssignment {
                    task_id: task.id,
                    worker_id: worker_id.clone(),
                    worker_name: worker_profiles
                        .first()
                        .map(|p| p.worker_name.clone())
                        .unwrap_or_default(),
                    score: total,
                    axis_scores,
                    assignment_reason: dominant_axis(&axes, &axis_scores).as_str().to_string(),
                    estimated_minutes: estimate_task_minutes(level),
                });
            }
        }

        if let Some(assignment) = &best {
            debug!(
                "任务 {} 的技能分配候选: 工人 {} (得分 {:.3}, 主导维度 {})",
                task.id, assignment.worker_id, assignment.score, assignment.assignment_reason
            );
        }
        Ok(best)
    }
}

/// 取加权贡献最大的维度；并列时按技能>负载>位置>表现的固定顺序取先者
fn dominant_axis(axes: &AxisWeights, scores: &SkillAxisScores) -> ScoringAxis {
    let contributions = [
        (ScoringAxis::Skill, axes.skill * scores.skill),
        (ScoringAxis::Workload, axes.workload * scores.workload),
        (ScoringAxis::Location, axes.location * scores.location),
        (ScoringAxis::Performance, axes.performance * scores.performance),
    ];
    let mut best = contributions[0];
    for candidate in &contributions[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    best.0
}
