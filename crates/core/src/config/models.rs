use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::SkillCategory;

/// 优先级计算因子权重
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityWeights {
    pub urgency: f64,
    pub customer_tier: f64,
    pub deadline: f64,
    pub resource: f64,
    pub business_impact: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            urgency: 0.3,
            customer_tier: 0.2,
            deadline: 0.25,
            resource: 0.15,
            business_impact: 0.1,
        }
    }
}

impl PriorityWeights {
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = [
            ("urgency", self.urgency),
            ("customer_tier", self.customer_tier),
            ("deadline", self.deadline),
            ("resource", self.resource),
            ("business_impact", self.business_impact),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("优先级权重 {} 无效: {}", name, value);
            }
        }
        if weights.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
            anyhow::bail!("优先级权重之和必须大于0");
        }
        Ok(())
    }
}

/// 工人选择的评分维度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScoringAxis {
    #[serde(rename = "skill")]
    Skill,
    #[serde(rename = "workload")]
    Workload,
    #[serde(rename = "location")]
    Location,
    #[serde(rename = "performance")]
    Performance,
}

impl ScoringAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringAxis::Skill => "skill",
            ScoringAxis::Workload => "workload",
            ScoringAxis::Location => "location",
            ScoringAxis::Performance => "performance",
        }
    }
}

/// 按维度校验过的权重集合
///
/// 取代自由形式的权重map：构造时拒绝负值与重复维度，
/// 可选地重新归一化使权重之和为1.0。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisWeights {
    pub skill: f64,
    pub workload: f64,
    pub location: f64,
    pub performance: f64,
}

impl Default for AxisWeights {
    fn default() -> Self {
        Self {
            skill: 0.4,
            workload: 0.3,
            location: 0.2,
            performance: 0.1,
        }
    }
}

impl AxisWeights {
    /// 从 {维度, 权重} 对列表构造，未出现的维度取默认值
    pub fn from_pairs(pairs: &[(ScoringAxis, f64)]) -> anyhow::Result<Self> {
        let mut seen: HashMap<ScoringAxis, f64> = HashMap::new();
        for (axis, weight) in pairs {
            if !weight.is_finite() || *weight < 0.0 {
                anyhow::bail!("维度 {} 的权重无效: {}", axis.as_str(), weight);
            }
            if seen.insert(*axis, *weight).is_some() {
                anyhow::bail!("维度 {} 重复出现", axis.as_str());
            }
        }
        let defaults = Self::default();
        Ok(Self {
            skill: seen.get(&ScoringAxis::Skill).copied().unwrap_or(defaults.skill),
            workload: seen
                .get(&ScoringAxis::Workload)
                .copied()
                .unwrap_or(defaults.workload),
            location: seen
                .get(&ScoringAxis::Location)
                .copied()
                .unwrap_or(defaults.location),
            performance: seen
                .get(&ScoringAxis::Performance)
                .copied()
                .unwrap_or(defaults.performance),
        })
    }

    pub fn get(&self, axis: ScoringAxis) -> f64 {
        match axis {
            ScoringAxis::Skill => self.skill,
            ScoringAxis::Workload => self.workload,
            ScoringAxis::Location => self.location,
            ScoringAxis::Performance => self.performance,
        }
    }

    pub fn sum(&self) -> f64 {
        self.skill + self.workload + self.location + self.performance
    }

    /// 重新归一化，使权重之和为1.0
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            skill: self.skill / sum,
            workload: self.workload / sum,
            location: self.location / sum,
            performance: self.performance / sum,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("skill", self.skill),
            ("workload", self.workload),
            ("location", self.location),
            ("performance", self.performance),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("评分维度权重 {} 无效: {}", name, value);
            }
        }
        if self.sum() <= 0.0 {
            anyhow::bail!("评分维度权重之和必须大于0");
        }
        Ok(())
    }
}

/// 工人分配配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentConfig {
    /// 每个工人的容量上限
    pub max_tasks_per_worker: i32,
    pub axes: AxisWeights,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_worker: 10,
            axes: AxisWeights::default(),
        }
    }
}

impl AssignmentConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_tasks_per_worker <= 0 {
            anyhow::bail!("每工人最大任务数必须大于0");
        }
        self.axes.validate()
    }
}

/// 技能类别权重
///
/// 未配置的类别一律取1.0。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryWeights {
    pub overrides: HashMap<SkillCategory, f64>,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(SkillCategory::Hazardous, 1.5);
        overrides.insert(SkillCategory::ColdStorage, 1.3);
        overrides.insert(SkillCategory::Quality, 1.2);
        Self { overrides }
    }
}

impl CategoryWeights {
    pub fn weight_for(&self, category: SkillCategory) -> f64 {
        self.overrides.get(&category).copied().unwrap_or(1.0)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (category, weight) in &self.overrides {
            if !weight.is_finite() || *weight <= 0.0 {
                anyhow::bail!("技能类别 {} 的权重无效: {}", category.as_str(), weight);
            }
        }
        Ok(())
    }
}

/// 紧急任务处理配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UrgentConfig {
    /// max_delay低于该阈值时进入优先队列而非普通队列
    pub priority_queue_threshold_minutes: i64,
    /// 抢占路径的预计开始延迟
    pub preemption_start_minutes: i64,
    /// 直接分配路径的预计开始延迟
    pub assignment_start_minutes: i64,
    /// 排队路径的预计开始延迟
    pub queued_start_minutes: i64,
}

impl Default for UrgentConfig {
    fn default() -> Self {
        Self {
            priority_queue_threshold_minutes: 15,
            preemption_start_minutes: 5,
            assignment_start_minutes: 15,
            queued_start_minutes: 60,
        }
    }
}

impl UrgentConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.priority_queue_threshold_minutes <= 0 {
            anyhow::bail!("优先队列阈值必须大于0分钟");
        }
        if self.preemption_start_minutes < 0
            || self.assignment_start_minutes < 0
            || self.queued_start_minutes < 0
        {
            anyhow::bail!("预计开始延迟不能为负数");
        }
        Ok(())
    }
}

/// 调度子系统配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulingConfig {
    pub priority: PriorityWeights,
    pub assignment: AssignmentConfig,
    pub category_weights: CategoryWeights,
    pub urgent: UrgentConfig,
}

impl SchedulingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.priority.validate()?;
        self.assignment.validate()?;
        self.category_weights.validate()?;
        self.urgent.validate()?;
        Ok(())
    }

    /// 应用松散的键值覆盖
    ///
    /// 这是调度器唯一的选项强转入口。可识别的键：
    ///
    /// | 键 | 作用 | 默认值 |
    /// |---|---|---|
    /// | `urgency_weight` | 优先级计算中加急因子的权重 | 0.3 |
    /// | `customer_tier_weight` | 客户等级因子权重 | 0.2 |
    /// | `deadline_weight` | 截止时间因子权重 | 0.25 |
    /// | `resource_weight` | 资源可用性因子权重（占位） | 0.15 |
    /// | `business_impact_weight` | 业务影响因子权重（占位） | 0.1 |
    /// | `max_tasks_per_worker` | 每工人容量上限 | 10 |
    /// | `skill_match_weight` | 技能匹配维度权重 | 0.4 |
    /// | `workload_weight` | 负载维度权重 | 0.3 |
    /// | `location_weight` | 位置维度权重（占位） | 0.2 |
    /// | `performance_weight` | 历史表现维度权重（占位） | 0.1 |
    ///
    /// 非数字或越界的值静默回退到当前值，未识别的键被忽略。
    pub fn apply_options(&mut self, options: &HashMap<String, String>) {
        for (key, raw) in options {
            match key.as_str() {
                "urgency_weight" => apply_f64(&mut self.priority.urgency, key, raw),
                "customer_tier_weight" => apply_f64(&mut self.priority.customer_tier, key, raw),
                "deadline_weight" => apply_f64(&mut self.priority.deadline, key, raw),
                "resource_weight" => apply_f64(&mut self.priority.resource, key, raw),
                "business_impact_weight" => {
                    apply_f64(&mut self.priority.business_impact, key, raw)
                }
                "max_tasks_per_worker" => {
                    match raw.parse::<i32>() {
                        Ok(v) if v > 0 => self.assignment.max_tasks_per_worker = v,
                        _ => debug!("配置项 {} 的值 {:?} 无效，保留当前值", key, raw),
                    }
                }
                "skill_match_weight" => apply_f64(&mut self.assignment.axes.skill, key, raw),
                "workload_weight" => apply_f64(&mut self.assignment.axes.workload, key, raw),
                "location_weight" => apply_f64(&mut self.assignment.axes.location, key, raw),
                "performance_weight" => {
                    apply_f64(&mut self.assignment.axes.performance, key, raw)
                }
                _ => debug!("忽略未识别的配置项: {}", key),
            }
        }
    }
}

fn apply_f64(slot: &mut f64, key: &str, raw: &str) {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => *slot = v,
        _ => debug!("配置项 {} 的值 {:?} 无效，保留当前值", key, raw),
    }
}
