use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 技能类别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillCategory {
    #[serde(rename = "receiving")]
    Receiving,
    #[serde(rename = "picking")]
    Picking,
    #[serde(rename = "packing")]
    Packing,
    #[serde(rename = "quality")]
    Quality,
    #[serde(rename = "counting")]
    Counting,
    #[serde(rename = "equipment")]
    Equipment,
    #[serde(rename = "hazardous")]
    Hazardous,
    #[serde(rename = "cold_storage")]
    ColdStorage,
}

impl SkillCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Receiving => "receiving",
            SkillCategory::Picking => "picking",
            SkillCategory::Packing => "packing",
            SkillCategory::Quality => "quality",
            SkillCategory::Counting => "counting",
            SkillCategory::Equipment => "equipment",
            SkillCategory::Hazardous => "hazardous",
            SkillCategory::ColdStorage => "cold_storage",
        }
    }
}

/// 工人技能档案
///
/// 每个（工人，技能类别）一条记录，调度视角下读多写少。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSkillProfile {
    pub worker_id: String,
    pub worker_name: String,
    pub category: SkillCategory,
    /// 技能等级，1-10
    pub level: i32,
    /// 技能评分，1-100
    pub score: i32,
    pub active: bool,
    pub certified_from: Option<DateTime<Utc>>,
    pub certified_until: Option<DateTime<Utc>>,
}

impl WorkerSkillProfile {
    /// 认证窗口是否覆盖给定时刻（边界缺失视为无界）
    pub fn is_certified(&self, now: DateTime<Utc>) -> bool {
        let from_ok = self.certified_from.map(|f| f <= now).unwrap_or(true);
        let until_ok = self.certified_until.map(|u| now <= u).unwrap_or(true);
        from_ok && until_ok
    }

    /// 档案当前是否可用于匹配
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active && self.is_certified(now)
    }
}

/// 工人可用性
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkerAvailability {
    #[serde(rename = "AVAILABLE")]
    Available,
    #[serde(rename = "BUSY")]
    Busy,
    #[serde(rename = "OFFLINE")]
    Offline,
}

/// 工人运行时状态
///
/// 每次调度调用开始时重新构建的临时快照，本子系统不持久化。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerRuntimeState {
    pub worker_id: String,
    pub name: String,
    /// 当前活跃任务数
    pub current_workload: i32,
    pub availability: WorkerAvailability,
}

impl WorkerRuntimeState {
    pub fn is_available(&self) -> bool {
        matches!(self.availability, WorkerAvailability::Available)
    }

    /// 检查工人是否还能接受新任务
    pub fn can_accept_task(&self, max_tasks: i32) -> bool {
        self.is_available() && self.current_workload < max_tasks
    }

    /// 获取工人负载率
    pub fn load_percentage(&self, max_tasks: i32) -> f64 {
        if max_tasks == 0 {
            0.0
        } else {
            (self.current_workload as f64 / max_tasks as f64) * 100.0
        }
    }
}

/// 工人快照：运行时状态加技能档案
///
/// 由WorkerDirectory在每次调度调用开始时一次性捕获，
/// 调用内部按值传递，保证一致性。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSnapshot {
    pub state: WorkerRuntimeState,
    pub profiles: Vec<WorkerSkillProfile>,
}

impl WorkerSnapshot {
    pub fn worker_id(&self) -> &str {
        &self.state.worker_id
    }

    /// 指定类别下当前可用的最佳档案（按等级×评分取最大）
    pub fn best_profile(
        &self,
        category: SkillCategory,
        now: DateTime<Utc>,
    ) -> Option<&WorkerSkillProfile> {
        self.profiles
            .iter()
            .filter(|p| p.category == category && p.is_usable(now))
            .max_by_key(|p| p.level * p.score)
    }

    /// 是否覆盖所需技能中的至少一项
    pub fn covers_any(&self, required: &[SkillCategory], now: DateTime<Utc>) -> bool {
        required
            .iter()
            .any(|c| self.best_profile(*c, now).is_some())
    }
}
