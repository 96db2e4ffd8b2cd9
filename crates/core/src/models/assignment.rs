use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::task::TaskType;

/// 单次分配的各维度得分
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AssignmentFactors {
    pub skill: f64,
    pub workload: f64,
    pub priority: f64,
}

/// 分配结果（瞬态）
///
/// 合并进任务payload并作为副作用返回给调用方，不作为独立实体持久化。
/// 分配结果在外部持久化层提交之前仅具参考意义。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentResult {
    pub task_id: i64,
    pub worker_id: String,
    /// 综合匹配得分，[0, 1]
    pub match_score: f64,
    pub factors: AssignmentFactors,
    pub assigned_at: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
}

impl AssignmentResult {
    /// 渲染写入任务payload的分配块
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "worker_id": self.worker_id,
            "match_score": self.match_score,
            "factors": {
                "skill": self.factors.skill,
                "workload": self.factors.workload,
                "priority": self.factors.priority,
            },
            "assigned_at": self.assigned_at.to_rfc3339(),
            "estimated_completion": self.estimated_completion.to_rfc3339(),
        })
    }
}

/// 优先级变更记录（瞬态）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriorityChange {
    pub task_id: i64,
    pub task_type: TaskType,
    pub old_priority: i32,
    pub new_priority: i32,
}

impl PriorityChange {
    pub fn delta(&self) -> i32 {
        self.new_priority - self.old_priority
    }

    /// 变更幅度超过20视为高影响
    pub fn is_high_impact(&self) -> bool {
        self.delta().abs() > 20
    }
}

/// 优先级分桶分布：低 ≤30，中 ≤70，高 >70
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityDistribution {
    pub fn record(&mut self, priority: i32) {
        if priority <= 30 {
            self.low += 1;
        } else if priority <= 70 {
            self.medium += 1;
        } else {
            self.high += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}
