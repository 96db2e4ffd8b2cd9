use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::assignment::AssignmentResult;

/// 任务payload中约定的字段名
///
/// payload由上游生产者与调度器共享，调度器只读取这里列出的字段，
/// 并在分配成功后写入 [`ASSIGNMENT`] 块。
pub mod payload_keys {
    pub const URGENT: &str = "urgent";
    pub const HIGH_PRIORITY: &str = "high_priority";
    pub const CUSTOMER_TIER: &str = "customer_tier";
    pub const DEADLINE: &str = "deadline";
    pub const REQUIRES_QUALITY_CHECK: &str = "requires_quality_check";
    pub const HAZARDOUS: &str = "hazardous";
    pub const COLD_STORAGE: &str = "cold_storage";
    pub const ASSIGNMENT: &str = "assignment";
    pub const ESCALATED_AT: &str = "escalated_at";
    pub const MAX_DELAY_MINUTES: &str = "max_delay_minutes";
}

/// 任务类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskType {
    #[serde(rename = "inbound")]
    Inbound,
    #[serde(rename = "outbound")]
    Outbound,
    #[serde(rename = "quality")]
    Quality,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "transfer")]
    Transfer,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Inbound => "inbound",
            TaskType::Outbound => "outbound",
            TaskType::Quality => "quality",
            TaskType::Count => "count",
            TaskType::Transfer => "transfer",
        }
    }
}

/// 任务状态
///
/// 任务由外部系统以PENDING状态创建，调度器在成功匹配后将其转移为
/// ASSIGNED；后续状态由外部执行方驱动，调度器从不删除任务。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "PAUSED")]
    Paused,
    #[serde(rename = "DISCREPANCY_FOUND")]
    DiscrepancyFound,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Paused => "PAUSED",
            TaskStatus::DiscrepancyFound => "DISCREPANCY_FOUND",
        }
    }
}

/// 仓储作业任务
///
/// 优先级不变量: `1 <= priority <= 100`。priority与分配字段由调度器拥有，
/// payload与上游生产者共享。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub priority: i32,
    pub assigned_worker_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// 创建新任务（PENDING状态）
    pub fn new(
        id: i64,
        name: String,
        task_type: TaskType,
        priority: i32,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            task_type,
            status: TaskStatus::Pending,
            priority: priority.clamp(1, 100),
            assigned_worker_id: None,
            assigned_at: None,
            started_at: None,
            completed_at: None,
            payload,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, TaskStatus::Pending)
    }

    /// 任务是否处于活跃状态（已分配或执行中）
    pub fn is_active(&self) -> bool {
        matches!(self.status, TaskStatus::Assigned | TaskStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// 读取payload中的布尔标记
    ///
    /// 接受 `true`、`"true"`、`"1"`、`"yes"`；其余一律视为false，从不报错。
    pub fn payload_flag(&self, key: &str) -> bool {
        match self.payload.get(key) {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => {
                matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
            }
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(|v| v.as_str())
    }

    pub fn is_urgent(&self) -> bool {
        self.payload_flag(payload_keys::URGENT)
    }

    pub fn is_high_priority(&self) -> bool {
        self.payload_flag(payload_keys::HIGH_PRIORITY)
    }

    /// 客户等级，缺失时默认 `standard`
    pub fn customer_tier(&self) -> &str {
        self.payload_str(payload_keys::CUSTOMER_TIER)
            .unwrap_or("standard")
    }

    /// 截止时间，无法解析时返回None（中性默认，从不报错）
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.payload_str(payload_keys::DEADLINE)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// 设置优先级，始终裁剪到 [1, 100]
    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority.clamp(1, 100);
    }

    /// PENDING → ASSIGNED 状态转移
    pub fn mark_assigned(&mut self, worker_id: &str, now: DateTime<Utc>) {
        self.status = TaskStatus::Assigned;
        self.assigned_worker_id = Some(worker_id.to_string());
        self.assigned_at = Some(now);
        self.updated_at = now;
    }

    /// 应用分配结果：转移状态并把分配块合并进payload
    pub fn record_assignment(&mut self, result: &AssignmentResult) {
        self.mark_assigned(&result.worker_id, result.assigned_at);
        self.set_payload_entry(payload_keys::ASSIGNMENT, result.to_payload());
    }

    /// 被抢占后重新排队：回到PENDING并清除分配字段
    pub fn requeue(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Pending;
        self.assigned_worker_id = None;
        self.assigned_at = None;
        self.updated_at = now;
    }

    /// 向payload写入一个字段；payload不是对象时先替换为空对象
    pub fn set_payload_entry(&mut self, key: &str, value: serde_json::Value) {
        if !self.payload.is_object() {
            self.payload = serde_json::json!({});
        }
        if let Some(map) = self.payload.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    /// 任务在队列中的等待时长（分钟）
    pub fn wait_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_minutes().max(0)
    }
}
