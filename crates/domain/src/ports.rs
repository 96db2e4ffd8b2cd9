use async_trait::async_trait;

use warehouse_core::{
    SchedulerResult, SkillCategory, Task, TaskStatus, WorkerSkillProfile, WorkerSnapshot,
};

/// 任务存储抽象
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 按状态查询任务，最多返回limit条
    async fn find_by_status(&self, status: TaskStatus, limit: usize)
        -> SchedulerResult<Vec<Task>>;

    /// 保存任务；`flush_now` 为true时要求存储立即提交
    async fn save(&self, task: &Task, flush_now: bool) -> SchedulerResult<()>;
}

/// 工人技能档案存储抽象
#[async_trait]
pub trait WorkerSkillRepository: Send + Sync {
    /// 查询至少覆盖一项所需技能的工人的全部技能档案
    ///
    /// `exclude_worker_ids` 中的工人不参与返回。
    async fn find_workers_by_skills(
        &self,
        required: &[SkillCategory],
        exclude_worker_ids: &[String],
    ) -> SchedulerResult<Vec<WorkerSkillProfile>>;
}

/// 工人目录能力
///
/// 取代硬编码在调度代码里的工人列表：每次调用返回一份新的、
/// 内部一致的快照，调度过程在快照上按值推进，不回读共享状态。
/// 两个并发批次可能各自看到过期容量并重复占用同一工人，
/// 最终一致性由外部持久化层在提交时保证。
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn snapshot(&self) -> SchedulerResult<Vec<WorkerSnapshot>>;
}
