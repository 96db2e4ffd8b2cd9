//! 内存实现
//!
//! 面向嵌入式运行和测试的端口实现。生产部署用外部存储实现同名trait，
//! 这里的实现保证与接口语义一致：`find_by_status` 按任务id升序返回，
//! `save` 为幂等upsert。

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use warehouse_core::{
    SchedulerResult, SkillCategory, Task, TaskStatus, WorkerSkillProfile, WorkerSnapshot,
};

use crate::ports::{TaskRepository, WorkerDirectory, WorkerSkillRepository};

/// 内存任务存储
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<BTreeMap<i64, Task>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let repo = Self::new();
        {
            let mut guard = repo.tasks.lock().unwrap();
            for task in tasks {
                guard.insert(task.id, task);
            }
        }
        repo
    }

    pub fn insert(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_by_status(
        &self,
        status: TaskStatus,
        limit: usize,
    ) -> SchedulerResult<Vec<Task>> {
        let guard = self.tasks.lock().unwrap();
        Ok(guard
            .values()
            .filter(|t| t.status == status)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn save(&self, task: &Task, _flush_now: bool) -> SchedulerResult<()> {
        self.tasks.lock().unwrap().insert(task.id, task.clone());
        Ok(())
    }
}

/// 内存技能档案存储
#[derive(Debug, Default)]
pub struct InMemorySkillRepository {
    profiles: Mutex<Vec<WorkerSkillProfile>>,
}

impl InMemorySkillRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<WorkerSkillProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
        }
    }

    pub fn insert(&self, profile: WorkerSkillProfile) {
        self.profiles.lock().unwrap().push(profile);
    }
}

#[async_trait]
impl WorkerSkillRepository for InMemorySkillRepository {
    async fn find_workers_by_skills(
        &self,
        required: &[SkillCategory],
        exclude_worker_ids: &[String],
    ) -> SchedulerResult<Vec<WorkerSkillProfile>> {
        let guard = self.profiles.lock().unwrap();
        let matching_workers: HashSet<&str> = guard
            .iter()
            .filter(|p| {
                required.contains(&p.category)
                    && !exclude_worker_ids.contains(&p.worker_id)
            })
            .map(|p| p.worker_id.as_str())
            .collect();

        // 命中工人的全部档案都返回，认证与有效性过滤留给调用方
        Ok(guard
            .iter()
            .filter(|p| matching_workers.contains(p.worker_id.as_str()))
            .cloned()
            .collect())
    }
}

/// 静态工人目录
///
/// 每次 `snapshot` 返回注册工人集合的一份深拷贝快照。
#[derive(Debug, Default)]
pub struct StaticWorkerDirectory {
    workers: Mutex<Vec<WorkerSnapshot>>,
}

impl StaticWorkerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: Vec<WorkerSnapshot>) -> Self {
        Self {
            workers: Mutex::new(workers),
        }
    }

    pub fn register(&self, worker: WorkerSnapshot) {
        self.workers.lock().unwrap().push(worker);
    }
}

#[async_trait]
impl WorkerDirectory for StaticWorkerDirectory {
    async fn snapshot(&self) -> SchedulerResult<Vec<WorkerSnapshot>> {
        Ok(self.workers.lock().unwrap().clone())
    }
}
