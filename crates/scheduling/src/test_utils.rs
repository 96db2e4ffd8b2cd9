pub mod builders {
    use chrono::{DateTime, TimeZone, Utc};

    use warehouse_core::{
        payload_keys, SkillCategory, Task, TaskStatus, TaskType, WorkerAvailability,
        WorkerRuntimeState, WorkerSkillProfile, WorkerSnapshot,
    };

    /// 测试用的固定基准时刻
    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap()
    }

    pub struct TaskBuilder {
        task: Task,
    }

    impl TaskBuilder {
        pub fn new(id: i64) -> Self {
            Self {
                task: Task::new(
                    id,
                    format!("task-{id}"),
                    TaskType::Inbound,
                    50,
                    serde_json::json!({}),
                    base_time(),
                ),
            }
        }

        pub fn with_type(mut self, task_type: TaskType) -> Self {
            self.task.task_type = task_type;
            self
        }

        pub fn with_priority(mut self, priority: i32) -> Self {
            self.task.priority = priority;
            self
        }

        pub fn with_status(mut self, status: TaskStatus) -> Self {
            self.task.status = status;
            self
        }

        pub fn with_flag(mut self, key: &str) -> Self {
            self.task.set_payload_entry(key, serde_json::json!(true));
            self
        }

        pub fn with_payload_entry(mut self, key: &str, value: serde_json::Value) -> Self {
            self.task.set_payload_entry(key, value);
            self
        }

        pub fn with_customer_tier(mut self, tier: &str) -> Self {
            self.task
                .set_payload_entry(payload_keys::CUSTOMER_TIER, serde_json::json!(tier));
            self
        }

        pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
            self.task.set_payload_entry(
                payload_keys::DEADLINE,
                serde_json::json!(deadline.to_rfc3339()),
            );
            self
        }

        pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
            self.task.created_at = created_at;
            self
        }

        pub fn assigned_to(mut self, worker_id: &str, assigned_at: DateTime<Utc>) -> Self {
            self.task.mark_assigned(worker_id, assigned_at);
            self
        }

        pub fn build(self) -> Task {
            self.task
        }
    }

    pub struct ProfileBuilder {
        profile: WorkerSkillProfile,
    }

    impl ProfileBuilder {
        pub fn new(worker_id: &str, category: SkillCategory) -> Self {
            Self {
                profile: WorkerSkillProfile {
                    worker_id: worker_id.to_string(),
                    worker_name: worker_id.to_string(),
                    category,
                    level: 5,
                    score: 60,
                    active: true,
                    certified_from: None,
                    certified_until: None,
                },
            }
        }

        pub fn with_level(mut self, level: i32) -> Self {
            self.profile.level = level;
            self
        }

        pub fn with_score(mut self, score: i32) -> Self {
            self.profile.score = score;
            self
        }

        pub fn inactive(mut self) -> Self {
            self.profile.active = false;
            self
        }

        pub fn certified_until(mut self, until: DateTime<Utc>) -> Self {
            self.profile.certified_until = Some(until);
            self
        }

        pub fn build(self) -> WorkerSkillProfile {
            self.profile
        }
    }

    pub struct WorkerBuilder {
        snapshot: WorkerSnapshot,
    }

    impl WorkerBuilder {
        pub fn new(worker_id: &str) -> Self {
            Self {
                snapshot: WorkerSnapshot {
                    state: WorkerRuntimeState {
                        worker_id: worker_id.to_string(),
                        name: worker_id.to_string(),
                        current_workload: 0,
                        availability: WorkerAvailability::Available,
                    },
                    profiles: Vec::new(),
                },
            }
        }

        pub fn with_workload(mut self, workload: i32) -> Self {
            self.snapshot.state.current_workload = workload;
            self
        }

        pub fn busy(mut self) -> Self {
            self.snapshot.state.availability = WorkerAvailability::Busy;
            self
        }

        pub fn offline(mut self) -> Self {
            self.snapshot.state.availability = WorkerAvailability::Offline;
            self
        }

        pub fn with_skill(mut self, category: SkillCategory, level: i32, score: i32) -> Self {
            let worker_id = self.snapshot.state.worker_id.clone();
            self.snapshot.profiles.push(
                ProfileBuilder::new(&worker_id, category)
                    .with_level(level)
                    .with_score(score)
                    .build(),
            );
            self
        }

        pub fn build(self) -> WorkerSnapshot {
            self.snapshot
        }
    }
}
