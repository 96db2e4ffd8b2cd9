use std::sync::Arc;

use chrono::Duration;

use warehouse_core::{
    payload_keys, CategoryWeights, SkillCategory, TaskStatus, TaskType, UrgentConfig,
};
use warehouse_domain::{FixedClock, InMemoryTaskRepository, StaticWorkerDirectory};

use crate::engine::WorkerAssignmentEngine;
use crate::load_balancer::LoadBalancer;
use crate::test_utils::builders::{base_time, TaskBuilder, WorkerBuilder};
use crate::urgent::{
    HandlingStrategy, LowestPriorityPreemption, PreemptionPolicy, UrgentTaskHandler,
    UrgentTaskOptions,
};

fn handler(
    repo: Arc<InMemoryTaskRepository>,
    directory: Arc<StaticWorkerDirectory>,
) -> UrgentTaskHandler {
    let clock = Arc::new(FixedClock::new(base_time()));
    let engine = WorkerAssignmentEngine::new(
        LoadBalancer::default(),
        CategoryWeights::default(),
        clock.clone(),
    );
    UrgentTaskHandler::new(
        engine,
        repo,
        directory,
        Arc::new(LowestPriorityPreemption),
        UrgentConfig::default(),
        clock,
    )
}

fn options(priority: i32, max_delay_minutes: i64, preempt_allowed: bool) -> UrgentTaskOptions {
    UrgentTaskOptions {
        priority,
        max_delay_minutes,
        preempt_allowed,
    }
}

#[tokio::test]
async fn test_immediate_assignment_when_worker_available() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("w1")
            .with_skill(SkillCategory::Receiving, 9, 90)
            .build(),
    ]));
    let task = TaskBuilder::new(1).with_type(TaskType::Inbound).build();

    let result = handler(repo.clone(), directory)
        .handle_urgent_task(task, &options(95, 10, true))
        .await
        .unwrap();

    assert_eq!(
        result.handling_strategy,
        HandlingStrategy::ImmediateAssignment
    );
    assert!(result.assignment.is_some());
    assert!(result.displaced_task.is_none());
    assert_eq!(result.estimated_start, base_time() + Duration::minutes(15));

    let saved = repo.get(1).unwrap();
    assert_eq!(saved.status, TaskStatus::Assigned);
    assert_eq!(saved.priority, 95);
}

#[tokio::test]
async fn test_urgency_metadata_stamped_on_payload() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let directory = Arc::new(StaticWorkerDirectory::new());
    let task = TaskBuilder::new(1).build();

    let result = handler(repo, directory)
        .handle_urgent_task(task, &options(120, 30, false))
        .await
        .unwrap();

    // 优先级裁剪到100，payload打上加急戳
    assert_eq!(result.task.priority, 100);
    assert!(result.task.is_urgent());
    assert!(result.task.payload_str(payload_keys::ESCALATED_AT).is_some());
    assert_eq!(
        result.task.payload.get(payload_keys::MAX_DELAY_MINUTES),
        Some(&serde_json::json!(30))
    );
}

#[tokio::test]
async fn test_no_workers_no_preemption_uses_priority_queue_below_threshold() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let directory = Arc::new(StaticWorkerDirectory::new());
    let task = TaskBuilder::new(1).build();

    let result = handler(repo.clone(), directory)
        .handle_urgent_task(task, &options(90, 10, false))
        .await
        .unwrap();

    assert!(result.assignment.is_none());
    assert_eq!(result.handling_strategy, HandlingStrategy::PriorityQueue);
    assert_eq!(result.estimated_start, base_time() + Duration::minutes(60));
    // 任务留在队列中等待下一个批次
    assert_eq!(repo.get(1).unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_no_workers_no_preemption_uses_standard_queue_at_threshold() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let directory = Arc::new(StaticWorkerDirectory::new());
    let task = TaskBuilder::new(1).build();

    let result = handler(repo, directory)
        .handle_urgent_task(task, &options(90, 15, false))
        .await
        .unwrap();

    assert!(result.assignment.is_none());
    assert_eq!(result.handling_strategy, HandlingStrategy::StandardQueue);
}

#[tokio::test]
async fn test_preemption_reclaims_lowest_priority_compatible_worker() {
    let victim = TaskBuilder::new(10)
        .with_type(TaskType::Inbound)
        .with_priority(20)
        .assigned_to("w1", base_time() - Duration::hours(1))
        .build();
    let repo = Arc::new(InMemoryTaskRepository::with_tasks(vec![victim]));
    // 工人满载，立即分配不可行
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("w1")
            .with_skill(SkillCategory::Receiving, 9, 90)
            .with_workload(10)
            .build(),
    ]));
    let urgent = TaskBuilder::new(1).with_type(TaskType::Inbound).build();

    let result = handler(repo.clone(), directory)
        .handle_urgent_task(urgent, &options(95, 5, true))
        .await
        .unwrap();

    assert_eq!(
        result.handling_strategy,
        HandlingStrategy::ImmediatePreemption
    );
    assert_eq!(result.estimated_start, base_time() + Duration::minutes(5));

    let assignment = result.assignment.expect("抢占应当产出分配");
    assert_eq!(assignment.worker_id, "w1");

    // 被抢占任务重新排队并清除分配字段
    let displaced = result.displaced_task.expect("应当返回被抢占任务");
    assert_eq!(displaced.id, 10);
    let requeued = repo.get(10).unwrap();
    assert_eq!(requeued.status, TaskStatus::Pending);
    assert!(requeued.assigned_worker_id.is_none());

    // 紧急任务获得该工人
    let saved = repo.get(1).unwrap();
    assert_eq!(saved.status, TaskStatus::Assigned);
    assert_eq!(saved.assigned_worker_id.as_deref(), Some("w1"));
}

#[tokio::test]
async fn test_preemption_refuses_higher_priority_victims() {
    let active = TaskBuilder::new(10)
        .with_type(TaskType::Inbound)
        .with_priority(96)
        .assigned_to("w1", base_time())
        .build();
    let repo = Arc::new(InMemoryTaskRepository::with_tasks(vec![active]));
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("w1")
            .with_skill(SkillCategory::Receiving, 9, 90)
            .with_workload(10)
            .build(),
    ]));
    let urgent = TaskBuilder::new(1).with_type(TaskType::Inbound).build();

    let result = handler(repo.clone(), directory)
        .handle_urgent_task(urgent, &options(95, 20, true))
        .await
        .unwrap();

    // 在跑的任务优先级更高，不抢占，回落到排队
    assert_eq!(result.handling_strategy, HandlingStrategy::StandardQueue);
    assert!(result.assignment.is_none());
    assert_eq!(repo.get(10).unwrap().status, TaskStatus::Assigned);
}

#[test]
fn test_lowest_priority_preemption_picks_lowest_then_earliest() {
    let urgent = TaskBuilder::new(1)
        .with_type(TaskType::Inbound)
        .with_priority(90)
        .build();
    let workers = vec![
        WorkerBuilder::new("w1")
            .with_skill(SkillCategory::Receiving, 8, 80)
            .build(),
        WorkerBuilder::new("w2")
            .with_skill(SkillCategory::Receiving, 8, 80)
            .build(),
        WorkerBuilder::new("w3")
            .with_skill(SkillCategory::Receiving, 8, 80)
            .build(),
    ];
    let active = vec![
        TaskBuilder::new(11)
            .with_priority(40)
            .assigned_to("w1", base_time())
            .build(),
        TaskBuilder::new(12)
            .with_priority(20)
            .assigned_to("w2", base_time())
            .build(),
        TaskBuilder::new(13)
            .with_priority(20)
            .assigned_to("w3", base_time() - Duration::hours(2))
            .build(),
    ];

    let victim = LowestPriorityPreemption
        .select_victim(&urgent, &active, &workers, base_time())
        .expect("应当选出被抢占者");
    // 最低优先级并列时取分配最早者
    assert_eq!(victim.id, 13);
}

#[test]
fn test_lowest_priority_preemption_requires_skill_compatibility() {
    let urgent = TaskBuilder::new(1)
        .with_type(TaskType::Quality)
        .with_priority(90)
        .build();
    // 工人只有receiving技能，与质检任务不兼容
    let workers = vec![WorkerBuilder::new("w1")
        .with_skill(SkillCategory::Receiving, 8, 80)
        .build()];
    let active = vec![TaskBuilder::new(11)
        .with_priority(10)
        .assigned_to("w1", base_time())
        .build()];

    let victim = LowestPriorityPreemption.select_victim(&urgent, &active, &workers, base_time());
    assert!(victim.is_none());
}
