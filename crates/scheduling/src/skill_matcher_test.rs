use std::sync::Arc;

use chrono::Duration;

use warehouse_core::{
    payload_keys, AxisWeights, CategoryWeights, SkillCategory, TaskType,
};
use warehouse_domain::{FixedClock, InMemorySkillRepository, StaticWorkerDirectory};

use crate::load_balancer::LoadBalancer;
use crate::skill_matcher::{
    estimate_task_minutes, skill_match_score, SkillAssignmentOptions, SkillMatcher,
    EMPTY_REQUIREMENT_BASELINE,
};
use crate::test_utils::builders::{base_time, ProfileBuilder, TaskBuilder, WorkerBuilder};

fn matcher(
    skill_repo: Arc<InMemorySkillRepository>,
    directory: Arc<StaticWorkerDirectory>,
) -> SkillMatcher {
    SkillMatcher::new(
        skill_repo,
        directory,
        LoadBalancer::default(),
        CategoryWeights::default(),
        AxisWeights::default(),
        Arc::new(FixedClock::new(base_time())),
    )
}

#[test]
fn test_required_skills_by_task_type() {
    let cases = [
        (TaskType::Inbound, vec![SkillCategory::Receiving]),
        (
            TaskType::Outbound,
            vec![SkillCategory::Picking, SkillCategory::Packing],
        ),
        (TaskType::Quality, vec![SkillCategory::Quality]),
        (TaskType::Count, vec![SkillCategory::Counting]),
        (TaskType::Transfer, vec![SkillCategory::Equipment]),
    ];
    for (task_type, expected) in cases {
        let task = TaskBuilder::new(1).with_type(task_type).build();
        assert_eq!(SkillMatcher::required_skills(&task), expected);
    }
}

#[test]
fn test_required_skills_payload_extras_and_dedup() {
    let task = TaskBuilder::new(1)
        .with_type(TaskType::Quality)
        .with_flag(payload_keys::REQUIRES_QUALITY_CHECK)
        .with_flag(payload_keys::HAZARDOUS)
        .with_flag(payload_keys::COLD_STORAGE)
        .build();

    let required = SkillMatcher::required_skills(&task);
    // quality基础技能与requires_quality_check去重
    assert_eq!(
        required,
        vec![
            SkillCategory::Quality,
            SkillCategory::Hazardous,
            SkillCategory::ColdStorage,
        ]
    );
}

#[test]
fn test_skill_match_empty_requirement_baseline() {
    let now = base_time();
    let weights = CategoryWeights::default();

    // 任意技能集合下空需求都返回0.8常量基线
    assert!((skill_match_score(&[], &[], &weights, now) - EMPTY_REQUIREMENT_BASELINE).abs()
        < f64::EPSILON);

    let profiles = vec![
        ProfileBuilder::new("w1", SkillCategory::Picking)
            .with_level(10)
            .with_score(100)
            .build(),
        ProfileBuilder::new("w1", SkillCategory::Hazardous)
            .with_level(1)
            .with_score(10)
            .build(),
    ];
    assert!(
        (skill_match_score(&[], &profiles, &weights, now) - EMPTY_REQUIREMENT_BASELINE).abs()
            < f64::EPSILON
    );
}

#[test]
fn test_skill_match_perfect_profile() {
    let now = base_time();
    let profiles = vec![ProfileBuilder::new("w1", SkillCategory::Receiving)
        .with_level(10)
        .with_score(100)
        .build()];

    let score = skill_match_score(
        &[SkillCategory::Receiving],
        &profiles,
        &CategoryWeights::default(),
        now,
    );
    assert!((score - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_skill_match_unmatched_skill_counts_twice() {
    let now = base_time();
    // 需要picking+packing，但只有满分的picking档案：
    // 平均值 = 1.0 / 2，覆盖率 = 1/2，最终 0.25
    let profiles = vec![ProfileBuilder::new("w1", SkillCategory::Picking)
        .with_level(10)
        .with_score(100)
        .build()];

    let score = skill_match_score(
        &[SkillCategory::Picking, SkillCategory::Packing],
        &profiles,
        &CategoryWeights::default(),
        now,
    );
    assert!((score - 0.25).abs() < 1e-9);
}

#[test]
fn test_skill_match_category_weight_applies() {
    let now = base_time();
    let profiles = vec![ProfileBuilder::new("w1", SkillCategory::Hazardous)
        .with_level(10)
        .with_score(100)
        .build()];

    let score = skill_match_score(
        &[SkillCategory::Hazardous],
        &profiles,
        &CategoryWeights::default(),
        now,
    );
    // hazardous默认权重1.5
    assert!((score - 1.5).abs() < 1e-9);
}

#[test]
fn test_skill_match_ignores_unusable_profiles() {
    let now = base_time();
    let inactive = ProfileBuilder::new("w1", SkillCategory::Receiving)
        .with_level(10)
        .with_score(100)
        .inactive()
        .build();
    let expired = ProfileBuilder::new("w1", SkillCategory::Receiving)
        .with_level(10)
        .with_score(100)
        .certified_until(now - Duration::days(1))
        .build();

    let score = skill_match_score(
        &[SkillCategory::Receiving],
        &[inactive, expired],
        &CategoryWeights::default(),
        now,
    );
    assert!(score.abs() < f64::EPSILON);
}

#[test]
fn test_estimate_task_minutes_floors_low_levels() {
    assert_eq!(estimate_task_minutes(10), 60);
    assert_eq!(estimate_task_minutes(8), 75);
    // 低于5级按0.5下限计算
    assert_eq!(estimate_task_minutes(5), 120);
    assert_eq!(estimate_task_minutes(1), 120);
}

#[tokio::test]
async fn test_assign_worker_by_skill_prefers_stronger_candidate() {
    let skill_repo = Arc::new(InMemorySkillRepository::with_profiles(vec![
        ProfileBuilder::new("expert", SkillCategory::Receiving)
            .with_level(10)
            .with_score(100)
            .build(),
        ProfileBuilder::new("novice", SkillCategory::Receiving)
            .with_level(3)
            .with_score(40)
            .build(),
    ]));
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("expert").build(),
        WorkerBuilder::new("novice").build(),
    ]));

    let task = TaskBuilder::new(1).with_type(TaskType::Inbound).build();
    let assignment = matcher(skill_repo, directory)
        .assign_worker_by_skill(&task, &SkillAssignmentOptions::default())
        .await
        .unwrap()
        .expect("应当选出工人");

    assert_eq!(assignment.worker_id, "expert");
    assert_eq!(assignment.assignment_reason, "skill");
    assert_eq!(assignment.estimated_minutes, 60);
}

#[tokio::test]
async fn test_assign_worker_by_skill_honors_exclusion() {
    let skill_repo = Arc::new(InMemorySkillRepository::with_profiles(vec![
        ProfileBuilder::new("expert", SkillCategory::Receiving)
            .with_level(10)
            .with_score(100)
            .build(),
        ProfileBuilder::new("backup", SkillCategory::Receiving)
            .with_level(6)
            .with_score(70)
            .build(),
    ]));
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("expert").build(),
        WorkerBuilder::new("backup").build(),
    ]));

    let task = TaskBuilder::new(1).with_type(TaskType::Inbound).build();
    let options = SkillAssignmentOptions {
        exclude_worker_ids: vec!["expert".to_string()],
        axes: None,
    };
    let assignment = matcher(skill_repo, directory)
        .assign_worker_by_skill(&task, &options)
        .await
        .unwrap()
        .expect("应当选出备选工人");

    assert_eq!(assignment.worker_id, "backup");
}

#[tokio::test]
async fn test_assign_worker_by_skill_no_candidates() {
    let skill_repo = Arc::new(InMemorySkillRepository::new());
    let directory = Arc::new(StaticWorkerDirectory::new());

    let task = TaskBuilder::new(1).with_type(TaskType::Transfer).build();
    let assignment = matcher(skill_repo, directory)
        .assign_worker_by_skill(&task, &SkillAssignmentOptions::default())
        .await
        .unwrap();

    assert!(assignment.is_none());
}

#[tokio::test]
async fn test_assign_worker_by_skill_workload_breaks_skill_tie() {
    let skill_repo = Arc::new(InMemorySkillRepository::with_profiles(vec![
        ProfileBuilder::new("loaded", SkillCategory::Counting)
            .with_level(8)
            .with_score(80)
            .build(),
        ProfileBuilder::new("idle", SkillCategory::Counting)
            .with_level(8)
            .with_score(80)
            .build(),
    ]));
    let directory = Arc::new(StaticWorkerDirectory::with_workers(vec![
        WorkerBuilder::new("loaded").with_workload(8).build(),
        WorkerBuilder::new("idle").build(),
    ]));

    let task = TaskBuilder::new(1).with_type(TaskType::Count).build();
    let assignment = matcher(skill_repo, directory)
        .assign_worker_by_skill(&task, &SkillAssignmentOptions::default())
        .await
        .unwrap()
        .expect("应当选出工人");

    assert_eq!(assignment.worker_id, "idle");
}
