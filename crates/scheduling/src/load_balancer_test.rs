use crate::load_balancer::LoadBalancer;
use crate::test_utils::builders::WorkerBuilder;

#[test]
fn test_filter_eligible_excludes_busy_offline_and_full_workers() {
    let balancer = LoadBalancer::default();
    let workers = vec![
        WorkerBuilder::new("w1").build(),
        WorkerBuilder::new("w2").with_workload(9).build(),
        WorkerBuilder::new("w3").with_workload(10).build(), // 满载
        WorkerBuilder::new("w4").busy().build(),
        WorkerBuilder::new("w5").offline().build(),
        WorkerBuilder::new("w6").with_workload(12).build(), // 超载
    ];

    let eligible = balancer.filter_eligible(&workers);
    let ids: Vec<&str> = eligible.iter().map(|w| w.worker_id()).collect();
    assert_eq!(ids, vec!["w1", "w2"]);
}

#[test]
fn test_filter_eligible_empty_input() {
    let balancer = LoadBalancer::default();
    assert!(balancer.filter_eligible(&[]).is_empty());
}

#[test]
fn test_workload_score_linear_decay() {
    let balancer = LoadBalancer::default();
    assert!((balancer.workload_score(0) - 1.0).abs() < f64::EPSILON);
    assert!((balancer.workload_score(5) - 0.5).abs() < f64::EPSILON);
    assert!((balancer.workload_score(10)).abs() < f64::EPSILON);
    // 超过容量不会为负
    assert!((balancer.workload_score(15)).abs() < f64::EPSILON);
}

#[test]
fn test_workload_score_monotonically_non_increasing() {
    let balancer = LoadBalancer::default();
    let mut previous = f64::MAX;
    for load in 0..=12 {
        let score = balancer.workload_score(load);
        assert!(score <= previous, "负载 {load} 的得分不应高于更低负载");
        previous = score;
    }
}

#[test]
fn test_custom_capacity() {
    let balancer = LoadBalancer::with_capacity(4);
    assert!((balancer.workload_score(2) - 0.5).abs() < f64::EPSILON);

    let workers = vec![WorkerBuilder::new("w1").with_workload(4).build()];
    assert!(balancer.filter_eligible(&workers).is_empty());
}
