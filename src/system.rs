use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use warehouse_core::{SchedulerResult, SchedulingConfig, Task};
use warehouse_domain::{Clock, TaskRepository, WorkerDirectory, WorkerSkillRepository};
use warehouse_scheduling::{
    AnalysisWindow, BatchScheduleResult, BatchScheduler, LoadBalancer, LowestPriorityPreemption,
    OptimizationReport, PreemptionPolicy, PriorityRecalculation, QueueHealthSnapshot,
    QueueMonitor, SchedulingOptimizer, SkillAssignment, SkillAssignmentOptions, SkillMatcher,
    TaskPriorityCalculator, UrgentHandlingResult, UrgentTaskHandler, UrgentTaskOptions,
    WorkerAssignmentEngine,
};

/// 调度系统组合根
///
/// 持有装配完成的各调度服务，所有用例共享同一份配置与时钟。
pub struct SchedulingSystem {
    config: SchedulingConfig,
    priority_calculator: TaskPriorityCalculator,
    skill_matcher: SkillMatcher,
    batch_scheduler: BatchScheduler,
    urgent_handler: UrgentTaskHandler,
    queue_monitor: QueueMonitor,
    optimizer: SchedulingOptimizer,
}

impl SchedulingSystem {
    /// 用默认抢占策略装配调度系统
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        skill_repo: Arc<dyn WorkerSkillRepository>,
        directory: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
    ) -> Self {
        Self::with_policy(
            task_repo,
            skill_repo,
            directory,
            clock,
            config,
            Arc::new(LowestPriorityPreemption),
        )
    }

    /// 用自定义抢占策略装配调度系统
    pub fn with_policy(
        task_repo: Arc<dyn TaskRepository>,
        skill_repo: Arc<dyn WorkerSkillRepository>,
        directory: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
        config: SchedulingConfig,
        preemption_policy: Arc<dyn PreemptionPolicy>,
    ) -> Self {
        info!("初始化调度系统");

        let load_balancer = LoadBalancer::new(&config.assignment);
        let engine = WorkerAssignmentEngine::new(
            load_balancer.clone(),
            config.category_weights.clone(),
            clock.clone(),
        );

        let priority_calculator = TaskPriorityCalculator::new(
            task_repo.clone(),
            config.priority.clone(),
            clock.clone(),
        );
        let skill_matcher = SkillMatcher::new(
            skill_repo,
            directory.clone(),
            load_balancer,
            config.category_weights.clone(),
            config.assignment.axes.clone(),
            clock.clone(),
        );
        let batch_scheduler = BatchScheduler::new(
            engine.clone(),
            task_repo.clone(),
            directory.clone(),
            config.assignment.max_tasks_per_worker,
            clock.clone(),
        );
        let urgent_handler = UrgentTaskHandler::new(
            engine,
            task_repo.clone(),
            directory.clone(),
            preemption_policy,
            config.urgent.clone(),
            clock.clone(),
        );
        let queue_monitor = QueueMonitor::new(task_repo.clone(), directory.clone(), clock.clone());
        let optimizer = SchedulingOptimizer::new(
            task_repo,
            directory,
            config.assignment.max_tasks_per_worker,
            clock,
        );

        Self {
            config,
            priority_calculator,
            skill_matcher,
            batch_scheduler,
            urgent_handler,
            queue_monitor,
            optimizer,
        }
    }

    /// 从配置文件装配调度系统
    pub fn from_config_file(
        task_repo: Arc<dyn TaskRepository>,
        skill_repo: Arc<dyn WorkerSkillRepository>,
        directory: Arc<dyn WorkerDirectory>,
        clock: Arc<dyn Clock>,
        config_path: Option<&str>,
    ) -> anyhow::Result<Self> {
        let config = SchedulingConfig::load(config_path).context("加载调度配置失败")?;
        Ok(Self::new(task_repo, skill_repo, directory, clock, config))
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// 重算一页PENDING任务的优先级
    pub async fn recalculate_priorities(
        &self,
        limit: usize,
    ) -> SchedulerResult<PriorityRecalculation> {
        self.priority_calculator.recalculate_pending(limit).await
    }

    /// 基于技能为单个任务挑选工人（不修改任务状态）
    pub async fn assign_worker_by_skill(
        &self,
        task: &Task,
        options: &SkillAssignmentOptions,
    ) -> SchedulerResult<Option<SkillAssignment>> {
        self.skill_matcher.assign_worker_by_skill(task, options).await
    }

    /// 读取一页PENDING任务并批量调度
    pub async fn schedule_pending(&self, limit: usize) -> SchedulerResult<BatchScheduleResult> {
        self.batch_scheduler.schedule_pending(limit).await
    }

    /// 批量调度给定的任务集合
    pub async fn schedule_batch(&self, tasks: Vec<Task>) -> SchedulerResult<BatchScheduleResult> {
        self.batch_scheduler.schedule_batch(tasks).await
    }

    /// 处理紧急任务：立即分配 → 抢占 → 排队
    pub async fn handle_urgent_task(
        &self,
        task: Task,
        options: &UrgentTaskOptions,
    ) -> SchedulerResult<UrgentHandlingResult> {
        self.urgent_handler.handle_urgent_task(task, options).await
    }

    /// 队列健康快照（只读）
    pub async fn queue_health(&self) -> SchedulerResult<QueueHealthSnapshot> {
        self.queue_monitor.snapshot().await
    }

    /// 最近days天的优化分析报告（只读）
    pub async fn optimization_report(&self, days: i64) -> SchedulerResult<OptimizationReport> {
        self.optimizer.analyze_recent_days(days).await
    }

    /// 指定窗口的优化分析报告（只读）
    pub async fn optimization_report_for(
        &self,
        window: AnalysisWindow,
    ) -> SchedulerResult<OptimizationReport> {
        self.optimizer.analyze(window).await
    }
}
