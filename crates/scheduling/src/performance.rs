/// 历史表现中性分
pub const NEUTRAL_PERFORMANCE_SCORE: f64 = 0.5;

/// 历史表现分析器
///
/// 占位实现：接口保留，当前对所有工人返回中性分。
/// 接入真实的绩效数据源时只需替换本实现，评分组合逻辑不变。
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceAnalyzer;

impl PerformanceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn performance_score(&self, _worker_id: &str) -> f64 {
        NEUTRAL_PERFORMANCE_SCORE
    }
}
