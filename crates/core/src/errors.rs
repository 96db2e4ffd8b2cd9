use thiserror::Error;

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("存储访问错误: {0}")]
    Storage(String),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: i64 },

    #[error("工人未找到: {id}")]
    WorkerNotFound { id: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("无效的任务参数: {0}")]
    InvalidTaskParams(String),

    #[error("内部错误: {0}")]
    Internal(String),
}
