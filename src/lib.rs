//! # 仓储作业任务调度系统
//!
//! 组合根：把外部注入的任务存储、技能档案存储、工人目录和时钟
//! 装配成完整的调度服务集群，并暴露顶层用例。
//!
//! 调度结果是内存结构，由外部调用方（管理操作/API/批处理作业）
//! 负责持久化与通知投递。

pub mod system;

pub use system::SchedulingSystem;

pub use warehouse_core as core;
pub use warehouse_domain as domain;
pub use warehouse_scheduling as scheduling;
