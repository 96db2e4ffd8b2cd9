//! # 数据模型
//!
//! 定义仓储作业调度系统的核心数据结构，包括任务、工人技能档案、
//! 工人运行时状态以及调度过程中产生的瞬态结果。
//!
//! ## 核心模型
//!
//! ### Task - 仓储作业任务
//! 表示一个可调度的仓储作业单元（入库、出库、质检、盘点、移库），
//! 携带优先级、状态机和结构化payload（加急标记、客户等级、截止时间等）。
//!
//! ### WorkerSkillProfile - 工人技能档案
//! 每个（工人，技能类别）一条记录，包含技能等级、技能评分、
//! 有效标志和认证有效期窗口。
//!
//! ### WorkerRuntimeState - 工人运行时状态
//! 每次调度调用开始时重新构建的临时快照：当前负载与可用性。
//! 本子系统不持久化该结构。
//!
//! ### AssignmentResult / PriorityChange - 瞬态结果
//! 分配结果与优先级变更记录，合并进任务payload或返回给调用方，
//! 不作为独立实体持久化。
//!
//! ## 设计原则
//!
//! - 所有时间字段使用 `DateTime<Utc>` 确保时区一致性
//! - 状态字段使用枚举类型，避免无效状态
//! - payload中的异常数据降级为文档化的中性默认值，从不报错

pub mod assignment;
pub mod task;
pub mod worker;

pub use assignment::*;
pub use task::*;
pub use worker::*;
