//! # 配置管理
//!
//! 调度子系统的强类型配置。所有评分器共享同一个 [`SchedulingConfig`]，
//! 松散的键值覆盖统一经由 [`SchedulingConfig::apply_options`] 解析，
//! 不再在各评分器内部做临时的数字字符串强转。
//!
//! 加载顺序：内置默认值 → TOML配置文件 → `WAREHOUSE_` 前缀环境变量。

pub mod loader;
pub mod models;

pub use models::*;
