//! 领域端口抽象
//!
//! 定义调度子系统消费的外部协作者接口，遵循依赖倒置原则。
//! 持久化机制、通知投递与存储拓扑均在本子系统范围之外，
//! 这里只声明调度器需要的能力，并提供嵌入式/测试用的内存实现。

pub mod clock;
pub mod memory;
pub mod ports;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::{InMemorySkillRepository, InMemoryTaskRepository, StaticWorkerDirectory};
pub use ports::{TaskRepository, WorkerDirectory, WorkerSkillRepository};
