//! algotrace - 图算法逐步演示引擎
//!
//! 把经典图算法的执行过程展开为可回放的步骤序列：
//! - BFS、Dijkstra、Kruskal、二分图匹配、Edmonds–Karp 最大流
//! - 运行前校验，阻止无意义的输入
//! - 带自动播放的回放控制器
//! - 命令行控制台与 HTTP JSON 接口

pub mod algorithm;
pub mod cli;
pub mod error;
pub mod graph;
pub mod import;
pub mod metrics;
pub mod server;
pub mod step;
pub mod stepper;
pub mod types;
pub mod validation;

// 重导出常用类型
pub use algorithm::{execute, run, Algorithm, AlgorithmKind, Execution};
pub use error::{Error, Result};
pub use graph::{Edge, EdgeKey, Graph, Instance, Vertex};
pub use step::{Overlay, Phase, Step, Tables};
pub use stepper::{PlaybackConfig, PlaybackState, Stepper};
pub use types::{Matrix, NodeId, Weight};
pub use validation::{validate, ValidationReport};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
