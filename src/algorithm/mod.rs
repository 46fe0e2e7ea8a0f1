//! 图算法模块
//!
//! 五个算法各自把输入展开为完整的步骤序列；
//! [`run`] 按 [`Algorithm`] 分派，[`execute`] 在其前面加上校验与指标记录。

mod bfs;
mod dijkstra;
mod kruskal;
mod matching;
mod max_flow;
mod union_find;

pub use bfs::bfs_steps;
pub use dijkstra::dijkstra_steps;
pub use kruskal::kruskal_steps;
pub use matching::matching_steps;
pub use max_flow::{max_flow_steps, EdmondsKarp, MaxFlow};
pub use union_find::UnionFind;

use crate::error::{Error, Result};
use crate::graph::Instance;
use crate::metrics;
use crate::step::Step;
use crate::types::NodeId;
use crate::validation::{validate, ValidationReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

/// 算法种类（不带参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    Bfs,
    Dijkstra,
    Kruskal,
    Matching,
    #[serde(rename = "maxflow", alias = "max_flow")]
    MaxFlow,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 5] = [
        AlgorithmKind::Bfs,
        AlgorithmKind::Dijkstra,
        AlgorithmKind::Kruskal,
        AlgorithmKind::Matching,
        AlgorithmKind::MaxFlow,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AlgorithmKind::Bfs => "bfs",
            AlgorithmKind::Dijkstra => "dijkstra",
            AlgorithmKind::Kruskal => "kruskal",
            AlgorithmKind::Matching => "matching",
            AlgorithmKind::MaxFlow => "maxflow",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlgorithmKind::Bfs => "Breadth-first search",
            AlgorithmKind::Dijkstra => "Dijkstra shortest paths",
            AlgorithmKind::Kruskal => "Kruskal minimum spanning tree",
            AlgorithmKind::Matching => "Bipartite matching (Hungarian method)",
            AlgorithmKind::MaxFlow => "Edmonds–Karp maximum flow",
        }
    }

    /// 用默认参数构造算法：起点 0，汇点 n-1
    pub fn with_defaults(self, n: usize) -> Algorithm {
        match self {
            AlgorithmKind::Bfs => Algorithm::Bfs { start: 0 },
            AlgorithmKind::Dijkstra => Algorithm::Dijkstra { start: 0 },
            AlgorithmKind::Kruskal => Algorithm::Kruskal,
            AlgorithmKind::Matching => Algorithm::Matching,
            AlgorithmKind::MaxFlow => Algorithm::MaxFlow {
                source: 0,
                sink: n.saturating_sub(1),
            },
        }
    }

    /// 用给定的起点 / 终点构造算法；缺省时取默认值
    pub fn with_params(self, n: usize, start: Option<NodeId>, target: Option<NodeId>) -> Algorithm {
        match self.with_defaults(n) {
            Algorithm::Bfs { start: s } => Algorithm::Bfs {
                start: start.unwrap_or(s),
            },
            Algorithm::Dijkstra { start: s } => Algorithm::Dijkstra {
                start: start.unwrap_or(s),
            },
            Algorithm::MaxFlow { source, sink } => Algorithm::MaxFlow {
                source: start.unwrap_or(source),
                sink: target.unwrap_or(sink),
            },
            other => other,
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bfs" => Ok(AlgorithmKind::Bfs),
            "dijkstra" => Ok(AlgorithmKind::Dijkstra),
            "kruskal" | "mst" => Ok(AlgorithmKind::Kruskal),
            "matching" | "hungarian" => Ok(AlgorithmKind::Matching),
            "maxflow" | "max_flow" | "max-flow" | "flow" => Ok(AlgorithmKind::MaxFlow),
            other => Err(Error::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// 带参数的算法选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Algorithm {
    Bfs { start: NodeId },
    Dijkstra { start: NodeId },
    Kruskal,
    Matching,
    #[serde(rename = "maxflow", alias = "max_flow")]
    MaxFlow { source: NodeId, sink: NodeId },
}

impl Algorithm {
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::Bfs { .. } => AlgorithmKind::Bfs,
            Algorithm::Dijkstra { .. } => AlgorithmKind::Dijkstra,
            Algorithm::Kruskal => AlgorithmKind::Kruskal,
            Algorithm::Matching => AlgorithmKind::Matching,
            Algorithm::MaxFlow { .. } => AlgorithmKind::MaxFlow,
        }
    }
}

/// 运行算法，返回完整的步骤序列
///
/// 不做任何校验；非法输入得到的步骤序列没有约定含义。
pub fn run(algorithm: &Algorithm, instance: &Instance) -> Vec<Step> {
    let graph = &instance.graph;
    match *algorithm {
        Algorithm::Bfs { start } => bfs_steps(graph, start),
        Algorithm::Dijkstra { start } => dijkstra_steps(graph, start),
        Algorithm::Kruskal => kruskal_steps(graph),
        Algorithm::Matching => matching_steps(&instance.matrix),
        Algorithm::MaxFlow { source, sink } => max_flow_steps(graph, source, sink),
    }
}

/// 一次成功执行的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub algorithm: Algorithm,
    pub warnings: Vec<String>,
    pub steps: Vec<Step>,
}

/// 校验后运行；校验错误直接返回，不调用算法
pub fn execute(algorithm: &Algorithm, instance: &Instance) -> Result<Execution> {
    let metrics = metrics::global_metrics();
    let report: ValidationReport = validate(algorithm, instance);

    for w in &report.warnings {
        warn!(algorithm = %algorithm.kind(), "{}", w);
    }
    metrics.record_warnings(report.warnings.len());

    if !report.ok {
        warn!(algorithm = %algorithm.kind(), errors = ?report.errors, "validation rejected run");
        metrics.record_rejection(algorithm.kind());
        return Err(Error::Validation(report));
    }

    let started = Instant::now();
    let steps = run(algorithm, instance);
    metrics.record_run(algorithm.kind(), steps.len(), started.elapsed());

    info!(
        algorithm = %algorithm.kind(),
        n = instance.n(),
        steps = steps.len(),
        "run completed"
    );

    Ok(Execution {
        algorithm: *algorithm,
        warnings: report.warnings,
        steps,
    })
}
