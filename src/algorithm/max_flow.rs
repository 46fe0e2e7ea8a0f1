//! 最大流算法
//!
//! 实现 Edmonds-Karp 算法（基于 BFS 的 Ford-Fulkerson），
//! 每条增广路产生一个步骤

use crate::graph::{EdgeKey, Graph};
use crate::step::{row, GraphOverlay, Phase, Step, StepLog, Table};
use crate::types::{format_weight, node_label, NodeId, Weight};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// 最大流结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxFlow {
    /// 最大流量值
    pub value: Weight,
    /// 正流量的边 `(u, v, flow)`
    pub flow: Vec<(NodeId, NodeId, Weight)>,
    /// 最小割的源侧顶点集
    pub source_side: BTreeSet<NodeId>,
}

/// 从 `s` 到 `t` 的最大流步骤序列
pub fn max_flow_steps(graph: &Graph, s: NodeId, t: NodeId) -> Vec<Step> {
    EdmondsKarp::new(graph).run(s, t).1
}

/// Edmonds-Karp 最大流算法
pub struct EdmondsKarp<'g> {
    graph: &'g Graph,
}

impl<'g> EdmondsKarp<'g> {
    /// 创建算法实例
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// 计算从 source 到 sink 的最大流，同时生成步骤序列
    pub fn run(&self, source: NodeId, sink: NodeId) -> (MaxFlow, Vec<Step>) {
        let mut residual = Residual::new(self.graph);
        let mut log = StepLog::new();
        let mut total = 0.0;

        log.emit(
            Step::new(
                Phase::Initialization,
                format!("Source V{}, sink V{}. Total flow = 0.", source, sink),
            )
            .with_overlay(GraphOverlay::new().source(source))
            .with_main(residual.table()),
        );

        // Edmonds-Karp: 重复 BFS 找增广路径
        loop {
            let bottleneck = residual.bfs(source, sink);
            if bottleneck <= 0.0 {
                break;
            }

            let path = residual.path_to(source, sink);
            for pair in path.windows(2) {
                residual.push(pair[0], pair[1], bottleneck);
            }
            total += bottleneck;

            let rendered: Vec<String> = path.iter().map(|&v| node_label(v)).collect();
            log.emit(
                Step::new(
                    Phase::AugmentingPath,
                    format!(
                        "Path capacity = {}. Total flow = {}. Path: {}",
                        format_weight(bottleneck),
                        format_weight(total),
                        rendered.join(" → ")
                    ),
                )
                .with_overlay(
                    GraphOverlay::new()
                        .source(source)
                        .edges(path.windows(2).map(|p| EdgeKey::new(p[0], p[1]))),
                )
                .with_main(residual.table()),
            );
        }

        // 找最小割（从源点出发沿残余边能到达的顶点属于源侧）
        let source_side = residual.reachable_from(source);
        let flow = residual.flows();

        let mut flow_table = vec![row(&["Edge", "Flow", "Capacity"])];
        for &(u, v, f) in &flow {
            flow_table.push(vec![
                format!("V{}→V{}", u, v),
                format_weight(f),
                format_weight(residual.capacity[u][v]),
            ]);
        }

        log.emit(
            Step::new(Phase::Done, format!("Maximum flow = {}.", format_weight(total)))
                .with_overlay(
                    GraphOverlay::new()
                        .source(source)
                        .nodes(source_side.iter().copied())
                        .edges(flow.iter().map(|&(u, v, _)| EdgeKey::new(u, v))),
                )
                .with_main(flow_table),
        );

        debug!(source, sink, value = total, steps = log.len(), "max-flow trace built");

        (
            MaxFlow {
                value: total,
                flow,
                source_side,
            },
            log.finish(),
        )
    }
}

/// 残余容量矩阵
struct Residual {
    n: usize,
    /// 原始容量（并行边累加，无向边两个方向都填）
    capacity: Vec<Vec<Weight>>,
    /// 当前残余容量
    remaining: Vec<Vec<Weight>>,
    parent: Vec<Option<NodeId>>,
}

impl Residual {
    fn new(graph: &Graph) -> Self {
        let n = graph.n;
        let mut capacity = vec![vec![0.0; n]; n];
        for edge in &graph.edges {
            capacity[edge.u][edge.v] += edge.w;
            if !graph.directed {
                capacity[edge.v][edge.u] += edge.w;
            }
        }
        Self {
            n,
            remaining: capacity.clone(),
            capacity,
            parent: vec![None; n],
        }
    }

    /// BFS 找增广路径，记录父指针并返回瓶颈容量；到达汇点立即返回，找不到时为 0
    fn bfs(&mut self, source: NodeId, sink: NodeId) -> Weight {
        self.parent.fill(None);
        self.parent[source] = Some(source);

        let mut queue = VecDeque::new();
        queue.push_back((source, Weight::INFINITY));

        while let Some((v, cap)) = queue.pop_front() {
            for to in 0..self.n {
                if self.parent[to].is_none() && self.remaining[v][to] > 0.0 {
                    self.parent[to] = Some(v);
                    let next = cap.min(self.remaining[v][to]);
                    if to == sink {
                        return next;
                    }
                    queue.push_back((to, next));
                }
            }
        }
        0.0
    }

    /// 按父指针重构 `source … sink` 路径
    fn path_to(&self, source: NodeId, sink: NodeId) -> Vec<NodeId> {
        let mut path = vec![sink];
        let mut cur = sink;
        while cur != source {
            match self.parent[cur] {
                Some(p) => cur = p,
                None => break,
            }
            path.push(cur);
        }
        path.reverse();
        path
    }

    /// 沿 `u -> v` 推送流量：正向减少、反向增加
    fn push(&mut self, u: NodeId, v: NodeId, amount: Weight) {
        self.remaining[u][v] -= amount;
        self.remaining[v][u] += amount;
    }

    fn reachable_from(&self, source: NodeId) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(source);
        queue.push_back(source);

        while let Some(u) = queue.pop_front() {
            for v in 0..self.n {
                if !visited.contains(&v) && self.remaining[u][v] > 0.0 {
                    visited.insert(v);
                    queue.push_back(v);
                }
            }
        }
        visited
    }

    /// 只保留正流量
    fn flows(&self) -> Vec<(NodeId, NodeId, Weight)> {
        let mut out = Vec::new();
        for u in 0..self.n {
            for v in 0..self.n {
                let used = self.capacity[u][v] - self.remaining[u][v];
                if self.capacity[u][v] > 0.0 && used > 0.0 {
                    out.push((u, v, used.min(self.capacity[u][v])));
                }
            }
        }
        out
    }

    fn table(&self) -> Table {
        let mut header = vec!["Residual".to_string()];
        header.extend((0..self.n).map(node_label));
        let mut table = vec![header];
        for u in 0..self.n {
            let mut r = vec![node_label(u)];
            r.extend(self.remaining[u].iter().map(|&c| format_weight(c)));
            table.push(r);
        }
        table
    }
}
