//! 运行前校验
//!
//! 错误阻止运行，警告只提示。

use crate::algorithm::{Algorithm, UnionFind};
use crate::graph::{Graph, Instance};
use crate::types::{format_weight, node_label, NodeId};
use serde::{Deserialize, Serialize};

/// 校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn finish(mut self) -> Self {
        self.ok = self.errors.is_empty();
        self
    }
}

/// 校验算法与输入的组合
pub fn validate(algorithm: &Algorithm, instance: &Instance) -> ValidationReport {
    let mut report = ValidationReport::new();
    let graph = &instance.graph;

    match *algorithm {
        Algorithm::Bfs { start } => {
            check_node(&mut report, graph, "BFS: start node", start);
        }
        Algorithm::Dijkstra { start } => {
            check_node(&mut report, graph, "Dijkstra: start node", start);
            if has_negative_edge(graph) {
                report.error("Dijkstra: negative edge weight found. Only positive weights are allowed.");
            }
            if graph.edges.iter().any(|e| e.w == 0.0) {
                report.error("Dijkstra: zero-weight edges are not allowed.");
            }
        }
        Algorithm::Kruskal => {
            if graph.directed {
                report.error("Kruskal: an undirected graph is required.");
            }
            if graph.edges.is_empty() {
                report.error("Kruskal: the graph has no edges.");
            } else {
                let count = components_count(graph);
                if count > 1 {
                    report.warn(format!(
                        "The graph is not connected ({} components). The MST is only defined per component.",
                        count
                    ));
                }
            }
        }
        Algorithm::MaxFlow { source, sink } => {
            validate_max_flow(&mut report, instance, source, sink);
        }
        Algorithm::Matching => {}
    }

    report.finish()
}

fn validate_max_flow(report: &mut ValidationReport, instance: &Instance, source: NodeId, sink: NodeId) {
    let graph = &instance.graph;
    let endpoints_ok = check_node(report, graph, "Max-Flow: source", source)
        & check_node(report, graph, "Max-Flow: sink", sink);

    if source == sink {
        report.error("Max-Flow: source and sink must differ.");
    }
    if has_negative_edge(graph) {
        report.error("Max-Flow: negative capacity found. Every capacity must be ≥ 0.");
    }
    if !graph.directed {
        report.warn("Max-Flow: undirected edges are treated as capacity in both directions.");
    }

    let matrix = &instance.matrix;
    for (i, row) in matrix.iter().enumerate() {
        if let Some(&c) = row.get(i) {
            if c > 0.0 {
                report.error(format!(
                    "Max-Flow: self-loops are not allowed (A[{},{}] = {}).",
                    i,
                    i,
                    format_weight(c)
                ));
            }
        }
    }
    for (i, row) in matrix.iter().enumerate() {
        for (j, &c) in row.iter().enumerate() {
            if !c.is_finite() {
                report.error(format!("Max-Flow: invalid number A[{},{}] = {}", i, j, c));
                continue;
            }
            if c != 0.0 && c.fract() != 0.0 {
                report.error(format!(
                    "Max-Flow: capacities must be integers (A[{},{}] = {})",
                    i, j, c
                ));
            }
        }
    }

    if !endpoints_ok {
        return;
    }
    let has_out = graph
        .edges
        .iter()
        .any(|e| e.w > 0.0 && (e.u == source || (!graph.directed && e.v == source)));
    let has_in = graph
        .edges
        .iter()
        .any(|e| e.w > 0.0 && (e.v == sink || (!graph.directed && e.u == sink)));
    if !has_out {
        report.warn("The source has no outgoing capacity. The flow will be 0.");
    }
    if !has_in {
        report.warn("The sink has no incoming capacity. The flow will be 0.");
    }
}

/// 节点编号越界时记录错误并返回 false
fn check_node(report: &mut ValidationReport, graph: &Graph, what: &str, node: NodeId) -> bool {
    if graph.contains(node) {
        true
    } else {
        report.error(format!(
            "{} {} is out of range (the graph has {} nodes).",
            what,
            node_label(node),
            graph.n
        ));
        false
    }
}

fn has_negative_edge(graph: &Graph) -> bool {
    graph.edges.iter().any(|e| e.w < 0.0)
}

fn components_count(graph: &Graph) -> usize {
    let mut uf = UnionFind::new(graph.n);
    for e in &graph.edges {
        uf.unite(e.u, e.v);
    }
    uf.component_count()
}
