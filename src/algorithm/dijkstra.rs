//! Dijkstra 最短路径
//!
//! 线性扫描选取最小距离顶点（编号小者优先），每次选取和每次松弛各产生一个步骤。
//! 只对正权图有意义，负权 / 零权由校验层拦截。

use crate::graph::{EdgeKey, Graph};
use crate::step::{row, GraphOverlay, Phase, Step, StepLog, Table};
use crate::types::{format_weight, node_label, NodeId, Weight};
use std::collections::BTreeSet;
use tracing::debug;

/// 从 `start` 出发的 Dijkstra 步骤序列
pub fn dijkstra_steps(graph: &Graph, start: NodeId) -> Vec<Step> {
    let mut state = DijkstraState::new(graph, start);
    let mut log = StepLog::new();
    state.run(&mut log);

    debug!(
        start,
        settled = state.used.len(),
        steps = log.len(),
        "Dijkstra trace built"
    );
    log.finish()
}

/// Dijkstra 运行状态
struct DijkstraState<'g> {
    graph: &'g Graph,
    start: NodeId,
    dist: Vec<Weight>,
    prev: Vec<Option<NodeId>>,
    used: BTreeSet<NodeId>,
}

impl<'g> DijkstraState<'g> {
    fn new(graph: &'g Graph, start: NodeId) -> Self {
        let mut dist = vec![Weight::INFINITY; graph.n];
        dist[start] = 0.0;
        Self {
            graph,
            start,
            dist,
            prev: vec![None; graph.n],
            used: BTreeSet::new(),
        }
    }

    fn run(&mut self, log: &mut StepLog) {
        log.emit(
            Step::new(
                Phase::Initialization,
                format!("Start node: V{}. Initial distance table.", self.start),
            )
            .with_overlay(GraphOverlay::new().source(self.start))
            .with_main(self.distance_table()),
        );

        while self.used.len() < self.graph.n {
            let Some(node) = self.select() else {
                break;
            };
            self.used.insert(node);

            log.emit(
                Step::new(
                    Phase::Selection,
                    format!(
                        "V{} settled (d={}).",
                        node,
                        format_weight(self.dist[node])
                    ),
                )
                .with_overlay(
                    GraphOverlay::new()
                        .source(self.start)
                        .nodes(self.used.iter().copied()),
                )
                .with_main(self.distance_table()),
            );

            for (to, w) in self.graph.neighbors(node) {
                if self.used.contains(&to) {
                    continue;
                }
                let candidate = self.dist[node] + w;
                if candidate < self.dist[to] {
                    self.dist[to] = candidate;
                    self.prev[to] = Some(node);

                    log.emit(
                        Step::new(
                            Phase::Relax,
                            format!(
                                "Relaxing V{}→V{}: new d[V{}]={}.",
                                node,
                                to,
                                to,
                                format_weight(candidate)
                            ),
                        )
                        .with_overlay(
                            GraphOverlay::new()
                                .source(self.start)
                                .nodes(self.used.iter().copied())
                                .edges([EdgeKey::new(node, to)]),
                        )
                        .with_main(self.distance_table()),
                    );
                }
            }
        }

        log.emit(
            Step::new(Phase::Done, "Dijkstra's algorithm finished.")
                .with_overlay(GraphOverlay::new().source(self.start))
                .with_main(self.distance_table()),
        );
    }

    /// 未确定顶点中距离最小且有限者；并列时取编号最小
    fn select(&self) -> Option<NodeId> {
        let mut best: Option<NodeId> = None;
        for v in 0..self.graph.n {
            if self.used.contains(&v) || !self.dist[v].is_finite() {
                continue;
            }
            match best {
                Some(b) if self.dist[v] >= self.dist[b] => {}
                _ => best = Some(v),
            }
        }
        best
    }

    fn distance_table(&self) -> Table {
        let mut table = vec![row(&["Node", "d", "prev"])];
        for v in 0..self.graph.n {
            table.push(vec![
                node_label(v),
                format_weight(self.dist[v]),
                self.prev[v]
                    .map(node_label)
                    .unwrap_or_else(|| "–".to_string()),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 从最终步骤的距离表中读回 d 列
    fn final_distances(steps: &[Step]) -> Vec<Weight> {
        steps
            .last()
            .unwrap()
            .main_table()
            .unwrap()
            .iter()
            .skip(1)
            .map(|r| {
                if r[1] == "∞" {
                    Weight::INFINITY
                } else {
                    r[1].parse().unwrap()
                }
            })
            .collect()
    }

    /// Floyd–Warshall 作为独立对照
    fn all_pairs(graph: &Graph) -> Vec<Vec<Weight>> {
        let n = graph.n;
        let mut d = vec![vec![Weight::INFINITY; n]; n];
        for (i, row) in d.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for e in &graph.edges {
            d[e.u][e.v] = d[e.u][e.v].min(e.w);
            if !graph.directed {
                d[e.v][e.u] = d[e.v][e.u].min(e.w);
            }
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if d[i][k] + d[k][j] < d[i][j] {
                        d[i][j] = d[i][k] + d[k][j];
                    }
                }
            }
        }
        d
    }

    #[test]
    fn test_dijkstra_basic() {
        let mut g = Graph::new(4, false);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 1.0);
        g.add_edge(2, 3, 1.0);
        g.add_edge(0, 3, 5.0);

        let steps = dijkstra_steps(&g, 0);
        assert_eq!(steps[0].phase, Phase::Initialization);
        assert_eq!(steps[1].phase, Phase::Selection);
        assert_eq!(steps[1].message, "V0 settled (d=0).");
        assert_eq!(final_distances(&steps), vec![0.0, 1.0, 2.0, 3.0]);

        let selections = steps.iter().filter(|s| s.phase == Phase::Selection).count();
        assert_eq!(selections, 4);

        // V3 先被 0-3 松弛为 5，随后经 V2 改为 3
        let relax_v3: Vec<&str> = steps
            .iter()
            .filter(|s| s.phase == Phase::Relax && s.message.contains("d[V3]"))
            .map(|s| s.message.as_str())
            .collect();
        assert_eq!(
            relax_v3,
            vec!["Relaxing V0→V3: new d[V3]=5.", "Relaxing V2→V3: new d[V3]=3."]
        );
        let final_table = steps.last().unwrap().main_table().unwrap();
        assert_eq!(final_table[4], vec!["V3", "3", "V2"]);
    }

    #[test]
    fn test_dijkstra_relax_highlights_edge() {
        let mut g = Graph::new(2, true);
        g.add_edge(0, 1, 4.0);
        let steps = dijkstra_steps(&g, 0);
        let relax = steps.iter().find(|s| s.phase == Phase::Relax).unwrap();
        let edges = relax.general().unwrap().edges.clone().unwrap();
        assert_eq!(edges, BTreeSet::from([EdgeKey::new(0, 1)]));
    }

    #[test]
    fn test_dijkstra_unreachable_stays_infinite() {
        let mut g = Graph::new(4, true);
        g.add_edge(0, 1, 2.0);
        g.add_edge(2, 3, 1.0);
        let steps = dijkstra_steps(&g, 0);
        let d = final_distances(&steps);
        assert_eq!(d[1], 2.0);
        assert!(d[2].is_infinite());
        assert!(d[3].is_infinite());
        // 无法到达的顶点不会被选取
        let selections = steps.iter().filter(|s| s.phase == Phase::Selection).count();
        assert_eq!(selections, 2);
        assert_eq!(steps.last().unwrap().phase, Phase::Done);
    }

    #[test]
    fn test_dijkstra_tie_breaks_on_lowest_id() {
        let mut g = Graph::new(3, false);
        g.add_edge(0, 2, 1.0);
        g.add_edge(0, 1, 1.0);
        let steps = dijkstra_steps(&g, 0);
        let selections: Vec<&str> = steps
            .iter()
            .filter(|s| s.phase == Phase::Selection)
            .map(|s| s.message.as_str())
            .collect();
        assert_eq!(selections, vec!["V0 settled (d=0).", "V1 settled (d=1).", "V2 settled (d=1)."]);
    }

    #[test]
    fn test_dijkstra_matches_all_pairs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..60 {
            let n = rng.gen_range(1..=7);
            let directed = rng.gen_bool(0.5);
            let mut g = Graph::new(n, directed);
            for u in 0..n {
                for v in 0..n {
                    if u != v && (directed || u < v) && rng.gen_bool(0.4) {
                        g.add_edge(u, v, rng.gen_range(1..=9) as f64);
                    }
                }
            }
            let reference = all_pairs(&g);
            for start in 0..n {
                let steps = dijkstra_steps(&g, start);
                assert_eq!(final_distances(&steps), reference[start]);
                assert_eq!(steps, dijkstra_steps(&g, start));
            }
        }
    }
}
