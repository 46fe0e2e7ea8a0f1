//! Kruskal 最小生成树
//!
//! 边按权重稳定排序后依次尝试合并；非连通图得到最小生成森林。

use super::union_find::UnionFind;
use crate::graph::{Edge, EdgeKey, Graph};
use crate::step::{row, GraphOverlay, Phase, Step, StepLog, Table};
use crate::types::{format_weight, node_label, Weight};
use tracing::debug;

/// Kruskal 步骤序列；有向图只产生一个错误步骤
pub fn kruskal_steps(graph: &Graph) -> Vec<Step> {
    let mut log = StepLog::new();

    if graph.directed {
        log.emit(Step::new(Phase::Error, "An undirected graph is required."));
        return log.finish();
    }

    let mut state = KruskalState::new(graph);
    state.run(&mut log);

    debug!(
        accepted = state.chosen.len(),
        total = state.total_weight(),
        steps = log.len(),
        "Kruskal trace built"
    );
    log.finish()
}

struct KruskalState<'g> {
    graph: &'g Graph,
    sorted: Vec<Edge>,
    dsu: UnionFind,
    chosen: Vec<Edge>,
}

impl<'g> KruskalState<'g> {
    fn new(graph: &'g Graph) -> Self {
        let mut sorted = graph.edges.clone();
        // sort_by 是稳定排序，等权边保持原顺序
        sorted.sort_by(|a, b| a.w.total_cmp(&b.w));
        Self {
            graph,
            sorted,
            dsu: UnionFind::new(graph.n),
            chosen: Vec::new(),
        }
    }

    fn run(&mut self, log: &mut StepLog) {
        log.emit(self.components_step());

        let listing: Vec<String> = self.sorted.iter().map(|e| e.to_string()).collect();
        log.emit(
            Step::new(
                Phase::Initialization,
                format!("Edges sorted: {}", listing.join(" ")),
            )
            .with_aux(self.dsu.table()),
        );

        for i in 0..self.sorted.len() {
            let e = self.sorted[i];
            if self.dsu.unite(e.u, e.v) {
                self.chosen.push(e);
                log.emit(
                    Step::new(
                        Phase::EdgeAccepted,
                        format!("({},{}) w={} added.", e.u, e.v, format_weight(e.w)),
                    )
                    .with_overlay(GraphOverlay::new().edges(self.chosen_keys()))
                    .with_aux(self.dsu.table()),
                );
            } else {
                log.emit(
                    Step::new(
                        Phase::CycleAvoided,
                        format!(
                            "({},{}) skipped: V{} and V{} are already in the same tree.",
                            e.u, e.v, e.u, e.v
                        ),
                    )
                    .with_overlay(GraphOverlay::new().edges(self.chosen_keys()))
                    .with_aux(self.dsu.table()),
                );
            }
        }

        log.emit(
            Step::new(
                Phase::Done,
                format!("MST total weight = {}.", format_weight(self.total_weight())),
            )
            .with_overlay(GraphOverlay::new().edges(self.chosen_keys()))
            .with_main(self.chosen_table())
            .with_aux(self.dsu.table()),
        );
    }

    /// 输入图的连通分量，用独立的并查集计算，仅作诊断
    fn components_step(&self) -> Step {
        let mut components = UnionFind::new(self.graph.n);
        for e in &self.graph.edges {
            components.unite(e.u, e.v);
        }
        let labels = components.component_labels();
        let count = labels.iter().max().map_or(0, |m| m + 1);
        let names: Vec<String> = (0..count).map(|c| format!("C{}", c)).collect();

        let mut table = vec![row(&["Node", "Component"])];
        for (v, c) in labels.iter().enumerate() {
            table.push(vec![node_label(v), format!("C{}", c)]);
        }

        Step::new(
            Phase::Components,
            format!("Components of the input graph: {}.", names.join(", ")),
        )
        .with_main(table)
    }

    fn chosen_keys(&self) -> Vec<EdgeKey> {
        self.chosen.iter().map(Edge::key).collect()
    }

    fn chosen_table(&self) -> Table {
        let mut table = vec![row(&["Edge", "w"])];
        for e in &self.chosen {
            table.push(vec![format!("({},{})", e.u, e.v), format_weight(e.w)]);
        }
        table
    }

    fn total_weight(&self) -> Weight {
        self.chosen.iter().map(|e| e.w).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn square_with_chord() -> Graph {
        let mut g = Graph::new(4, false);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 1.0);
        g.add_edge(2, 3, 1.0);
        g.add_edge(0, 3, 5.0);
        g
    }

    fn accepted(steps: &[Step]) -> usize {
        steps.iter().filter(|s| s.phase == Phase::EdgeAccepted).count()
    }

    fn total_from_done(steps: &[Step]) -> Weight {
        let done = steps.last().unwrap();
        let text = done
            .message
            .trim_start_matches("MST total weight = ")
            .trim_end_matches('.');
        text.parse().unwrap()
    }

    /// 枚举边子集，求 n - c 条边的无环子集中的最小权重
    fn brute_force_forest(graph: &Graph) -> Weight {
        let mut uf = UnionFind::new(graph.n);
        for e in &graph.edges {
            uf.unite(e.u, e.v);
        }
        let target = graph.n - uf.component_count();
        let m = graph.edges.len();
        let mut best = Weight::INFINITY;
        for mask in 0u32..(1 << m) {
            if mask.count_ones() as usize != target {
                continue;
            }
            let mut uf = UnionFind::new(graph.n);
            let mut total = 0.0;
            let mut acyclic = true;
            for (i, e) in graph.edges.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    if !uf.unite(e.u, e.v) {
                        acyclic = false;
                        break;
                    }
                    total += e.w;
                }
            }
            if acyclic && total < best {
                best = total;
            }
        }
        best
    }

    #[test]
    fn test_kruskal_square_scenario() {
        let steps = kruskal_steps(&square_with_chord());

        assert_eq!(steps[0].phase, Phase::Components);
        assert_eq!(steps[0].message, "Components of the input graph: C0.");
        assert_eq!(steps[1].phase, Phase::Initialization);
        assert_eq!(steps[1].message, "Edges sorted: (0,1,1) (1,2,1) (2,3,1) (0,3,5)");

        let phases: Vec<Phase> = steps[2..6].iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::EdgeAccepted,
                Phase::EdgeAccepted,
                Phase::EdgeAccepted,
                Phase::CycleAvoided
            ]
        );
        assert_eq!(steps[6].phase, Phase::Done);
        assert_eq!(steps[6].message, "MST total weight = 3.");
        assert_eq!(steps.len(), 7);

        let highlighted = steps[6].general().unwrap().edges.clone().unwrap();
        assert_eq!(highlighted.len(), 3);
        assert!(!highlighted.contains(&EdgeKey::new(0, 3)));
    }

    #[test]
    fn test_kruskal_directed_is_error() {
        let mut g = Graph::new(2, true);
        g.add_edge(0, 1, 1.0);
        let steps = kruskal_steps(&g);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].phase, Phase::Error);
        assert!(steps[0].graph.is_none());
    }

    #[test]
    fn test_kruskal_stable_order_for_equal_weights() {
        let mut g = Graph::new(3, false);
        g.add_edge(1, 2, 2.0);
        g.add_edge(0, 1, 2.0);
        g.add_edge(0, 2, 1.0);
        let steps = kruskal_steps(&g);
        assert_eq!(steps[1].message, "Edges sorted: (0,2,1) (1,2,2) (0,1,2)");
        assert_eq!(steps[4].phase, Phase::CycleAvoided);
        assert!(steps[4].message.starts_with("(0,1) skipped"));
    }

    #[test]
    fn test_kruskal_forest_on_disconnected_graph() {
        let mut g = Graph::new(5, false);
        g.add_edge(0, 1, 4.0);
        g.add_edge(2, 3, 2.0);
        let steps = kruskal_steps(&g);
        assert_eq!(steps[0].message, "Components of the input graph: C0, C1, C2.");
        assert_eq!(accepted(&steps), 2);
        assert_eq!(total_from_done(&steps), 6.0);
    }

    #[test]
    fn test_kruskal_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..40 {
            let n = rng.gen_range(2..=6);
            let mut g = Graph::new(n, false);
            for u in 0..n {
                for v in (u + 1)..n {
                    if rng.gen_bool(0.5) {
                        g.add_edge(u, v, rng.gen_range(1..=9) as f64);
                    }
                }
            }
            if g.edges.len() > 12 {
                g.edges.truncate(12);
            }

            let steps = kruskal_steps(&g);
            let mut uf = UnionFind::new(n);
            for e in &g.edges {
                uf.unite(e.u, e.v);
            }
            assert_eq!(accepted(&steps), n - uf.component_count());
            assert_eq!(total_from_done(&steps), brute_force_forest(&g));
            assert_eq!(steps, kruskal_steps(&g));
        }
    }
}
