//! 广度优先搜索
//!
//! 队列、已访问集合与边界集合（已入队未出队）逐步展开为步骤序列

use crate::graph::Graph;
use crate::step::{row, GraphOverlay, Phase, Step, StepLog, Table};
use crate::types::{join_nodes, node_label, NodeId};
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// 从 `start` 出发的 BFS 步骤序列
pub fn bfs_steps(graph: &Graph, start: NodeId) -> Vec<Step> {
    let mut state = BfsState::new(graph, start);
    let mut log = StepLog::new();
    state.run(&mut log);

    debug!(
        start,
        visited = state.order.len(),
        steps = log.len(),
        "BFS trace built"
    );
    log.finish()
}

/// BFS 运行状态
struct BfsState<'g> {
    graph: &'g Graph,
    start: NodeId,
    queue: VecDeque<NodeId>,
    /// 出队顺序
    order: Vec<NodeId>,
    visited: Vec<bool>,
    frontier: BTreeSet<NodeId>,
    /// 发现该顶点时正在处理的顶点
    discovered_from: Vec<Option<NodeId>>,
}

impl<'g> BfsState<'g> {
    fn new(graph: &'g Graph, start: NodeId) -> Self {
        Self {
            graph,
            start,
            queue: VecDeque::new(),
            order: Vec::new(),
            visited: vec![false; graph.n],
            frontier: BTreeSet::new(),
            discovered_from: vec![None; graph.n],
        }
    }

    fn run(&mut self, log: &mut StepLog) {
        self.queue.push_back(self.start);
        self.frontier.insert(self.start);

        log.emit(
            Step::new(
                Phase::Initialization,
                format!(
                    "Starting from V{}. Queue: [{}]",
                    self.start,
                    join_nodes(self.queue.iter().copied())
                ),
            )
            .with_overlay(
                GraphOverlay::new()
                    .source(self.start)
                    .frontier(self.frontier.iter().copied()),
            )
            .with_main(self.state_table())
            .with_aux(self.queue_table()),
        );

        while let Some(node) = self.queue.pop_front() {
            self.frontier.remove(&node);
            self.visited[node] = true;
            self.order.push(node);

            log.emit(
                Step::new(Phase::Dequeue, format!("Processing V{}.", node))
                    .with_overlay(
                        GraphOverlay::new()
                            .source(self.start)
                            .nodes(self.visited_set()),
                    )
                    .with_main(self.state_table())
                    .with_aux(self.queue_table()),
            );

            for to in self.sorted_neighbors(node) {
                if self.visited[to] || self.frontier.contains(&to) {
                    continue;
                }
                self.queue.push_back(to);
                self.frontier.insert(to);
                self.discovered_from[to] = Some(node);

                log.emit(
                    Step::new(
                        Phase::Neighbor,
                        format!("Appending V{} to the end of the queue.", to),
                    )
                    .with_overlay(
                        GraphOverlay::new()
                            .source(self.start)
                            .nodes(self.visited_set())
                            .frontier(self.frontier.iter().copied()),
                    )
                    .with_main(self.state_table())
                    .with_aux(self.queue_table()),
                );
            }
        }

        log.emit(
            Step::new(
                Phase::Done,
                format!(
                    "Every reachable node visited: {{{}}}.",
                    join_nodes(self.order.iter().copied())
                ),
            )
            .with_overlay(
                GraphOverlay::new()
                    .source(self.start)
                    .nodes(self.visited_set()),
            )
            .with_main(self.state_table()),
        );
    }

    /// 与 `node` 相连的所有顶点，按编号升序
    fn sorted_neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors(node)
            .into_iter()
            .map(|(to, _)| to)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    fn visited_set(&self) -> BTreeSet<NodeId> {
        self.order.iter().copied().collect()
    }

    fn state_table(&self) -> Table {
        let mut table = vec![row(&["Node", "State", "Note"])];
        for v in 0..self.graph.n {
            let state = if self.visited[v] {
                "visited"
            } else if self.frontier.contains(&v) {
                "queued"
            } else {
                "–"
            };
            let note = if v == self.start {
                "start".to_string()
            } else {
                self.discovered_from[v]
                    .map(|p| format!("from V{}", p))
                    .unwrap_or_default()
            };
            table.push(vec![node_label(v), state.to_string(), note]);
        }
        table
    }

    fn queue_table(&self) -> Table {
        vec![vec![
            "Queue".to_string(),
            join_nodes(self.queue.iter().copied()),
        ]]
    }
}
