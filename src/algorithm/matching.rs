//! 二分图最大匹配（交错树标号法）
//!
//! 矩阵 `A` 看作二分图：`A[i][j] > 0` 时存在边 `L_i – U_j`，权值大小不参与计算。
//! 每一轮从所有未匹配的 L 顶点出发做分层 BFS 标号，找到一条增广路就立即翻转；
//! 找不到时当前匹配即为最大匹配，由标号得到 König 最小点覆盖。

use crate::step::{row, BipartiteOverlay, Phase, Step, StepLog, Table};
use crate::types::Matrix;
use std::collections::VecDeque;
use tracing::debug;

/// 二分匹配步骤序列
pub fn matching_steps(matrix: &Matrix) -> Vec<Step> {
    let mut state = MatchingState::new(matrix);
    let mut log = StepLog::new();

    log.emit(
        Step::new(Phase::Start, "Starting from the empty matching.")
            .with_main(state.matching_table("Initial matching"))
            .with_overlay(state.overlay(None)),
    );

    let mut phases = 0;
    while state.find_and_augment(&mut log) {
        phases += 1;
    }

    let size = state.size();
    let mut table = vec![row(&["Final pairs"]), vec![format!("|M| = {}", size)]];
    table.push(row(&["L", "U"]));
    for (i, j) in state.pairs() {
        table.push(vec![format!("L{}", i), format!("U{}", j)]);
    }
    log.emit(
        Step::new(Phase::Done, format!("Maximum matching size: {}.", size))
            .with_main(table)
            .with_overlay(state.overlay(None)),
    );

    debug!(n = state.n, size, phases, steps = log.len(), "matching trace built");
    log.finish()
}

/// 一次搜索中的标号、父指针与队列
struct Search {
    lab_l: Vec<Option<u32>>,
    lab_u: Vec<Option<u32>>,
    /// L 顶点经由哪个 U 顶点（其匹配边）被标号
    parent_l: Vec<Option<usize>>,
    /// U 顶点经由哪个 L 顶点被标号
    parent_u: Vec<Option<usize>>,
    queue: VecDeque<usize>,
}

impl Search {
    fn new(n: usize) -> Self {
        Self {
            lab_l: vec![None; n],
            lab_u: vec![None; n],
            parent_l: vec![None; n],
            parent_u: vec![None; n],
            queue: VecDeque::new(),
        }
    }
}

/// 交错路径上的顶点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    L(usize),
    U(usize),
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::L(i) => write!(f, "L{}", i),
            Side::U(j) => write!(f, "U{}", j),
        }
    }
}

struct MatchingState {
    n: usize,
    adj: Vec<Vec<bool>>,
    match_l: Vec<Option<usize>>,
    match_u: Vec<Option<usize>>,
}

impl MatchingState {
    fn new(matrix: &Matrix) -> Self {
        let n = matrix.len();
        let adj = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| matrix[i].get(j).is_some_and(|&w| w > 0.0))
                    .collect()
            })
            .collect();
        Self {
            n,
            adj,
            match_l: vec![None; n],
            match_u: vec![None; n],
        }
    }

    /// 一轮标号搜索；找到增广路并翻转时返回 true
    fn find_and_augment(&mut self, log: &mut StepLog) -> bool {
        let mut search = Search::new(self.n);
        for i in 0..self.n {
            if self.match_l[i].is_none() {
                search.lab_l[i] = Some(0);
                search.queue.push_back(i);
            }
        }

        log.emit(
            Step::new(
                Phase::Initialization,
                "Unmatched L vertices received label 0.",
            )
            .with_main(self.matching_table("Matching"))
            .with_aux(frontier_table(&search.queue, "Initial queue"))
            .with_overlay(self.overlay(Some(&search))),
        );

        let mut free_u = None;

        while let Some(i) = search.queue.pop_front() {
            let mut labelled_u = Vec::new();
            let mut labelled_l = Vec::new();

            for j in 0..self.n {
                if !self.adj[i][j] || search.lab_u[j].is_some() {
                    continue;
                }
                let level = search.lab_l[i].unwrap_or(0) + 1;
                search.lab_u[j] = Some(level);
                search.parent_u[j] = Some(i);
                labelled_u.push(j);

                match self.match_u[j] {
                    None => {
                        free_u = Some(j);
                        break;
                    }
                    Some(k) => {
                        if search.lab_l[k].is_none() {
                            search.lab_l[k] = Some(level + 1);
                            search.parent_l[k] = Some(j);
                            search.queue.push_back(k);
                            labelled_l.push(k);
                        }
                    }
                }
            }

            if let Some(j) = free_u {
                log.emit(
                    Step::new(
                        Phase::AugmentingPathFound,
                        format!("Reached an unmatched U vertex: U{}.", j),
                    )
                    .with_main(self.matching_table("Matching"))
                    .with_aux(frontier_table(&search.queue, "Frontier / queue"))
                    .with_overlay(self.overlay(Some(&search))),
                );
                break;
            }

            log.emit(
                Step::new(Phase::Labeling, labeling_message(i, &labelled_u, &labelled_l))
                    .with_main(self.matching_table("Matching"))
                    .with_aux(frontier_table(&search.queue, "Frontier / queue"))
                    .with_overlay(self.overlay(Some(&search))),
            );
        }

        match free_u {
            Some(j) => {
                self.augment(j, &search, log);
                true
            }
            None => {
                self.emit_stuck(&search, log);
                false
            }
        }
    }

    /// 沿父指针还原 `L … U_free` 交错路径并翻转
    fn augment(&mut self, free_u: usize, search: &Search, log: &mut StepLog) {
        let mut path = Vec::new();
        let mut uj = free_u;
        loop {
            path.push(Side::U(uj));
            let Some(i) = search.parent_u[uj] else {
                break;
            };
            path.push(Side::L(i));
            let Some(pj) = search.parent_l[i] else {
                break;
            };
            uj = pj;
        }
        path.reverse();

        // 路径形如 L U L U … U；每个 (L, U) 对成为新的匹配边，旧匹配边随之被覆盖
        for pair in path.chunks(2) {
            if let [Side::L(i), Side::U(j)] = *pair {
                self.match_l[i] = Some(j);
                self.match_u[j] = Some(i);
            }
        }
        debug_assert!(self.is_consistent());

        let rendered: Vec<String> = path.iter().map(Side::to_string).collect();
        let mut labels = Search::new(self.n);
        labels.lab_l.clone_from(&search.lab_l);
        labels.lab_u.clone_from(&search.lab_u);

        log.emit(
            Step::new(
                Phase::Augmentation,
                format!(
                    "Matching grown along the augmenting path: {}.",
                    rendered.join(" → ")
                ),
            )
            .with_main(self.matching_table("Matching after augmentation"))
            .with_aux(self.reverse_matching_table())
            .with_overlay(self.overlay(Some(&labels))),
        );
    }

    /// 无增广路：由标号给出 König 最小点覆盖（此时队列已空）
    fn emit_stuck(&self, search: &Search, log: &mut StepLog) {
        let cover_l: Vec<usize> = (0..self.n).filter(|&i| search.lab_l[i].is_none()).collect();
        let cover_u: Vec<usize> = (0..self.n).filter(|&j| search.lab_u[j].is_some()).collect();

        let list = |prefix: &str, items: &[usize]| {
            if items.is_empty() {
                "∅".to_string()
            } else {
                items
                    .iter()
                    .map(|x| format!("{}{}", prefix, x))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };
        let cover = vec![
            row(&["Minimum vertex cover", "Set"]),
            vec!["Lower (L)".to_string(), list("L", &cover_l)],
            vec!["Upper (U)".to_string(), list("U", &cover_u)],
            vec!["|C|".to_string(), (cover_l.len() + cover_u.len()).to_string()],
        ];

        log.emit(
            Step::new(
                Phase::Stuck,
                "No augmenting path – the matching is maximum.",
            )
            .with_main(self.matching_table("Final matching"))
            .with_aux(cover)
            .with_overlay(self.overlay(Some(search))),
        );
    }

    fn size(&self) -> usize {
        self.match_l.iter().filter(|m| m.is_some()).count()
    }

    fn pairs(&self) -> Vec<(usize, usize)> {
        self.match_l
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.map(|j| (i, j)))
            .collect()
    }

    fn is_consistent(&self) -> bool {
        self.match_l
            .iter()
            .enumerate()
            .all(|(i, m)| m.map_or(true, |j| self.match_u[j] == Some(i)))
            && self
                .match_u
                .iter()
                .enumerate()
                .all(|(j, m)| m.map_or(true, |i| self.match_l[i] == Some(j)))
    }

    fn matching_table(&self, title: &str) -> Table {
        let mut table = vec![row(&[title, "Pair (L→U)"])];
        for (i, m) in self.match_l.iter().enumerate() {
            table.push(vec![
                format!("L{}", i),
                m.map(|j| format!("U{}", j)).unwrap_or_else(|| "—".to_string()),
            ]);
        }
        table
    }

    fn reverse_matching_table(&self) -> Table {
        let mut table = vec![row(&["Matching", "Pair (U→L)"])];
        for (j, m) in self.match_u.iter().enumerate() {
            table.push(vec![
                format!("U{}", j),
                m.map(|i| format!("L{}", i)).unwrap_or_else(|| "—".to_string()),
            ]);
        }
        table
    }

    fn overlay(&self, search: Option<&Search>) -> BipartiteOverlay {
        let mut edges = Vec::new();
        for i in 0..self.n {
            for j in 0..self.n {
                if self.adj[i][j] {
                    edges.push((i, j));
                }
            }
        }
        let (labels_l, labels_u, frontier_l) = match search {
            Some(s) => (
                s.lab_l.iter().map(Option::is_some).collect(),
                s.lab_u.iter().map(Option::is_some).collect(),
                s.queue.iter().copied().collect(),
            ),
            None => (vec![false; self.n], vec![false; self.n], Vec::new()),
        };
        BipartiteOverlay {
            n: self.n,
            edges,
            matched: self.pairs(),
            labels_l,
            labels_u,
            frontier_l,
            frontier_u: Vec::new(),
        }
    }
}

fn frontier_table(queue: &VecDeque<usize>, title: &str) -> Table {
    let items = if queue.is_empty() {
        "∅".to_string()
    } else {
        queue
            .iter()
            .map(|i| format!("L{}", i))
            .collect::<Vec<_>>()
            .join(", ")
    };
    vec![row(&[title, "Vertices"]), vec![items]]
}

fn labeling_message(i: usize, labelled_u: &[usize], labelled_l: &[usize]) -> String {
    if labelled_u.is_empty() {
        return format!("L{}: no unlabelled U neighbour.", i);
    }
    let us: Vec<String> = labelled_u.iter().map(|j| format!("U{}", j)).collect();
    let mut msg = format!("L{}: labelled {}", i, us.join(", "));
    if labelled_l.is_empty() {
        msg.push('.');
    } else {
        let ls: Vec<String> = labelled_l.iter().map(|k| format!("L{}", k)).collect();
        msg.push_str(&format!(
            "; back along matched edges to {}.",
            ls.join(", ")
        ));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    /// 逐行尝试所有未用列，求最大匹配
    fn brute_force_matching(adj: &[Vec<bool>]) -> usize {
        fn go(row: usize, used: u32, adj: &[Vec<bool>]) -> usize {
            if row == adj.len() {
                return 0;
            }
            let mut best = go(row + 1, used, adj);
            for j in 0..adj.len() {
                if adj[row][j] && used & (1 << j) == 0 {
                    best = best.max(1 + go(row + 1, used | (1 << j), adj));
                }
            }
            best
        }
        go(0, 0, adj)
    }

    fn final_size(steps: &[Step]) -> usize {
        steps.last().unwrap().bipartite().unwrap().matched.len()
    }

    fn parse_pairs(table: &Table, from: char, to: char) -> Vec<(usize, usize)> {
        table
            .iter()
            .skip(1)
            .filter(|r| r[1] != "—")
            .map(|r| {
                let a = r[0].trim_start_matches(from).parse().unwrap();
                let b = r[1].trim_start_matches(to).parse().unwrap();
                (a, b)
            })
            .collect()
    }

    #[test]
    fn test_matching_perfect_identity() {
        let m = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let steps = matching_steps(&m);
        assert_eq!(steps[0].phase, Phase::Start);
        assert_eq!(final_size(&steps), 3);
        assert_eq!(steps.last().unwrap().message, "Maximum matching size: 3.");

        let augmentations = steps.iter().filter(|s| s.phase == Phase::Augmentation).count();
        assert_eq!(augmentations, 3);
        // 最后一轮搜索找不到增广路
        let stuck = steps.iter().filter(|s| s.phase == Phase::Stuck).count();
        assert_eq!(stuck, 1);
    }

    #[test]
    fn test_matching_one_phase_per_augmentation() {
        // L0 只连 U1；L1 连 U0、U1
        let m = vec![vec![0.0, 1.0], vec![1.0, 1.0]];
        let steps = matching_steps(&m);
        assert_eq!(final_size(&steps), 2);

        let aug: Vec<&Step> = steps.iter().filter(|s| s.phase == Phase::Augmentation).collect();
        assert_eq!(aug.len(), 2);
        assert_eq!(aug[0].message, "Matching grown along the augmenting path: L0 → U1.");
        assert_eq!(aug[1].message, "Matching grown along the augmenting path: L1 → U0.");
    }

    #[test]
    fn test_matching_long_augmenting_path() {
        // 第一轮让 L0–U0、L1–U1 无法直接扩展 L2，需要经过交错路径
        let m = vec![
            vec![1.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0],
        ];
        let steps = matching_steps(&m);
        assert_eq!(final_size(&steps), 3);
        let last_aug = steps
            .iter()
            .filter(|s| s.phase == Phase::Augmentation)
            .last()
            .unwrap();
        assert_eq!(
            last_aug.message,
            "Matching grown along the augmenting path: L1 → U0 → L0 → U1 → L2 → U2."
        );
    }

    #[test]
    fn test_matching_stuck_reports_konig_cover() {
        // 两个 L 顶点都只连 U0：最大匹配 1，覆盖 {U0}
        let m = vec![vec![5.0, 0.0], vec![3.0, 0.0]];
        let steps = matching_steps(&m);
        let stuck = steps.iter().find(|s| s.phase == Phase::Stuck).unwrap();
        let cover = stuck.aux_table().unwrap();
        assert_eq!(cover[1], vec!["Lower (L)", "∅"]);
        assert_eq!(cover[2], vec!["Upper (U)", "U0"]);
        assert_eq!(cover[3], vec!["|C|", "1"]);
        assert_eq!(final_size(&steps), 1);
    }

    #[test]
    fn test_matching_overlay_shape() {
        let m = vec![vec![0.0, 2.0], vec![0.0, 0.0]];
        let steps = matching_steps(&m);
        for s in &steps {
            let b = s.bipartite().expect("every step carries the bipartite overlay");
            assert_eq!(b.n, 2);
            assert_eq!(b.edges, vec![(0, 1)]);
            assert_eq!(b.labels_l.len(), 2);
            assert!(b.frontier_u.is_empty());
        }
        let init = steps.iter().find(|s| s.phase == Phase::Initialization).unwrap();
        assert_eq!(init.bipartite().unwrap().frontier_l, vec![0, 1]);
        assert_eq!(init.aux_table().unwrap()[1], vec!["L0, L1"]);
    }

    #[test]
    fn test_matching_empty_graph() {
        let m = vec![vec![0.0; 3]; 3];
        let steps = matching_steps(&m);
        assert_eq!(final_size(&steps), 0);
        let phases: Vec<Phase> = steps.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::Start,
                Phase::Initialization,
                Phase::Labeling,
                Phase::Labeling,
                Phase::Labeling,
                Phase::Stuck,
                Phase::Done
            ]
        );
    }

    #[test]
    fn test_matching_random_against_brute_force() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..80 {
            let n = rng.gen_range(1..=6);
            let m: Matrix = (0..n)
                .map(|_| {
                    (0..n)
                        .map(|_| if rng.gen_bool(0.35) { rng.gen_range(1..=9) as f64 } else { 0.0 })
                        .collect()
                })
                .collect();
            let adj: Vec<Vec<bool>> = m.iter().map(|r| r.iter().map(|&w| w > 0.0).collect()).collect();

            let steps = matching_steps(&m);
            assert_eq!(final_size(&steps), brute_force_matching(&adj));
            assert_eq!(steps, matching_steps(&m));

            for s in steps.iter().filter(|s| s.phase == Phase::Augmentation) {
                let from_l = parse_pairs(s.main_table().unwrap(), 'L', 'U');
                let from_u: Vec<(usize, usize)> = parse_pairs(s.aux_table().unwrap(), 'U', 'L')
                    .into_iter()
                    .map(|(j, i)| (i, j))
                    .collect();
                let a: HashSet<_> = from_l.iter().copied().collect();
                let b: HashSet<_> = from_u.iter().copied().collect();
                assert_eq!(a, b);
                let us: HashSet<usize> = from_l.iter().map(|&(_, j)| j).collect();
                assert_eq!(us.len(), from_l.len());
                assert!(from_l.iter().all(|&(i, j)| adj[i][j]));
            }
        }
    }
}
