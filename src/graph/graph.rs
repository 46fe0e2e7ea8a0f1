//! 图数据结构
//!
//! 由邻接矩阵一次性构建，单次算法运行期间不可变

use super::edge::Edge;
use super::vertex::Vertex;
use crate::types::{format_weight, Matrix, NodeId, Weight};
use serde::{Deserialize, Serialize};

/// 图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// 顶点数
    pub n: usize,
    /// 是否有向
    pub directed: bool,
    /// 顶点（仅含布局坐标）
    pub nodes: Vec<Vertex>,
    /// 边列表；无向图中每条连接只出现一次
    pub edges: Vec<Edge>,
}

impl Graph {
    /// 创建没有边的图
    pub fn new(n: usize, directed: bool) -> Self {
        Self {
            n,
            directed,
            nodes: (0..n).map(Vertex::new).collect(),
            edges: Vec::new(),
        }
    }

    /// 从邻接矩阵构建
    ///
    /// 非零元素 `A[i][j]` 生成边 `{i, j, A[i][j]}`；无向模式下只取 `i < j`，
    /// 不检查矩阵是否对称。
    pub fn from_adjacency(matrix: &Matrix, directed: bool) -> Self {
        let n = matrix.len();
        let mut graph = Self::new(n, directed);
        for (i, row) in matrix.iter().enumerate() {
            for (j, &w) in row.iter().enumerate() {
                if w != 0.0 && (directed || i < j) {
                    graph.edges.push(Edge::new(i, j, w));
                }
            }
        }
        graph
    }

    /// 手动添加边（测试和构造辅助）
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, w: Weight) {
        self.edges.push(Edge::new(u, v, w));
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// 邻居列表 `(to, w)`，按边顺序；无向图同时检查两个端点
    pub fn neighbors(&self, node: NodeId) -> Vec<(NodeId, Weight)> {
        let mut out = Vec::new();
        for edge in &self.edges {
            if edge.u == node {
                out.push((edge.v, edge.w));
            }
            if !self.directed && edge.v == node {
                out.push((edge.u, edge.w));
            }
        }
        out
    }

    /// 顶点是否存在
    pub fn contains(&self, node: NodeId) -> bool {
        node < self.n
    }

    /// 构图过程日志：一行初始化 + 每个非零元素一行
    pub fn build_log(matrix: &Matrix, directed: bool) -> Vec<(String, String)> {
        let n = matrix.len();
        let mut ops = vec![(
            "Initialization".to_string(),
            format!("Reading matrix ({}×{}), directed={}.", n, n, directed),
        )];
        for (i, row) in matrix.iter().enumerate() {
            for (j, &w) in row.iter().enumerate() {
                if w != 0.0 {
                    ops.push((
                        "Edge created".to_string(),
                        format!("V{} → V{}, weight/capacity: {}", i, j, format_weight(w)),
                    ));
                }
            }
        }
        ops
    }
}

/// 一次运行的输入：原始矩阵加上由它构建的图
///
/// 二分匹配直接读取矩阵，校验也需要看到原始单元格（自环、非整数）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub matrix: Matrix,
    pub graph: Graph,
}

impl Instance {
    pub fn new(matrix: Matrix, directed: bool) -> Self {
        let graph = Graph::from_adjacency(&matrix, directed);
        Self { matrix, graph }
    }

    pub fn n(&self) -> usize {
        self.graph.n
    }

    pub fn directed(&self) -> bool {
        self.graph.directed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Matrix {
        vec![
            vec![0.0, 1.0, 0.0, 5.0],
            vec![1.0, 0.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 1.0],
            vec![5.0, 0.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn test_undirected_folds_pairs() {
        let g = Graph::from_adjacency(&square(), false);
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 4);
        assert!(g.edges.iter().all(|e| e.u < e.v));
        assert_eq!(g.edges[0], Edge::new(0, 1, 1.0));
        assert_eq!(g.edges[1], Edge::new(0, 3, 5.0));
    }

    #[test]
    fn test_directed_keeps_both_directions() {
        let g = Graph::from_adjacency(&square(), true);
        assert_eq!(g.edge_count(), 8);
        assert!(g.edges.contains(&Edge::new(3, 0, 5.0)));
    }

    #[test]
    fn test_neighbors_both_endpoints() {
        let g = Graph::from_adjacency(&square(), false);
        let mut n3: Vec<NodeId> = g.neighbors(3).into_iter().map(|(to, _)| to).collect();
        n3.sort();
        assert_eq!(n3, vec![0, 2]);

        let mut d = Graph::new(3, true);
        d.add_edge(0, 1, 2.0);
        d.add_edge(2, 0, 4.0);
        assert_eq!(d.neighbors(0), vec![(1, 2.0)]);
        assert!(d.neighbors(1).is_empty());
    }

    #[test]
    fn test_asymmetric_undirected_uses_upper_triangle() {
        let m = vec![vec![0.0, 3.0], vec![7.0, 0.0]];
        let g = Graph::from_adjacency(&m, false);
        assert_eq!(g.edges, vec![Edge::new(0, 1, 3.0)]);
    }

    #[test]
    fn test_build_log() {
        let log = Graph::build_log(&square(), false);
        assert_eq!(log.len(), 1 + 8);
        assert_eq!(log[0].0, "Initialization");
        assert_eq!(log[1].1, "V0 → V1, weight/capacity: 1");
    }
}
