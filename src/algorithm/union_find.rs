//! 并查集（按秩合并 + 路径压缩）

use crate::step::{row, Table};
use crate::types::NodeId;

#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<NodeId>,
    rank: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// 查找根，沿途压缩路径
    pub fn find(&mut self, x: NodeId) -> NodeId {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// 合并两个集合；已在同一集合时返回 false
    pub fn unite(&mut self, a: NodeId, b: NodeId) -> bool {
        let mut a = self.find(a);
        let mut b = self.find(b);
        if a == b {
            return false;
        }
        if self.rank[a] < self.rank[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        if self.rank[a] == self.rank[b] {
            self.rank[a] += 1;
        }
        true
    }

    /// 每个元素的分量编号，按根首次出现的顺序从 0 编号
    pub fn component_labels(&mut self) -> Vec<usize> {
        let n = self.parent.len();
        let mut root_index: Vec<Option<usize>> = vec![None; n];
        let mut next = 0;
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let r = self.find(i);
            let label = *root_index[r].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            labels.push(label);
        }
        labels
    }

    /// 分量个数
    pub fn component_count(&mut self) -> usize {
        self.component_labels()
            .into_iter()
            .max()
            .map_or(0, |m| m + 1)
    }

    /// `i | parent[i] | rank[i]` 快照（不做路径压缩）
    pub fn table(&self) -> Table {
        let mut table = vec![row(&["i", "parent[i]", "rank[i]"])];
        for (i, (&p, &r)) in self.parent.iter().zip(&self.rank).enumerate() {
            table.push(vec![i.to_string(), p.to_string(), r.to_string()]);
        }
        table
    }
}
