//! 步骤记录
//!
//! 每个算法把执行过程展开为一串不可变的 [`Step`]，渲染层只消费这些记录。
//! `graph` 覆盖层只描述重绘所需的增量 / 快照，`tables` 是算法内部状态的文本快照。

use crate::graph::EdgeKey;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 步骤阶段，用于界面分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "Initialization")]
    Initialization,
    #[serde(rename = "Dequeue")]
    Dequeue,
    #[serde(rename = "Neighbor")]
    Neighbor,
    #[serde(rename = "Selection")]
    Selection,
    #[serde(rename = "Relax")]
    Relax,
    #[serde(rename = "Components")]
    Components,
    #[serde(rename = "Edge accepted")]
    EdgeAccepted,
    #[serde(rename = "Cycle avoided")]
    CycleAvoided,
    #[serde(rename = "Start")]
    Start,
    #[serde(rename = "Labeling")]
    Labeling,
    #[serde(rename = "Augmenting path found")]
    AugmentingPathFound,
    #[serde(rename = "Augmentation")]
    Augmentation,
    #[serde(rename = "Stuck")]
    Stuck,
    #[serde(rename = "Augmenting path")]
    AugmentingPath,
    #[serde(rename = "Done")]
    Done,
    #[serde(rename = "Error")]
    Error,
}

impl Phase {
    /// 界面显示的文本
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initialization => "Initialization",
            Phase::Dequeue => "Dequeue",
            Phase::Neighbor => "Neighbor",
            Phase::Selection => "Selection",
            Phase::Relax => "Relax",
            Phase::Components => "Components",
            Phase::EdgeAccepted => "Edge accepted",
            Phase::CycleAvoided => "Cycle avoided",
            Phase::Start => "Start",
            Phase::Labeling => "Labeling",
            Phase::AugmentingPathFound => "Augmenting path found",
            Phase::Augmentation => "Augmentation",
            Phase::Stuck => "Stuck",
            Phase::AugmentingPath => "Augmenting path",
            Phase::Done => "Done",
            Phase::Error => "Error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 二维文本表格，第一行为表头
pub type Table = Vec<Vec<String>>;

/// 由字符串切片构造一行
pub fn row<S: AsRef<str>>(cells: &[S]) -> Vec<String> {
    cells.iter().map(|c| c.as_ref().to_string()).collect()
}

/// 步骤附带的表格
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux: Option<Table>,
}

/// 通用图（BFS / Dijkstra / Kruskal / 最大流）的覆盖层
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<NodeId>,
    /// 已访问 / 已确定的顶点
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<BTreeSet<NodeId>>,
    /// 高亮的边
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<BTreeSet<EdgeKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontier: Option<BTreeSet<NodeId>>,
}

impl GraphOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: NodeId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn nodes<I: IntoIterator<Item = NodeId>>(mut self, nodes: I) -> Self {
        self.nodes = Some(nodes.into_iter().collect());
        self
    }

    pub fn edges<I: IntoIterator<Item = EdgeKey>>(mut self, edges: I) -> Self {
        self.edges = Some(edges.into_iter().collect());
        self
    }

    pub fn frontier<I: IntoIterator<Item = NodeId>>(mut self, frontier: I) -> Self {
        self.frontier = Some(frontier.into_iter().collect());
        self
    }
}

/// 二分图覆盖层：渲染层按左右两排布局绘制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BipartiteOverlay {
    pub n: usize,
    /// 所有 `L_i – U_j` 边
    pub edges: Vec<(usize, usize)>,
    /// 当前匹配中的 `(i, j)` 对
    pub matched: Vec<(usize, usize)>,
    #[serde(rename = "labelsL")]
    pub labels_l: Vec<bool>,
    #[serde(rename = "labelsU")]
    pub labels_u: Vec<bool>,
    #[serde(rename = "frontierL")]
    pub frontier_l: Vec<usize>,
    #[serde(rename = "frontierU")]
    pub frontier_u: Vec<usize>,
}

/// 步骤的图覆盖层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Overlay {
    #[serde(rename = "general")]
    General(GraphOverlay),
    #[serde(rename = "hungarian")]
    Bipartite(BipartiteOverlay),
}

impl Overlay {
    pub fn as_general(&self) -> Option<&GraphOverlay> {
        match self {
            Overlay::General(g) => Some(g),
            Overlay::Bipartite(_) => None,
        }
    }

    pub fn as_bipartite(&self) -> Option<&BipartiteOverlay> {
        match self {
            Overlay::Bipartite(b) => Some(b),
            Overlay::General(_) => None,
        }
    }
}

impl From<GraphOverlay> for Overlay {
    fn from(g: GraphOverlay) -> Self {
        Overlay::General(g)
    }
}

impl From<BipartiteOverlay> for Overlay {
    fn from(b: BipartiteOverlay) -> Self {
        Overlay::Bipartite(b)
    }
}

/// 单个步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub phase: Phase,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Overlay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Tables>,
}

impl Step {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            graph: None,
            tables: None,
        }
    }

    pub fn with_overlay(mut self, overlay: impl Into<Overlay>) -> Self {
        self.graph = Some(overlay.into());
        self
    }

    pub fn with_main(mut self, table: Table) -> Self {
        self.tables.get_or_insert_with(Tables::default).main = Some(table);
        self
    }

    pub fn with_aux(mut self, table: Table) -> Self {
        self.tables.get_or_insert_with(Tables::default).aux = Some(table);
        self
    }

    /// 通用覆盖层（若有）
    pub fn general(&self) -> Option<&GraphOverlay> {
        self.graph.as_ref().and_then(Overlay::as_general)
    }

    /// 二分图覆盖层（若有）
    pub fn bipartite(&self) -> Option<&BipartiteOverlay> {
        self.graph.as_ref().and_then(Overlay::as_bipartite)
    }

    pub fn main_table(&self) -> Option<&Table> {
        self.tables.as_ref().and_then(|t| t.main.as_ref())
    }

    pub fn aux_table(&self) -> Option<&Table> {
        self.tables.as_ref().and_then(|t| t.aux.as_ref())
    }
}

/// 只追加的步骤序列构建器
///
/// 各算法的状态结构体通过它发出步骤，完成后交出整个序列。
#[derive(Debug, Default)]
pub struct StepLog {
    steps: Vec<Step>,
}

impl StepLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, step: Step) {
        tracing::trace!(phase = %step.phase, index = self.steps.len(), "{}", step.message);
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn finish(self) -> Vec<Step> {
        self.steps
    }
}
