//! 通用类型定义与格式化工具

/// 顶点编号（0..n）
pub type NodeId = usize;

/// 边权重 / 容量
pub type Weight = f64;

/// 方阵形式的邻接矩阵（行优先）
pub type Matrix = Vec<Vec<Weight>>;

/// 前端编辑器允许的最大顶点数
pub const MAX_NODES: usize = 12;

/// 自动播放的默认间隔（毫秒）
pub const DEFAULT_TICK_MS: u64 = 900;

/// 格式化权重：整数值不带小数部分，无穷大显示为 ∞
pub fn format_weight(w: Weight) -> String {
    if w.is_infinite() {
        if w > 0.0 {
            "∞".to_string()
        } else {
            "-∞".to_string()
        }
    } else if w.fract() == 0.0 && w.abs() < 1e15 {
        format!("{}", w as i64)
    } else {
        format!("{}", w)
    }
}

/// 顶点显示名，如 `V3`
pub fn node_label(v: NodeId) -> String {
    format!("V{}", v)
}

/// 以逗号连接的顶点列表，如 `V0, V2, V5`
pub fn join_nodes<I>(nodes: I) -> String
where
    I: IntoIterator<Item = NodeId>,
{
    nodes
        .into_iter()
        .map(node_label)
        .collect::<Vec<_>>()
        .join(", ")
}
