//! 顶点定义

use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// 顶点
///
/// 坐标只供渲染层布局使用，算法从不读取。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    /// 创建位于原点的顶点
    pub fn new(id: NodeId) -> Self {
        Self { id, x: 0.0, y: 0.0 }
    }
}
