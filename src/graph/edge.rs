//! 边定义

use crate::types::{format_weight, NodeId, Weight};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 边：`u -> v`，权重 / 容量 `w`
///
/// 无向图中每条逻辑连接只出现一次，且 `u < v`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub u: NodeId,
    pub v: NodeId,
    pub w: Weight,
}

impl Edge {
    /// 创建新边
    pub fn new(u: NodeId, v: NodeId, w: Weight) -> Self {
        Self { u, v, w }
    }

    /// 高亮用的键
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.u, self.v)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.u, self.v, format_weight(self.w))
    }
}

/// 渲染层用来定位一条边的键，序列化为 `"u-v"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub from: NodeId,
    pub to: NodeId,
}

impl EdgeKey {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl Serialize for EdgeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EdgeKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| serde::de::Error::custom(format!("invalid edge key: {}", s)))?;
        let from = a.parse().map_err(serde::de::Error::custom)?;
        let to = b.parse().map_err(serde::de::Error::custom)?;
        Ok(Self { from, to })
    }
}
