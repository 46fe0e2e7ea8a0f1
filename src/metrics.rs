//! 运行指标收集模块
//!
//! 按算法统计运行次数、步骤数、耗时与校验拒绝，导出 JSON 快照或 Prometheus 文本

use crate::algorithm::AlgorithmKind;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 系统全局指标
#[derive(Debug)]
pub struct Metrics {
    /// 每种算法一组计数，顺序同 `AlgorithmKind::ALL`
    algorithms: [AlgorithmStats; 5],
    /// 校验警告总数
    warnings: AtomicU64,
    /// 矩阵解析统计
    parse_stats: ParseStats,
    /// 启动时间
    start_time: Instant,
}

#[derive(Debug, Default)]
struct AlgorithmStats {
    /// 完成的运行数
    runs: AtomicU64,
    /// 被校验拒绝的次数
    rejected: AtomicU64,
    /// 产生的步骤总数
    steps: AtomicU64,
    /// 运行总耗时（微秒）
    total_duration_us: AtomicU64,
}

#[derive(Debug, Default)]
struct ParseStats {
    parsed: AtomicU64,
    failed: AtomicU64,
}

/// 单个算法的指标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmSnapshot {
    pub algorithm: AlgorithmKind,
    pub runs: u64,
    pub rejected: u64,
    pub steps: u64,
    pub avg_steps: f64,
    pub avg_duration_ms: f64,
}

/// 可导出的指标快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_runs: u64,
    pub total_rejected: u64,
    pub total_steps: u64,
    pub total_warnings: u64,
    pub algorithms: Vec<AlgorithmSnapshot>,

    pub matrices_parsed: u64,
    pub matrices_failed: u64,

    pub uptime_seconds: u64,
}

/// Prometheus 格式指标
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    pub content: String,
}

fn slot(kind: AlgorithmKind) -> usize {
    match kind {
        AlgorithmKind::Bfs => 0,
        AlgorithmKind::Dijkstra => 1,
        AlgorithmKind::Kruskal => 2,
        AlgorithmKind::Matching => 3,
        AlgorithmKind::MaxFlow => 4,
    }
}

impl Metrics {
    /// 创建新的指标收集器
    pub fn new() -> Self {
        Self {
            algorithms: Default::default(),
            warnings: AtomicU64::new(0),
            parse_stats: ParseStats::default(),
            start_time: Instant::now(),
        }
    }

    /// 记录一次完成的运行
    pub fn record_run(&self, kind: AlgorithmKind, steps: usize, duration: Duration) {
        let stats = &self.algorithms[slot(kind)];
        stats.runs.fetch_add(1, Ordering::Relaxed);
        stats.steps.fetch_add(steps as u64, Ordering::Relaxed);
        stats
            .total_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// 记录一次校验拒绝
    pub fn record_rejection(&self, kind: AlgorithmKind) {
        self.algorithms[slot(kind)]
            .rejected
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_warnings(&self, count: usize) {
        self.warnings.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// 记录一次矩阵解析
    pub fn record_parse(&self, success: bool) {
        if success {
            self.parse_stats.parsed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.parse_stats.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        let algorithms: Vec<AlgorithmSnapshot> = AlgorithmKind::ALL
            .iter()
            .map(|&kind| {
                let stats = &self.algorithms[slot(kind)];
                let runs = stats.runs.load(Ordering::Relaxed);
                let steps = stats.steps.load(Ordering::Relaxed);
                let duration_us = stats.total_duration_us.load(Ordering::Relaxed);
                let (avg_steps, avg_duration_ms) = if runs > 0 {
                    (
                        steps as f64 / runs as f64,
                        duration_us as f64 / runs as f64 / 1000.0,
                    )
                } else {
                    (0.0, 0.0)
                };
                AlgorithmSnapshot {
                    algorithm: kind,
                    runs,
                    rejected: stats.rejected.load(Ordering::Relaxed),
                    steps,
                    avg_steps,
                    avg_duration_ms,
                }
            })
            .collect();

        MetricsSnapshot {
            total_runs: algorithms.iter().map(|a| a.runs).sum(),
            total_rejected: algorithms.iter().map(|a| a.rejected).sum(),
            total_steps: algorithms.iter().map(|a| a.steps).sum(),
            total_warnings: self.warnings.load(Ordering::Relaxed),
            algorithms,
            matrices_parsed: self.parse_stats.parsed.load(Ordering::Relaxed),
            matrices_failed: self.parse_stats.failed.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// 导出为 Prometheus 格式
    pub fn to_prometheus(&self) -> PrometheusMetrics {
        let snapshot = self.snapshot();

        let mut content = String::new();

        // 按算法分标签的计数
        content.push_str("# HELP algotrace_runs_total Completed algorithm runs\n");
        content.push_str("# TYPE algotrace_runs_total counter\n");
        for a in &snapshot.algorithms {
            content.push_str(&format!(
                "algotrace_runs_total{{algorithm=\"{}\"}} {}\n",
                a.algorithm, a.runs
            ));
        }

        content.push_str("# HELP algotrace_rejected_total Runs blocked by validation\n");
        content.push_str("# TYPE algotrace_rejected_total counter\n");
        for a in &snapshot.algorithms {
            content.push_str(&format!(
                "algotrace_rejected_total{{algorithm=\"{}\"}} {}\n",
                a.algorithm, a.rejected
            ));
        }

        content.push_str("# HELP algotrace_steps_total Steps produced\n");
        content.push_str("# TYPE algotrace_steps_total counter\n");
        for a in &snapshot.algorithms {
            content.push_str(&format!(
                "algotrace_steps_total{{algorithm=\"{}\"}} {}\n",
                a.algorithm, a.steps
            ));
        }

        content.push_str("# HELP algotrace_run_duration_avg_ms Average run duration in milliseconds\n");
        content.push_str("# TYPE algotrace_run_duration_avg_ms gauge\n");
        for a in &snapshot.algorithms {
            content.push_str(&format!(
                "algotrace_run_duration_avg_ms{{algorithm=\"{}\"}} {:.3}\n",
                a.algorithm, a.avg_duration_ms
            ));
        }

        content.push_str("# HELP algotrace_warnings_total Validation warnings issued\n");
        content.push_str("# TYPE algotrace_warnings_total counter\n");
        content.push_str(&format!("algotrace_warnings_total {}\n", snapshot.total_warnings));

        content.push_str("# HELP algotrace_matrices_parsed_total Matrices parsed successfully\n");
        content.push_str("# TYPE algotrace_matrices_parsed_total counter\n");
        content.push_str(&format!("algotrace_matrices_parsed_total {}\n", snapshot.matrices_parsed));

        content.push_str("# HELP algotrace_matrices_failed_total Matrices rejected by the parser\n");
        content.push_str("# TYPE algotrace_matrices_failed_total counter\n");
        content.push_str(&format!("algotrace_matrices_failed_total {}\n", snapshot.matrices_failed));

        content.push_str("# HELP algotrace_uptime_seconds System uptime in seconds\n");
        content.push_str("# TYPE algotrace_uptime_seconds counter\n");
        content.push_str(&format!("algotrace_uptime_seconds {}\n", snapshot.uptime_seconds));

        PrometheusMetrics { content }
    }

    /// 重置所有指标
    pub fn reset(&self) {
        for stats in &self.algorithms {
            stats.runs.store(0, Ordering::Relaxed);
            stats.rejected.store(0, Ordering::Relaxed);
            stats.steps.store(0, Ordering::Relaxed);
            stats.total_duration_us.store(0, Ordering::Relaxed);
        }
        self.warnings.store(0, Ordering::Relaxed);
        self.parse_stats.parsed.store(0, Ordering::Relaxed);
        self.parse_stats.failed.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// 全局指标实例
static METRICS: once_cell::sync::Lazy<Arc<Metrics>> =
    once_cell::sync::Lazy::new(|| Arc::new(Metrics::new()));

/// 获取全局指标实例
pub fn global_metrics() -> Arc<Metrics> {
    METRICS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = Metrics::new();

        metrics.record_run(AlgorithmKind::Bfs, 9, Duration::from_millis(2));
        metrics.record_run(AlgorithmKind::Bfs, 5, Duration::from_millis(4));
        metrics.record_rejection(AlgorithmKind::Kruskal);
        metrics.record_warnings(2);
        metrics.record_parse(true);
        metrics.record_parse(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 2);
        assert_eq!(snapshot.total_steps, 14);
        assert_eq!(snapshot.total_rejected, 1);
        assert_eq!(snapshot.total_warnings, 2);
        assert_eq!(snapshot.matrices_parsed, 1);
        assert_eq!(snapshot.matrices_failed, 1);

        let bfs = &snapshot.algorithms[0];
        assert_eq!(bfs.algorithm, AlgorithmKind::Bfs);
        assert_eq!(bfs.avg_steps, 7.0);
        assert!((bfs.avg_duration_ms - 3.0).abs() < 1e-9);
        assert_eq!(snapshot.algorithms[2].rejected, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record_run(AlgorithmKind::MaxFlow, 4, Duration::ZERO);

        let prom = metrics.to_prometheus();
        assert!(prom
            .content
            .contains("algotrace_runs_total{algorithm=\"maxflow\"} 1"));
        assert!(prom
            .content
            .contains("algotrace_steps_total{algorithm=\"dijkstra\"} 0"));
        assert!(prom.content.contains("algotrace_uptime_seconds"));
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_run(AlgorithmKind::Matching, 3, Duration::ZERO);
        metrics.record_warnings(1);
        metrics.reset();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_runs, 0);
        assert_eq!(snapshot.total_warnings, 0);
    }
}
