//! 步骤打印器
//!
//! 把步骤、表格、校验结果渲染为终端文本

use crate::step::{BipartiteOverlay, GraphOverlay, Overlay, Phase, Step, Table};
use crate::types::join_nodes;
use crate::validation::ValidationReport;
use colored::Colorize;
use prettytable::{format, row, Cell, Row, Table as PrettyTable};

/// 表格打印模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintMode {
    /// 表格模式
    #[default]
    Table,
    /// 垂直模式，每行一块
    Vertical,
}

/// 结果打印器
#[derive(Debug, Clone, Copy, Default)]
pub struct Printer {
    mode: PrintMode,
}

impl Printer {
    pub fn new(mode: PrintMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> PrintMode {
        self.mode
    }

    /// 设置打印模式
    pub fn set_mode(&mut self, mode: PrintMode) {
        self.mode = mode;
    }

    /// 渲染单个步骤：标题行、消息、高亮摘要、主表与辅助表
    pub fn render_step(&self, step: &Step, index: usize, total: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            format!("[{}/{}]", index + 1, total).dimmed(),
            phase_colored(step.phase)
        ));
        out.push_str(&step.message);
        out.push('\n');

        if let Some(overlay) = &step.graph {
            let summary = match overlay {
                Overlay::General(g) => general_summary(g),
                Overlay::Bipartite(b) => bipartite_summary(b),
            };
            if !summary.is_empty() {
                out.push_str(&format!("  {}\n", summary.cyan()));
            }
        }

        if let Some(table) = step.main_table() {
            out.push_str(&self.render_table(table));
        }
        if let Some(table) = step.aux_table() {
            out.push_str(&self.render_table(table));
        }
        out
    }

    /// 渲染二维表，首行为表头
    pub fn render_table(&self, table: &Table) -> String {
        let Some((header, rows)) = table.split_first() else {
            return String::new();
        };
        match self.mode {
            PrintMode::Table => format_table(header, rows),
            PrintMode::Vertical => format_vertical(header, rows),
        }
    }

    /// 步骤一览：序号、阶段、消息
    pub fn render_overview(&self, steps: &[Step], cursor: usize) -> String {
        let mut table = PrettyTable::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(row!["#", "Phase", "Message"]);
        for (i, step) in steps.iter().enumerate() {
            let marker = if i == cursor {
                format!("> {}", i + 1)
            } else {
                (i + 1).to_string()
            };
            table.add_row(Row::new(vec![
                Cell::new(&marker),
                Cell::new(step.phase.label()),
                Cell::new(&step.message),
            ]));
        }
        table.to_string()
    }

    /// 图构建日志
    pub fn render_build_log(&self, log: &[(String, String)]) -> String {
        let mut table = PrettyTable::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);
        table.set_titles(row!["Phase", "Detail"]);
        for (phase, detail) in log {
            table.add_row(row![phase, detail]);
        }
        table.to_string()
    }

    /// 校验警告与错误
    pub fn render_report(&self, report: &ValidationReport) -> String {
        let mut out = String::new();
        for w in &report.warnings {
            out.push_str(&format!("{} {}\n", "warning:".yellow().bold(), w));
        }
        for e in &report.errors {
            out.push_str(&format!("{} {}\n", "error:".red().bold(), e));
        }
        out
    }

    /// 打印帮助信息
    pub fn print_help() -> String {
        r#"
═══════════════════════════════════════════════════════════════
                   algotrace 控制台命令
═══════════════════════════════════════════════════════════════

  next, n              下一步
  prev, p              上一步
  reset, r             回到第一步
  play                 开始 / 暂停自动播放
  goto, g <N>          跳到第 N 步（从 1 开始）
  show, s              重新显示当前步骤
  list, l              列出全部步骤
  build                显示邻接矩阵的构图过程
  vertical             切换表格 / 垂直显示
  help, h, ?           显示帮助
  quit, exit, q        退出程序

  空行等同于 next

═══════════════════════════════════════════════════════════════
"#
        .to_string()
    }
}

fn phase_colored(phase: Phase) -> colored::ColoredString {
    let label = phase.label();
    match phase {
        Phase::Done => label.green().bold(),
        Phase::Error | Phase::Stuck => label.red().bold(),
        Phase::EdgeAccepted | Phase::AugmentingPathFound | Phase::Augmentation => {
            label.green()
        }
        Phase::CycleAvoided => label.yellow(),
        _ => label.blue().bold(),
    }
}

fn general_summary(g: &GraphOverlay) -> String {
    let mut parts = Vec::new();
    if let Some(s) = g.source {
        parts.push(format!("source V{}", s));
    }
    if let Some(nodes) = &g.nodes {
        parts.push(format!("nodes {{{}}}", join_nodes(nodes.iter().copied())));
    }
    if let Some(edges) = &g.edges {
        let keys: Vec<String> = edges.iter().map(|e| e.to_string()).collect();
        parts.push(format!("edges {{{}}}", keys.join(", ")));
    }
    if let Some(frontier) = &g.frontier {
        parts.push(format!("frontier {{{}}}", join_nodes(frontier.iter().copied())));
    }
    parts.join(" | ")
}

fn bipartite_summary(b: &BipartiteOverlay) -> String {
    let pairs: Vec<String> = b
        .matched
        .iter()
        .map(|(l, u)| format!("L{}–U{}", l, u))
        .collect();
    let mut parts = vec![format!("matched {{{}}}", pairs.join(", "))];
    let labelled_l: Vec<String> = side_labels(&b.labels_l, "L");
    let labelled_u: Vec<String> = side_labels(&b.labels_u, "U");
    if !labelled_l.is_empty() || !labelled_u.is_empty() {
        let mut all = labelled_l;
        all.extend(labelled_u);
        parts.push(format!("labelled {{{}}}", all.join(", ")));
    }
    parts.join(" | ")
}

fn side_labels(labels: &[bool], prefix: &str) -> Vec<String> {
    labels
        .iter()
        .enumerate()
        .filter(|&(_, &on)| on)
        .map(|(i, _)| format!("{}{}", prefix, i))
        .collect()
}

/// 表格格式
fn format_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut table = PrettyTable::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    let titles: Vec<Cell> = header.iter().map(|c| Cell::new(c)).collect();
    table.set_titles(Row::new(titles));

    for row_data in rows {
        let cells: Vec<Cell> = row_data.iter().map(|v| Cell::new(v)).collect();
        table.add_row(Row::new(cells));
    }

    table.to_string()
}

/// 垂直格式
fn format_vertical(header: &[String], rows: &[Vec<String>]) -> String {
    let width = header.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let mut output = String::new();

    for (i, row_data) in rows.iter().enumerate() {
        output.push_str(&format!("*************** {}. row ***************\n", i + 1));
        for (j, col) in header.iter().enumerate() {
            let value = row_data.get(j).map(|s| s.as_str()).unwrap_or("");
            output.push_str(&format!("{:>width$}: {}\n", col, value, width = width));
        }
    }

    output
}
