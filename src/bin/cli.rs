//! algotrace CLI 工具
//!
//! 载入邻接矩阵，运行算法，在交互式控制台中逐步回放

use algotrace::algorithm::{execute, AlgorithmKind};
use algotrace::cli::{execute_console_command, CommandResult, ConsoleCompleter, Printer, Session};
use algotrace::error::Error;
use algotrace::graph::Instance;
use algotrace::import::{load_matrix_file, random_matrix, save_matrix_file};
use algotrace::stepper::{PlaybackConfig, Stepper};
use algotrace::types::{Matrix, DEFAULT_TICK_MS, MAX_NODES};
use algotrace::validation::ValidationReport;
use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Editor, ExternalPrinter};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "algotrace-cli")]
#[command(about = "图算法逐步演示工具")]
struct Args {
    /// 邻接矩阵文件（空白分隔的方阵）
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// 随机生成 N×N 矩阵（未给出文件时默认 6）
    #[arg(short, long, conflicts_with = "file")]
    random: Option<usize>,

    /// 随机矩阵的种子
    #[arg(long)]
    seed: Option<u64>,

    /// 算法: bfs, dijkstra, kruskal, matching (hungarian), maxflow
    #[arg(short, long, default_value = "bfs")]
    algorithm: String,

    /// 按有向图解释矩阵
    #[arg(short, long)]
    directed: bool,

    /// 起点 / 源点
    #[arg(short, long)]
    start: Option<usize>,

    /// 汇点（仅最大流）
    #[arg(short, long)]
    target: Option<usize>,

    /// 自动播放间隔（毫秒）
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// 打印所有步骤后退出
    #[arg(long)]
    dump: bool,

    /// 以 JSON 输出步骤序列后退出
    #[arg(long, conflicts_with = "dump")]
    json: bool,

    /// 把使用的矩阵写入文件
    #[arg(long)]
    save: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("algotrace=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let kind: AlgorithmKind = args.algorithm.parse()?;

    let matrix = load_matrix(&args)?;
    if let Some(path) = &args.save {
        save_matrix_file(path, &matrix)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let instance = Instance::new(matrix, args.directed);
    let algorithm = kind.with_params(instance.n(), args.start, args.target);
    let printer = Printer::default();

    let execution = match execute(&algorithm, &instance) {
        Ok(execution) => execution,
        Err(Error::Validation(report)) => {
            eprint!("{}", printer.render_report(&report));
            bail!("{} cannot run on this input", kind.title());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
        return Ok(());
    }

    if !execution.warnings.is_empty() {
        let report = ValidationReport {
            ok: true,
            errors: Vec::new(),
            warnings: execution.warnings.clone(),
        };
        eprint!("{}", printer.render_report(&report));
    }

    if args.dump {
        let total = execution.steps.len();
        for (i, step) in execution.steps.iter().enumerate() {
            println!("{}", printer.render_step(step, i, total));
        }
        return Ok(());
    }

    println!("algotrace {} - {}", algotrace::VERSION, kind.title());
    println!(
        "  {} nodes, {} edges, {}",
        instance.n(),
        instance.graph.edge_count(),
        if instance.directed() { "directed" } else { "undirected" }
    );
    println!("  {} steps. Type 'help' for commands, 'quit' to exit.\n", execution.steps.len());

    let mut rl: Editor<ConsoleCompleter, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ConsoleCompleter::new()));

    let stepper = Stepper::with_config(PlaybackConfig::from_millis(args.tick_ms));
    let session = Session::new(instance, stepper);
    // 播放任务在工作线程上输出，经由 rustyline 重绘提示行
    match rl.create_external_printer() {
        Ok(mut external) => session.print_on_move(move |text| {
            let _ = external.print(text);
        }),
        Err(_) => session.print_on_move(|text| {
            print!("{}", text);
            let _ = io::stdout().flush();
        }),
    }
    session.stepper.load(execution.steps);

    run_console(&mut rl, &session)?;

    println!("再见！");
    Ok(())
}

fn load_matrix(args: &Args) -> anyhow::Result<Matrix> {
    if let Some(path) = &args.file {
        return load_matrix_file(path).with_context(|| format!("reading {}", path.display()));
    }

    let n = args.random.unwrap_or(6);
    if n == 0 || n > MAX_NODES {
        bail!("random matrix size must be within 1..={}", MAX_NODES);
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(random_matrix(n, args.directed, &mut rng))
}

fn run_console(
    rl: &mut Editor<ConsoleCompleter, DefaultHistory>,
    session: &Session,
) -> anyhow::Result<()> {
    let history = dirs::home_dir().map(|home| home.join(".algotrace_history"));
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    loop {
        // 回放任务需要在读取输入时继续推进
        let line = tokio::task::block_in_place(|| rl.readline("algotrace> "));
        match line {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match execute_console_command(&line, session) {
                    CommandResult::Continue => {}
                    CommandResult::Exit => break,
                    CommandResult::Message(msg) => println!("{}", msg),
                    CommandResult::Error(msg) => println!("{} {}", "error:".red().bold(), msg),
                }
            }
            Err(ReadlineError::Interrupted) => session.stepper.pause(),
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    Ok(())
}
