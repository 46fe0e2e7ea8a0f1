//! 控制台命令处理
//!
//! 解析并执行交互式回放命令

use crate::cli::printer::{PrintMode, Printer};
use crate::graph::{Graph, Instance};
use crate::stepper::{PlaybackState, Stepper};
use parking_lot::Mutex;
use std::str::FromStr;
use std::sync::Arc;

/// 控制台命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Reset,
    Play,
    /// 目标步骤，从 1 开始
    Goto(usize),
    Show,
    List,
    Build,
    Vertical,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let input = input.strip_prefix(':').unwrap_or(input);

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("next").to_lowercase();
        let arg = parts.next();

        match cmd.as_str() {
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "reset" | "r" => Ok(Command::Reset),
            "play" | "pause" | "auto" => Ok(Command::Play),
            "goto" | "g" => match arg.map(str::parse::<usize>) {
                Some(Ok(n)) if n >= 1 => Ok(Command::Goto(n)),
                _ => Err("Usage: goto <N> (N ≥ 1)".to_string()),
            },
            "show" | "s" => Ok(Command::Show),
            "list" | "l" => Ok(Command::List),
            "build" => Ok(Command::Build),
            "vertical" | "v" => Ok(Command::Vertical),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" | "e" => Ok(Command::Quit),
            other => Err(format!("Unknown command: {}. Type help for help.", other)),
        }
    }
}

/// 控制台命令执行结果
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// 继续运行
    Continue,
    /// 退出程序
    Exit,
    /// 显示消息
    Message(String),
    /// 错误
    Error(String),
}

/// 一次回放会话：步骤控制器、输入实例与打印器
pub struct Session {
    pub stepper: Stepper,
    pub instance: Instance,
    printer: Arc<Mutex<Printer>>,
}

impl Session {
    pub fn new(instance: Instance, stepper: Stepper) -> Self {
        Self {
            stepper,
            instance,
            printer: Arc::new(Mutex::new(Printer::default())),
        }
    }

    /// 把每次游标移动渲染后交给 `sink`
    ///
    /// 自动播放时回调在 tokio 工作线程上执行，交互模式下 `sink`
    /// 应写入 rustyline 的 `ExternalPrinter`，避免打乱输入行。
    pub fn print_on_move<F>(&self, mut sink: F)
    where
        F: FnMut(String) + Send + 'static,
    {
        let printer = self.printer.clone();
        self.stepper.subscribe(move |step, index, total| {
            sink(printer.lock().render_step(step, index, total));
        });
    }

    pub fn printer(&self) -> Printer {
        *self.printer.lock()
    }

    /// 执行一条命令
    pub fn execute(&self, command: Command) -> CommandResult {
        let stepper = &self.stepper;
        match command {
            Command::Next => moved(stepper.next(), "Already at the last step."),
            Command::Prev => moved(stepper.prev(), "Already at the first step."),
            Command::Reset => {
                stepper.reset();
                CommandResult::Continue
            }
            Command::Goto(n) => {
                if stepper.is_empty() {
                    return CommandResult::Error("No steps loaded.".to_string());
                }
                stepper.goto(n - 1);
                CommandResult::Continue
            }
            Command::Play => {
                let was_playing = stepper.state() == PlaybackState::Playing;
                match stepper.play() {
                    Ok(true) => CommandResult::Message(
                        "Playing. Type play again to pause.".to_string(),
                    ),
                    Ok(false) if was_playing => CommandResult::Message("Paused.".to_string()),
                    Ok(false) => CommandResult::Message("Already at the last step.".to_string()),
                    Err(e) => CommandResult::Error(e.to_string()),
                }
            }
            Command::Show => match stepper.current() {
                Some(step) => CommandResult::Message(self.printer().render_step(
                    &step,
                    stepper.cursor(),
                    stepper.len(),
                )),
                None => CommandResult::Error("No steps loaded.".to_string()),
            },
            Command::List => CommandResult::Message(
                self.printer()
                    .render_overview(&stepper.steps(), stepper.cursor()),
            ),
            Command::Build => {
                let log = Graph::build_log(&self.instance.matrix, self.instance.directed());
                CommandResult::Message(self.printer().render_build_log(&log))
            }
            Command::Vertical => {
                let mut printer = self.printer.lock();
                let mode = match printer.mode() {
                    PrintMode::Table => PrintMode::Vertical,
                    PrintMode::Vertical => PrintMode::Table,
                };
                printer.set_mode(mode);
                CommandResult::Message(format!("Table display: {:?}", mode))
            }
            Command::Help => CommandResult::Message(Printer::print_help()),
            Command::Quit => {
                stepper.pause();
                CommandResult::Exit
            }
        }
    }
}

fn moved(did_move: bool, at_edge: &str) -> CommandResult {
    if did_move {
        CommandResult::Continue
    } else {
        CommandResult::Message(at_edge.to_string())
    }
}

/// 解析并执行控制台命令；空行视为 next
pub fn execute_console_command(input: &str, session: &Session) -> CommandResult {
    match input.parse::<Command>() {
        Ok(command) => session.execute(command),
        Err(msg) => CommandResult::Error(msg),
    }
}
