//! 控制台命令补全器
//!
//! 基于 rustyline 实现 Tab 补全功能

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// 控制台命令列表
const CONSOLE_COMMANDS: &[&str] = &[
    "next", "prev", "reset", "play", "goto", "show", "list", "build", "vertical", "help",
    "quit", "exit",
];

/// algotrace 控制台补全器
#[derive(Default)]
pub struct ConsoleCompleter;

impl ConsoleCompleter {
    pub fn new() -> Self {
        Self
    }

    /// 以 `prefix` 开头的命令
    pub fn candidates(prefix: &str) -> Vec<&'static str> {
        let prefix = prefix.to_lowercase();
        CONSOLE_COMMANDS
            .iter()
            .copied()
            .filter(|cmd| cmd.starts_with(&prefix))
            .collect()
    }
}

impl Completer for ConsoleCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];

        // 只补全第一个单词
        if line_to_cursor.trim_start().contains(' ') {
            return Ok((pos, vec![]));
        }

        let word = line_to_cursor.trim_start();
        let start_pos = pos - word.len();
        let completions: Vec<Pair> = Self::candidates(word)
            .into_iter()
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((start_pos, completions))
    }
}

impl Hinter for ConsoleCompleter {
    type Hint = String;
}

impl Highlighter for ConsoleCompleter {}

impl Validator for ConsoleCompleter {}

impl Helper for ConsoleCompleter {}
