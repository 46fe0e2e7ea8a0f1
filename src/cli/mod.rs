//! 命令行界面组件

pub mod commands;
pub mod completer;
pub mod printer;

pub use commands::{execute_console_command, Command, CommandResult, Session};
pub use completer::ConsoleCompleter;
pub use printer::{PrintMode, Printer};
