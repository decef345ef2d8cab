use anyhow::Result;
use rustyline::{DefaultEditor, error::ReadlineError};

use argon::{
    api::db::Database,
    catalog::Catalog,
    config::Config,
    db_info,
    debugger::{Component, set_debug_level},
    frontend::command::{Command, parse_command},
};

const HELP: &str = "\
commands:
  create <table> <col>:<type> [not null] ...   types: int bigint double bool string varchar(n)
  drop <table>
  insert <table> <literal> ...
  select <table>
  update <table> set <col> = <literal> [where <col> <op> <literal>]
  tables
  help
  exit";

fn main() -> Result<()> {
    let config = Config::from_env()?;
    set_debug_level(config.debug_level);
    db_info!(Component::Cli, "starting with {:?}", config);

    let mut db = Database::with_catalog(Catalog::with_page_capacity(config.page_capacity));
    let mut rl = DefaultEditor::new()?;
    if let Some(path) = &config.history_file {
        // a missing history file is normal on first run
        let _ = rl.load_history(path);
    }

    println!("Argon CLI");
    println!("Type a command and press enter. 'help' lists commands, Ctrl+D exits");

    loop {
        let line = match rl.readline("argon> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        rl.add_history_entry(input)?;

        let command = match parse_command(input) {
            Ok(command) => command,
            Err(err) => {
                println!("error: {}", err);
                continue;
            }
        };

        match command {
            Command::Exit => break,
            Command::Help => println!("{}", HELP),
            command => match db.execute(command) {
                Ok(result) => println!("{}", result),
                Err(err) => println!("error: {:#}", err),
            },
        }
    }

    if let Some(path) = &config.history_file {
        rl.save_history(path)?;
    }
    Ok(())
}
