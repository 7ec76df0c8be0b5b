use crate::commands::{build_executor, print_outcome, stats_table, status_line};
use crate::config::{Config, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Color, Table as ComfyTable};
use quake_core::QueryParameters;
use quake_executor::CachedQueryExecutor;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};

pub struct Repl {
    config: Config,
    editor: DefaultEditor,
    executor: CachedQueryExecutor,
    history_file: PathBuf,
}

impl Repl {
    pub async fn new(config: Config, file: &Path) -> Result<Self> {
        let history_file = Self::get_history_file()?;
        let mut editor = DefaultEditor::new()?;

        // Load history
        let _ = editor.load_history(&history_file);

        let executor = build_executor(&config, file).await?;

        Ok(Self {
            config,
            editor,
            executor,
            history_file,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "Interactive Earthquake Query REPL".bright_green().bold());
        println!(
            "Enter a magnitude range as {}, or {} for commands",
            "<min> <max>".bright_cyan(),
            ".help".bright_cyan()
        );
        println!();

        loop {
            let prompt = format!("{} ", "quake>".bright_green().bold());
            let readline = self.editor.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    self.editor.add_history_entry(line)?;

                    match self.handle_input(line).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => eprintln!("{} {:#}", "Error:".bright_red().bold(), e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".bright_yellow());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "exit".bright_yellow());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {:?}", "Error:".bright_red().bold(), err);
                    break;
                }
            }
        }

        // Save history
        self.editor.save_history(&self.history_file)?;

        println!("{}", "Goodbye!".bright_cyan());
        Ok(())
    }

    /// Returns `false` when the session should end
    async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.starts_with('.') {
            self.handle_command(input).await
        } else {
            self.handle_range(input).await?;
            Ok(true)
        }
    }

    async fn handle_command(&mut self, cmd: &str) -> Result<bool> {
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        match parts[0] {
            ".help" | ".h" => self.show_help(),
            ".quit" | ".q" | ".exit" => return Ok(false),
            ".stats" => println!("{}", stats_table(&self.executor.cache_stats(), &self.executor)),
            ".clear" => {
                self.executor.cache_stats().reset();
                println!("{} Statistics reset", "✓".bright_green());
            }
            ".ttl" => {
                let config = self.executor.config();
                println!(
                    "Entries live for {}s in the {} store",
                    config.ttl.as_secs().to_string().bright_cyan(),
                    self.executor.store().name()
                );
            }
            ".invalidate" => {
                if parts.len() < 3 {
                    anyhow::bail!("Usage: .invalidate <min> <max>");
                }
                let params = QueryParameters::parse(parts[1], parts[2])?;
                if self.executor.invalidate(&params).await? {
                    println!("{} Dropped cached result for {}", "✓".bright_green(), params);
                } else {
                    println!("{} Nothing cached for {}", "→".bright_blue(), params);
                }
            }
            ".timing" => {
                self.config.show_timing = !self.config.show_timing;
                println!(
                    "Timing is now {}",
                    if self.config.show_timing {
                        "ON".bright_green()
                    } else {
                        "OFF".bright_red()
                    }
                );
            }
            ".format" => {
                if parts.len() < 2 {
                    println!("Current format: {:?}", self.config.output_format);
                    println!("Usage: .format <table|json|csv>");
                } else {
                    self.config.output_format = parts[1].parse::<OutputFormat>()?;
                    println!("Output format set to: {}", parts[1].bright_cyan());
                }
            }
            other => anyhow::bail!("Unknown command: {} (try .help)", other),
        }
        Ok(true)
    }

    async fn handle_range(&mut self, input: &str) -> Result<()> {
        let params = parse_range(input)?;
        let outcome = self.executor.resolve(&params).await?;

        print_outcome(&outcome, self.config.output_format, self.config.max_rows)?;
        if self.config.show_timing {
            println!("{}", status_line(&params, &outcome));
        }
        Ok(())
    }

    fn show_help(&self) {
        let mut table = ComfyTable::new();
        table.set_header(vec![
            Cell::new("Command").fg(Color::Cyan),
            Cell::new("Description").fg(Color::Yellow),
        ]);

        let commands = vec![
            ("<min> <max>", "Events with magnitude in [min, max], newest first"),
            (".help, .h", "Show this help message"),
            (".quit, .q, .exit", "Exit the REPL"),
            (".stats", "Show cache statistics"),
            (".clear", "Reset cache statistics"),
            (".ttl", "Show the cache entry lifetime"),
            (".invalidate <min> <max>", "Drop one cached result"),
            (".timing", "Toggle timing and cache status display"),
            (".format <type>", "Set output format (table|json|csv)"),
        ];

        for (cmd, desc) in commands {
            table.add_row(vec![cmd, desc]);
        }

        println!("{}", table);
    }

    fn get_history_file() -> Result<PathBuf> {
        let home = home::home_dir().context("Could not find home directory")?;
        let history_dir = home.join(".quake");
        std::fs::create_dir_all(&history_dir)?;
        Ok(history_dir.join("history.txt"))
    }
}

/// `"<min> <max>"`, also accepting a comma between the bounds
fn parse_range(input: &str) -> Result<QueryParameters> {
    let bounds: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    match bounds.as_slice() {
        [min, max] => Ok(QueryParameters::parse(min, max)?),
        _ => anyhow::bail!("Expected a magnitude range like '2.5 6.0', got '{}'", input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let params = parse_range("2.5 6").unwrap();
        assert_eq!(params.min_magnitude(), 2.5);
        assert_eq!(params.max_magnitude(), 6.0);

        let params = parse_range(" 3, 4.5 ").unwrap();
        assert_eq!(params.max_magnitude(), 4.5);
    }

    #[test]
    fn test_parse_range_rejects_bad_input() {
        assert!(parse_range("5").is_err());
        assert!(parse_range("1 2 3").is_err());
        assert!(parse_range("low high").is_err());
        assert!(parse_range("nan 4").is_err());
    }
}
