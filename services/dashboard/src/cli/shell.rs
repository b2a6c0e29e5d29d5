//! An interactive shell over one `AppState`, so a session that is not
//! remembered, the last upload and an API key set with `keys use` all carry over
//! from one line to the next.

use std::io::Write;

use clap::{CommandFactory, Parser};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::commands::{Cli, Commands};
use crate::cli::execute;
use crate::cli::state::AppState;
use crate::error::DashboardError;

pub async fn run_shell(state: &AppState) -> Result<(), DashboardError> {
    println!("--- Jaison Shell ---");
    match state.session.snapshot().user {
        Some(user) => println!("Logged in as {}", user.email),
        None => println!("Not logged in."),
    }
    println!("Type `help` for commands and `exit` to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\njaison> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words = match split_line(&line) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };
        match words.first().map(String::as_str) {
            None => continue,
            Some("exit") | Some("quit") => break,
            Some("help") => {
                Cli::command().print_help()?;
                continue;
            }
            Some(_) => {}
        }

        let cli = match Cli::try_parse_from(std::iter::once("jaison".to_string()).chain(words)) {
            Ok(cli) => cli,
            Err(e) => {
                // Help and version output come through here too.
                e.print().ok();
                continue;
            }
        };
        if let Commands::Shell = cli.command {
            println!("Already in the shell.");
            continue;
        }
        if let Err(e) = execute(cli.command, state).await {
            eprintln!("Error: {}", e);
        }
    }
    Ok(())
}

/// Splits a line into words, honouring single and double quotes.
fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            split_line("  keys   list --active ").unwrap(),
            vec!["keys", "list", "--active"]
        );
        assert!(split_line("   ").unwrap().is_empty());
    }

    #[test]
    fn keeps_quoted_words_together() {
        assert_eq!(
            split_line(r#"ocr process --prompt "Extract the total" -t 'id card'"#).unwrap(),
            vec!["ocr", "process", "--prompt", "Extract the total", "-t", "id card"]
        );
        assert_eq!(split_line(r#"--prompt """#).unwrap(), vec!["--prompt", ""]);
    }

    #[test]
    fn rejects_unterminated_quotes() {
        assert!(split_line("auth login -p 'secret").is_err());
    }
}
