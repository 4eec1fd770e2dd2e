//! Parsing of interactive input lines

use scholar_core::{Error, Result};

/// Results requested by `search` when `-n` is not given
pub const DEFAULT_RESULT_COUNT: usize = 3;
/// Upper bound accepted for `-n`
pub const MAX_RESULT_COUNT: usize = 10;

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search { topic: String, limit: usize },
    Papers,
    /// Zero-based indices of the papers to toggle
    Select(Vec<usize>),
    Analyze,
    Ask(String),
    History,
    Clear,
    Check,
    Help,
    Exit,
    Empty,
}

/// Interpret an input line
///
/// Unknown words are treated as a question, so `ask` is optional. Paper
/// numbers are entered 1-based as printed by `papers`.
pub fn parse_command(input: &str) -> Result<Command> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Command::Empty);
    }

    let (head, rest) = match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    };

    let command = match head.to_lowercase().as_str() {
        "exit" | "quit" if rest.is_empty() => Command::Exit,
        "help" if rest.is_empty() => Command::Help,
        "papers" if rest.is_empty() => Command::Papers,
        "analyze" if rest.is_empty() => Command::Analyze,
        "history" if rest.is_empty() => Command::History,
        "clear" if rest.is_empty() => Command::Clear,
        "check" if rest.is_empty() => Command::Check,
        "search" => parse_search(rest)?,
        "select" => Command::Select(parse_indices(rest)?),
        "ask" => {
            if rest.is_empty() {
                return Err(Error::InvalidInput("Usage: ask <question>".to_string()));
            }
            Command::Ask(rest.to_string())
        }
        _ => Command::Ask(input.to_string()),
    };

    Ok(command)
}

fn parse_search(args: &str) -> Result<Command> {
    let mut limit = DEFAULT_RESULT_COUNT;
    let mut words = Vec::new();
    let mut tokens = args.split_whitespace();

    while let Some(token) = tokens.next() {
        if token == "-n" {
            let value = tokens
                .next()
                .ok_or_else(|| Error::InvalidInput("-n needs a number".to_string()))?;
            limit = value
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Not a number: {}", value)))?;
        } else {
            words.push(token);
        }
    }

    if !(1..=MAX_RESULT_COUNT).contains(&limit) {
        return Err(Error::InvalidInput(format!(
            "Number of papers must be between 1 and {}",
            MAX_RESULT_COUNT
        )));
    }

    if words.is_empty() {
        return Err(Error::InvalidInput("Usage: search [-n N] <topic>".to_string()));
    }

    Ok(Command::Search {
        topic: words.join(" "),
        limit,
    })
}

fn parse_indices(args: &str) -> Result<Vec<usize>> {
    let indices = args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(Error::InvalidInput(format!("Not a paper number: {}", s))),
        })
        .collect::<Result<Vec<_>>>()?;

    if indices.is_empty() {
        return Err(Error::InvalidInput("Usage: select <number>...".to_string()));
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults_to_three_results() {
        assert_eq!(
            parse_command("search graph neural networks").unwrap(),
            Command::Search {
                topic: "graph neural networks".to_string(),
                limit: DEFAULT_RESULT_COUNT,
            }
        );
    }

    #[test]
    fn test_search_count_anywhere() {
        let expected = Command::Search {
            topic: "protein folding".to_string(),
            limit: 7,
        };
        assert_eq!(parse_command("search -n 7 protein folding").unwrap(), expected);
        assert_eq!(parse_command("search protein folding -n 7").unwrap(), expected);
    }

    #[test]
    fn test_search_count_out_of_range() {
        assert!(parse_command("search -n 0 topic").is_err());
        assert!(parse_command("search -n 11 topic").is_err());
        assert!(parse_command("search -n many topic").is_err());
        assert!(parse_command("search -n 5").is_err());
    }

    #[test]
    fn test_select_is_one_based() {
        assert_eq!(parse_command("select 1 3").unwrap(), Command::Select(vec![0, 2]));
        assert_eq!(parse_command("select 2,4").unwrap(), Command::Select(vec![1, 3]));
        assert!(parse_command("select 0").is_err());
        assert!(parse_command("select").is_err());
    }

    #[test]
    fn test_free_text_is_a_question() {
        assert_eq!(
            parse_command("What dataset is used?").unwrap(),
            Command::Ask("What dataset is used?".to_string())
        );
        assert_eq!(
            parse_command("ask  Which loss?").unwrap(),
            Command::Ask("Which loss?".to_string())
        );
        assert_eq!(
            parse_command("clear the results please").unwrap(),
            Command::Ask("clear the results please".to_string())
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_command("  ").unwrap(), Command::Empty);
        assert_eq!(parse_command("QUIT").unwrap(), Command::Exit);
        assert_eq!(parse_command("exit").unwrap(), Command::Exit);
        assert_eq!(parse_command("check").unwrap(), Command::Check);
        assert_eq!(parse_command("analyze").unwrap(), Command::Analyze);
        assert_eq!(parse_command("history").unwrap(), Command::History);
    }
}
