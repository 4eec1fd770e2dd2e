//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use scholar_core::{ConversationTurn, PaperRecord, Result, Role};
use std::io::{self, IsTerminal, Write};

use crate::AnalysisReport;

const PROMPT: &str = "scholar>";
const ABSTRACT_PREVIEW_CHARS: usize = 240;

/// Display startup banner
pub fn display_banner() {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4)).max(40);

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());

    let title = "Scholar RAG - Ask Your Papers";
    let title_line = format!(
        "│  {}{}│",
        title.blue().bold(),
        " ".repeat(banner_width.saturating_sub(title.chars().count() + 4))
    );
    println!("{}", title_line);

    println!("{}", empty_line.blue());

    let feature_lines = [
        "Search Google Scholar for papers on a topic",
        "Download and index the PDFs you select",
        "Ask questions answered only from those papers",
        "",
        "v0.1.0",
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.blue());
        } else {
            let padding = " ".repeat(banner_width.saturating_sub(line.chars().count() + 4));
            let content = if line.starts_with("v0.1.0") {
                format!("│  {}{}│", line.dimmed(), padding)
            } else {
                format!("│  {}{}│", line, padding)
            };
            println!("{}", content.blue());
        }
    }

    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!(
        "{}",
        "💡 Tip: start with 'search <topic>', or type 'help' for commands".dimmed()
    );
    println!();
}

/// Handle input with command history navigation
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    // Piped input is read line by line without raw mode
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok("exit".to_string());
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let result = read_line_raw(history);
    disable_raw_mode()?;
    println!();

    let input = result?;
    if !input.is_empty() {
        history.push(input.clone());
    }
    Ok(input)
}

fn read_line_raw(history: &[String]) -> Result<String> {
    let mut input = String::new();
    let mut history_index: Option<usize> = None;

    redraw(&input, 0)?;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };

        let previous_len = input.chars().count();
        match key_event.code {
            KeyCode::Enter => return Ok(input),
            KeyCode::Esc => return Ok(String::new()),
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok("exit".to_string());
            }
            KeyCode::Char(c) => {
                input.push(c);
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Up => {
                if history.is_empty() {
                    continue;
                }
                let new_index = match history_index {
                    None => history.len() - 1,
                    Some(idx) if idx > 0 => idx - 1,
                    Some(idx) => idx,
                };
                history_index = Some(new_index);
                input = history[new_index].clone();
            }
            KeyCode::Down => {
                let Some(idx) = history_index else {
                    continue;
                };
                if idx + 1 < history.len() {
                    history_index = Some(idx + 1);
                    input = history[idx + 1].clone();
                } else {
                    history_index = None;
                    input.clear();
                }
            }
            _ => continue,
        }

        redraw(&input, previous_len)?;
    }
}

fn redraw(input: &str, previous_len: usize) -> Result<()> {
    let blank = " ".repeat(previous_len + 1);
    print!("\r{} {}\r{} {}", PROMPT.green().bold(), blank, PROMPT.green().bold(), input);
    io::stdout().flush()?;
    Ok(())
}

/// Display help message
pub fn print_help() {
    println!("{}", "Available commands:".bold());
    println!("  {} - Find papers on Google Scholar (N from 1 to 10, default 3)", "search [-n N] <topic>".green());
    println!("  {} - Show the current search results", "papers".green());
    println!("  {} - Toggle papers for analysis (only papers with a PDF link)", "select <number>...".green());
    println!("  {} - Download, split and index the selected papers", "analyze".green());
    println!("  {} - Ask about the analyzed papers (or just type the question)", "ask <question>".green());
    println!("  {} - Show the conversation so far", "history".green());
    println!("  {} - Delete everything from the index", "clear".green());
    println!("  {} - Verify API key, directories and index", "check".green());
    println!("  {} - Show this help message", "help".green());
    println!("  {} - Exit the application", "exit/quit".green());
    println!();
    println!("{}", "Examples:".bold());
    println!("  search -n 5 graph neural networks");
    println!("  select 1 3");
    println!("  What datasets are used for evaluation?");
}

/// Render one search result as plain text, numbered from 1
pub fn format_paper(index: usize, record: &PaperRecord, selected: bool) -> String {
    let marker = if !record.has_pdf() {
        "[-]"
    } else if selected {
        "[x]"
    } else {
        "[ ]"
    };

    let mut summary: String = record.abstract_text.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
    if record.abstract_text.chars().count() > ABSTRACT_PREVIEW_CHARS {
        summary.push_str("...");
    }

    let mut lines = vec![
        format!("{} {}. {}", marker, index + 1, record.title),
        format!("    Authors: {}", record.authors_display()),
        format!("    Year: {}", record.year),
        format!("    Abstract: {}", summary),
    ];
    match (&record.pdf_url, &record.pub_url) {
        (Some(pdf), _) => lines.push(format!("    PDF: {}", pdf)),
        (None, Some(publication)) => {
            lines.push(format!("    Publication (no PDF): {}", publication))
        }
        (None, None) => lines.push("    No PDF available".to_string()),
    }
    lines.join("\n")
}

/// Print the search results with their selection state
pub fn print_papers(papers: &[PaperRecord], is_selected: impl Fn(usize) -> bool) {
    if papers.is_empty() {
        println!("{} No papers yet. Try 'search <topic>'.", "ℹ️".cyan());
        return;
    }

    for (i, record) in papers.iter().enumerate() {
        let text = format_paper(i, record, is_selected(i));
        if record.has_pdf() {
            println!("{}", text);
        } else {
            println!("{}", text.dimmed());
        }
        println!();
    }
}

/// A textual progress bar such as `[#####     ]`
pub fn progress_bar(done: usize, total: usize, width: usize) -> String {
    let filled = if total == 0 { width } else { (done.min(total) * width) / total };
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

/// Print one analysis progress line
pub fn print_progress(done: usize, total: usize, title: &str) {
    println!(
        "{} {} {}/{} {}",
        "📄".blue(),
        progress_bar(done, total, 20).cyan(),
        done,
        total,
        title
    );
}

/// Print the summary of an analysis run
pub fn print_analysis_report(report: &AnalysisReport) {
    println!(
        "{} Indexed {} paper(s): {} new chunk(s), {} already present",
        "✅".green(),
        report.papers_ingested,
        report.chunks_added,
        report.duplicates_skipped
    );
    for failure in &report.failures {
        println!("{} {}: {}", "⚠️".yellow(), failure.title, failure.reason);
    }
}

/// Print the conversation so far
pub fn print_transcript(transcript: &[ConversationTurn]) {
    if transcript.is_empty() {
        println!("{} No questions asked yet.", "ℹ️".cyan());
        return;
    }

    for turn in transcript {
        let time = turn.timestamp.format("%H:%M:%S");
        match turn.role {
            Role::User => println!("{} {} {}", time.to_string().dimmed(), "You:".bold(), turn.text),
            Role::Assistant => {
                println!("{} {} {}", time.to_string().dimmed(), "Assistant:".green().bold(), turn.text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4, 8), "[        ]");
        assert_eq!(progress_bar(1, 4, 8), "[##      ]");
        assert_eq!(progress_bar(4, 4, 8), "[########]");
        assert_eq!(progress_bar(0, 0, 4), "[####]");
    }

    #[test]
    fn test_long_abstract_is_shortened() {
        let record = PaperRecord {
            title: "Long".to_string(),
            authors: Vec::new(),
            abstract_text: "word ".repeat(100),
            year: "2020".to_string(),
            pdf_url: None,
            pub_url: None,
        };

        let text = format_paper(0, &record, false);
        let abstract_line = text.lines().nth(3).unwrap();
        assert!(abstract_line.ends_with("..."));
        assert!(abstract_line.chars().count() < 260);
        assert!(text.ends_with("No PDF available"));
    }
}
