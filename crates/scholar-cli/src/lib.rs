//! Interactive session and terminal UI for the Scholar RAG assistant

mod commands;
mod session;
mod ui;


pub use commands::{Command, DEFAULT_RESULT_COUNT, MAX_RESULT_COUNT, parse_command};
pub use session::{AnalysisReport, PaperFailure, Session};
pub use ui::{
    display_banner, format_paper, handle_input_with_history, print_analysis_report, print_help,
    print_papers, print_progress, print_transcript, progress_bar,
};

// Re-export core types
pub use scholar_core::{Error, Result};
