//! Terminal rendering for the interactive loop and the history command.

use crate::error::VoxlateError;
use crate::history::TranslationRecord;
use crate::interactive::{ControllerEvents, ControllerState};
use crate::pipeline::PipelineOutput;
use crate::translate::languages::LANGUAGES;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Banner printed when the interactive loop starts.
pub fn render_banner(source: &str, target: &str) {
    eprintln!("{BOLD}Real-time speech translator ({source} → {target}){RESET}");
    eprintln!("{DIM}Commands: p = pause/resume, h = history, q = quit (then Enter){RESET}");
}

/// One line per record: time, languages, original and translation.
pub fn format_record(record: &TranslationRecord) -> String {
    format!(
        "{DIM}{}{RESET} [{} → {}] {} {DIM}→{RESET} {GREEN}{}{RESET}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.source_lang,
        record.target_lang,
        record.original_text,
        record.translated_text,
    )
}

pub fn render_history(records: &[TranslationRecord]) {
    if records.is_empty() {
        println!("{DIM}No translations yet{RESET}");
        return;
    }
    println!("{BOLD}Recent translations:{RESET}");
    for record in records {
        println!("  {}", format_record(record));
    }
}

pub fn render_languages() {
    for (code, name) in LANGUAGES {
        println!("  {code:<6} {name}");
    }
}

fn state_label(state: ControllerState) -> Option<&'static str> {
    match state {
        ControllerState::Listening => Some("Listening... speak now"),
        ControllerState::Paused => Some("Paused (p to resume)"),
        ControllerState::Terminated => Some("Exiting..."),
        ControllerState::ShowingHistory => None,
    }
}

/// Renders controller events to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEvents {
    quiet: bool,
}

impl ConsoleEvents {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ControllerEvents for ConsoleEvents {
    fn state_changed(&mut self, state: ControllerState) {
        if self.quiet {
            return;
        }
        if let Some(label) = state_label(state) {
            eprintln!("{CYAN}{label}{RESET}");
        }
    }

    fn translated(&mut self, output: &PipelineOutput) {
        if !self.quiet {
            eprintln!("{DIM}You said:{RESET} {}", output.original_text);
        }
        println!("{GREEN}{}{RESET}", output.translated_text);
        if output.audio.is_none() && !self.quiet {
            eprintln!("{YELLOW}(no audio: speech synthesis failed){RESET}");
        }
    }

    fn history(&mut self, records: &[TranslationRecord]) {
        render_history(records);
    }

    fn error(&mut self, error: &VoxlateError) {
        eprintln!("{RED}{error}{RESET}");
    }

    fn nothing_heard(&mut self) {
        if !self.quiet {
            eprintln!("{DIM}(nothing heard){RESET}");
        }
    }
}
