use colored::*;
use neurolearn_core::LearningStyle;
use neurolearn_tutor::{ChatMessage, MessageRole, UserSettings};
use pulldown_cmark::{CodeBlockKind, Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};
use std::path::Path;
use std::sync::OnceLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};
use tracing::warn;

use crate::assets::AssetWriter;

/// Print one transcript entry
pub fn print_message(message: &ChatMessage) {
    match message.role {
        MessageRole::User => {
            println!("{}: {}", "You".green().bold(), message.text);
        }
        MessageRole::Model if message.is_loading => {
            println!("{}: {}", "Tutor".blue().bold(), "thinking...".dimmed());
        }
        MessageRole::Model => {
            println!("{}: {}", "Tutor".blue().bold(), render_markdown(&message.text));
        }
    }
}

/// Write a message's image and audio to disk and tell the learner where they are
pub fn print_assets(message: &ChatMessage, writer: &AssetWriter) {
    if let Some(image) = &message.related_image {
        match writer.save_image(&message.id, image) {
            Ok(path) => print_asset_line("Diagram", &path),
            Err(e) => warn!(error = %e, "Could not save diagram"),
        }
    }
    if let Some(audio) = &message.related_audio {
        match writer.save_audio(&message.id, audio) {
            Ok(path) => print_asset_line("Narration", &path),
            Err(e) => warn!(error = %e, "Could not save narration"),
        }
    }
}

fn print_asset_line(kind: &str, path: &Path) {
    println!("  {} {}", format!("{}:", kind).magenta(), path.display());
}

/// Print the whole conversation in order
pub fn print_transcript(messages: &[ChatMessage]) {
    println!("{}", "── Conversation ──".dimmed());
    for message in messages {
        print_message(message);
        if message.related_image.is_some() || message.related_audio.is_some() {
            println!("  {}", "(assets attached)".dimmed());
        }
        println!();
    }
}

pub fn print_settings(settings: &UserSettings, asset_dir: &Path) {
    let on_off = |flag: bool| if flag { "on".green() } else { "off".red() };
    let key = if settings.has_api_key() {
        settings.masked_api_key().normal()
    } else {
        "not set".red()
    };

    println!("{}", "Settings:".cyan().bold());
    println!("  Learning style: {}", settings.learning_style.label().yellow());
    println!("  Auto audio:     {}", on_off(settings.auto_audio));
    println!("  Auto visual:    {}", on_off(settings.auto_visual));
    println!("  API key:        {}", key);
    println!("  Asset folder:   {}", asset_dir.display());
}

pub fn print_help() {
    let styles: Vec<String> = LearningStyle::ALL
        .iter()
        .map(|style| style.label().to_lowercase())
        .collect();

    println!("{}", "Commands:".cyan().bold());
    println!("  /style <{}>", styles.join("|"));
    println!("  /audio on|off      Narrate every answer");
    println!("  /visual on|off     Illustrate every answer");
    println!("  /settings          Show current settings");
    println!("  /history           Reprint the conversation");
    println!("  /save              Store settings in the config file");
    println!("  exit | quit        Leave the session");
    println!();
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "neurolearn \"How does gradient descent work?\"".green().bold());
    println!("    Ask a single question");
    println!();
    println!("  {}", "neurolearn -i".green().bold());
    println!("    Start an interactive tutoring session");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --style <STYLE>        visual, auditory, theoretical or practical");
    println!("  --auto-audio <BOOL>    Narrate every answer");
    println!("  --auto-visual <BOOL>   Illustrate every answer");
    println!("  --api-key <KEY>        Gemini API key (or GEMINI_API_KEY)");
    println!("  --help                 Show this help message");
    println!();
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let mut themes = ThemeSet::load_defaults().themes;
        themes
            .remove("base16-ocean.dark")
            .or_else(|| themes.into_values().next())
            .unwrap_or_default()
    })
}

fn highlight_code(lang: &str, code: &str) -> String {
    let syntax_set = syntax_set();
    let syntax = syntax_set
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme());

    let mut out = String::new();
    for line in LinesWithEndings::from(code) {
        match highlighter.highlight_line(line, syntax_set) {
            Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
            Err(_) => out.push_str(line),
        }
    }
    // Reset colors left over from the last highlighted span
    out.push_str("\x1b[0m");
    out
}

/// Markdown to terminal text
#[derive(Default)]
struct TerminalRenderer {
    output: String,
    strong: bool,
    emphasis: bool,
    code_block: Option<(String, String)>,
    lists: Vec<Option<u64>>,
    table: Option<Vec<Vec<String>>>,
}

impl TerminalRenderer {
    fn push_text(&mut self, text: &str) {
        if let Some((_, code)) = &mut self.code_block {
            code.push_str(text);
            return;
        }
        if let Some(cell) = self.table.as_mut().and_then(|rows| rows.last_mut()?.last_mut()) {
            cell.push_str(text);
            return;
        }

        let styled = match (self.strong, self.emphasis) {
            (true, true) => text.bold().italic().to_string(),
            (true, false) => text.bold().to_string(),
            (false, true) => text.italic().to_string(),
            (false, false) => text.to_string(),
        };
        self.output.push_str(&styled);
    }

    fn ensure_blank_line(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with("\n\n") {
            if self.output.ends_with('\n') {
                self.output.push('\n');
            } else {
                self.output.push_str("\n\n");
            }
        }
    }

    fn flush_table(&mut self, rows: Vec<Vec<String>>) {
        let col_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; col_count];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        for (i, row) in rows.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                let padding = " ".repeat(widths[j].saturating_sub(cell.chars().count()));
                let cell = if i == 0 { cell.bold().to_string() } else { cell.clone() };
                self.output.push_str(&format!("{}{}  ", cell, padding));
            }
            self.output.push('\n');
            if i == 0 {
                let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
                self.output.push_str(&rule.join("  ").dimmed().to_string());
                self.output.push('\n');
            }
        }
    }

    fn handle(&mut self, event: MdEvent<'_>) {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => {
                self.ensure_blank_line();
                let marker = match level {
                    HeadingLevel::H1 => "#",
                    HeadingLevel::H2 => "##",
                    _ => "###",
                };
                self.output.push_str(&format!("{} ", marker.bright_cyan().bold()));
                self.strong = true;
            }
            MdEvent::End(Tag::Heading(..)) => {
                self.strong = false;
                self.output.push('\n');
            }
            MdEvent::Start(Tag::Paragraph) => {
                if self.lists.is_empty() && self.table.is_none() {
                    self.ensure_blank_line();
                }
            }
            MdEvent::End(Tag::Paragraph) => {
                if self.lists.is_empty() {
                    self.output.push('\n');
                }
            }
            MdEvent::Start(Tag::Strong) => self.strong = true,
            MdEvent::End(Tag::Strong) => self.strong = false,
            MdEvent::Start(Tag::Emphasis) => self.emphasis = true,
            MdEvent::End(Tag::Emphasis) => self.emphasis = false,
            MdEvent::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_block = Some((lang, String::new()));
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                if let Some((lang, code)) = self.code_block.take() {
                    self.ensure_blank_line();
                    if !lang.is_empty() {
                        self.output.push_str(&format!("{}:\n", lang.cyan()));
                    }
                    self.output.push_str(&"─".repeat(40).dimmed().to_string());
                    self.output.push('\n');
                    self.output.push_str(&highlight_code(&lang, &code));
                    self.output.push_str(&"─".repeat(40).dimmed().to_string());
                    self.output.push('\n');
                }
            }
            MdEvent::Start(Tag::List(start)) => {
                if self.lists.is_empty() {
                    self.ensure_blank_line();
                } else if !self.output.ends_with('\n') {
                    self.output.push('\n');
                }
                self.lists.push(start);
            }
            MdEvent::End(Tag::List(_)) => {
                self.lists.pop();
            }
            MdEvent::Start(Tag::Item) => {
                let depth = self.lists.len().saturating_sub(1);
                self.output.push_str(&"  ".repeat(depth));
                match self.lists.last_mut() {
                    Some(Some(n)) => {
                        self.output.push_str(&format!("{}. ", n.to_string().yellow()));
                        *n += 1;
                    }
                    _ => self.output.push_str(&format!("{}  ", "•".yellow())),
                }
            }
            MdEvent::End(Tag::Item) => {
                if !self.output.ends_with('\n') {
                    self.output.push('\n');
                }
            }
            MdEvent::Start(Tag::Table(_)) => {
                self.ensure_blank_line();
                self.table = Some(Vec::new());
            }
            MdEvent::End(Tag::Table(_)) => {
                if let Some(rows) = self.table.take() {
                    self.flush_table(rows);
                }
            }
            MdEvent::Start(Tag::TableHead) | MdEvent::Start(Tag::TableRow) => {
                if let Some(rows) = &mut self.table {
                    rows.push(Vec::new());
                }
            }
            MdEvent::Start(Tag::TableCell) => {
                if let Some(row) = self.table.as_mut().and_then(|rows| rows.last_mut()) {
                    row.push(String::new());
                }
            }
            MdEvent::Code(code) => {
                if self.table.is_some() {
                    self.push_text(&format!("`{}`", code));
                } else {
                    self.output.push_str(&code.on_bright_black().white().to_string());
                }
            }
            MdEvent::Text(text) | MdEvent::Html(text) => self.push_text(&text),
            MdEvent::SoftBreak => self.push_text(" "),
            MdEvent::HardBreak => self.output.push('\n'),
            MdEvent::Rule => {
                self.ensure_blank_line();
                self.output.push_str(&"─".repeat(40).dimmed().to_string());
                self.output.push('\n');
            }
            _ => {}
        }
    }
}

/// Render markdown in the terminal with syntax highlighting
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = TerminalRenderer::default();
    for event in MdParser::new_ext(markdown, options) {
        renderer.handle(event);
    }

    renderer.output.trim_end().to_string()
}
