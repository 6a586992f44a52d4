//! Report rendering.
//!
//! This module renders layout blocks into a paginated Markdown document,
//! decorating every page through caller-supplied callbacks, and exports
//! the JSON form of a report.

use crate::error::{ReportError, Result};
use crate::models::Report;
use crate::report::layout::{build_document, Alignment, Block, LayoutOptions, Span, Table};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::debug;

/// Drawing surface handed to the page decoration callbacks.
#[derive(Debug, Default)]
pub struct PageCanvas {
    /// 1-based page number.
    pub page_number: usize,
    lines: Vec<String>,
}

impl PageCanvas {
    fn new(page_number: usize) -> Self {
        Self {
            page_number,
            lines: Vec::new(),
        }
    }

    /// Draw a line of small text centered at the bottom of the page.
    pub fn draw_centered_string(&mut self, text: &str) {
        self.lines
            .push(format!("<p align=\"center\"><sub>{}</sub></p>", escape(text)));
    }
}

/// Callback invoked once per page to draw decorations such as a footer.
pub type PageDecorator<'a> = &'a dyn Fn(&mut PageCanvas);

/// A document backend.
pub trait Renderer {
    /// Render `blocks` into a finished document.
    ///
    /// `on_first_page` decorates page 1, `on_later_pages` every other page.
    fn render(
        &self,
        blocks: &[Block],
        on_first_page: PageDecorator<'_>,
        on_later_pages: PageDecorator<'_>,
    ) -> Result<String>;
}

/// Markdown backend with fixed-height pages.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    lines_per_page: usize,
}

/// Lines kept free at the bottom of each page for decorations.
const FOOTER_LINES: usize = 2;

/// Lines taken by the page marker at the top of each page.
const HEADER_LINES: usize = 1;

/// Smallest page that still fits a table header plus one row.
pub const MIN_LINES_PER_PAGE: usize = 10;

impl MarkdownRenderer {
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(MIN_LINES_PER_PAGE),
        }
    }

    fn body_lines(&self) -> usize {
        self.lines_per_page - FOOTER_LINES - HEADER_LINES
    }
}

impl Renderer for MarkdownRenderer {
    fn render(
        &self,
        blocks: &[Block],
        on_first_page: PageDecorator<'_>,
        on_later_pages: PageDecorator<'_>,
    ) -> Result<String> {
        let mut paginator = Paginator::new(self.body_lines());

        for block in blocks {
            match block {
                Block::Spacer { lines } => paginator.place_space(*lines),
                Block::Table(table) => paginator.place_table(table),
                other => paginator.place(render_block(other)),
            }
        }

        let pages = paginator.finish();
        debug!("Rendered {} block(s) onto {} page(s)", blocks.len(), pages.len());

        let mut output = String::new();
        for (idx, body) in pages.into_iter().enumerate() {
            let mut canvas = PageCanvas::new(idx + 1);
            if idx == 0 {
                on_first_page(&mut canvas);
            } else {
                output.push_str("\n---\n\n");
                on_later_pages(&mut canvas);
            }

            output.push_str(&format!("<!-- Page {} -->\n", canvas.page_number));
            for line in body {
                output.push_str(&line);
                output.push('\n');
            }
            output.push('\n');
            for line in &canvas.lines {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }
}

/// Distributes rendered lines over fixed-height pages.
struct Paginator {
    budget: usize,
    pages: Vec<Vec<String>>,
}

impl Paginator {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            pages: vec![Vec::new()],
        }
    }

    fn current(&mut self) -> &mut Vec<String> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn current_len(&self) -> usize {
        self.pages.last().map(Vec::len).unwrap_or(0)
    }

    fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.current_len())
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
    }

    /// Place a block, moving it to a fresh page when it would be split
    /// but fits on one page.
    fn place(&mut self, lines: Vec<String>) {
        if lines.len() > self.remaining() && lines.len() <= self.budget && self.current_len() > 0 {
            self.new_page();
        }

        for line in lines {
            if self.remaining() == 0 {
                self.new_page();
            }
            self.current().push(line);
        }
    }

    /// Vertical space is dropped at page boundaries.
    fn place_space(&mut self, lines: usize) {
        if self.current_len() == 0 {
            return;
        }
        let lines = lines.min(self.remaining());
        for _ in 0..lines {
            self.current().push(String::new());
        }
    }

    /// Place a table, repeating the header row on continuation pages.
    fn place_table(&mut self, table: &Table) {
        let header = table_header(table);
        // header, separator, at least one row, trailing blank
        let min_height = header.len() + 2;

        if self.remaining() < min_height && self.current_len() > 0 {
            self.new_page();
        }

        let mut rows = table.rows.iter().peekable();
        loop {
            let room = self.remaining().saturating_sub(header.len() + 1).max(1);
            let page = self.current();
            page.extend(header.iter().cloned());
            for row in rows.by_ref().take(room) {
                page.push(table_row(row, false));
            }
            page.push(String::new());

            if rows.peek().is_none() {
                break;
            }
            self.new_page();
        }
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        // Trailing blank lines carry no content.
        for page in &mut self.pages {
            while page.last().map(|l| l.is_empty()).unwrap_or(false) {
                page.pop();
            }
        }
        if self.pages.len() > 1 {
            self.pages.retain(|page| !page.is_empty());
        }
        self.pages
    }
}

/// Render a non-table, non-spacer block to Markdown lines.
fn render_block(block: &Block) -> Vec<String> {
    match block {
        Block::Title { text, align } => {
            let line = match align {
                Alignment::Center => format!("<h1 align=\"center\">{}</h1>", escape(text)),
                Alignment::Left => format!("# {}", escape_markdown(text)),
            };
            vec![line, String::new()]
        }
        Block::Heading { level, spans } => {
            let hashes = "#".repeat((*level).clamp(2, 6) as usize);
            vec![format!("{} {}", hashes, render_spans(spans)), String::new()]
        }
        Block::Paragraph { spans } => vec![render_spans(spans), String::new()],
        Block::Spacer { lines } => vec![String::new(); *lines],
        Block::Table(table) => {
            let mut lines = table_header(table);
            lines.extend(table.rows.iter().map(|row| table_row(row, false)));
            lines.push(String::new());
            lines
        }
    }
}

fn render_spans(spans: &[Span]) -> String {
    spans.iter().map(render_span).collect()
}

fn render_span(span: &Span) -> String {
    let mut text = escape_markdown(&span.text);
    if span.bold {
        text = format!("**{}**", text);
    }
    if span.underline {
        text = format!("<u>{}</u>", text);
    }
    text
}

fn table_header(table: &Table) -> Vec<String> {
    let marker = match table.style.alignment {
        Alignment::Center => ":---:",
        Alignment::Left => ":---",
    };
    let separator = format!("|{}|", vec![marker; table.header.len()].join("|"));

    vec![table_row(&table.header, table.style.header_bold), separator]
}

fn table_row(cells: &[String], bold: bool) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|c| {
            let c = escape_markdown(c);
            if bold {
                format!("**{}**", c)
            } else {
                c
            }
        })
        .collect();
    format!("| {} |", cells.join(" | "))
}

/// Escape text placed inside an HTML element. Line breaks become spaces.
fn escape(text: &str) -> String {
    text.replace(&['\r', '\n'][..], " ")
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape user text placed in Markdown so it stays on one line and cannot
/// open emphasis, links, code, headings or table cells.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\r' | '\n' => escaped.push(' '),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\\' | '*' | '_' | '`' | '[' | ']' | '|' | '#' | '~' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Footer text stamped on every page.
pub fn footer_text(generated_at: &DateTime<Local>) -> String {
    format!(
        "Report Generated on {}",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Generate the complete paginated Markdown report.
pub fn generate_markdown_report(
    report: &Report,
    options: &LayoutOptions,
    lines_per_page: usize,
) -> Result<String> {
    let blocks = build_document(&report.summary, options);
    let footer = footer_text(&report.metadata.generated_at);
    let draw_footer = |canvas: &mut PageCanvas| canvas.draw_centered_string(&footer);

    MarkdownRenderer::new(lines_per_page).render(&blocks, &draw_footer, &draw_footer)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write a rendered document to its destination.
pub fn write_document(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| {
        ReportError::RenderFailure(format!("cannot write '{}': {}", path.display(), e))
    })
}
