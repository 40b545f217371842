//! Renders [`Block`]s as HTML.
//!
//! The mapping is deliberately lossy: anything without a generic tag (fonts, colours, custom
//! paragraph styles, underline) is dropped. Dropped styles are reported as warnings.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::types::{ConversionMessage, DocumentConversion};

use super::model::{
    Block, Hyperlink, Inline, Paragraph, Run, RunContent, RunProps, Table, VerticalAlign,
    VerticalMerge,
};
use super::read::{ListFormats, StyleNames};

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Character styles that map onto formatting or carry none worth reporting.
const STRONG_STYLE: &str = "Strong";
const SILENT_CHARACTER_STYLES: &[&str] = &["Hyperlink", "DefaultParagraphFont"];

pub(crate) struct MarkupContext<'a> {
    pub styles: &'a StyleNames,
    pub lists: &'a ListFormats,
    /// Relationship id -> `data:` URI.
    pub images: &'a HashMap<String, String>,
}

pub(crate) fn render(blocks: &[Block], ctx: &MarkupContext<'_>) -> DocumentConversion {
    let mut writer = Writer {
        ctx,
        out: String::new(),
        messages: Vec::new(),
        lists: Vec::new(),
    };
    writer.blocks(blocks);
    writer.close_lists();
    DocumentConversion {
        value: writer.out,
        messages: writer.messages,
    }
}

#[derive(Debug, Clone, Copy)]
struct ListFrame {
    level: usize,
    ordered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format {
    bold: bool,
    italic: bool,
    strike: bool,
    vertical: VerticalAlign,
}

struct Writer<'a, 'c> {
    ctx: &'c MarkupContext<'a>,
    out: String,
    messages: Vec<ConversionMessage>,
    lists: Vec<ListFrame>,
}

impl Writer<'_, '_> {
    fn warn(&mut self, message: String) {
        let message = ConversionMessage::warning(message);
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            match block {
                Block::Paragraph(p) => self.paragraph(p),
                Block::Table(t) => self.table(t),
            }
        }
    }

    fn paragraph(&mut self, p: &Paragraph) {
        let inner = self.inlines(&p.inlines);
        if inner.is_empty() {
            return;
        }
        let list = p.numbering.as_ref().and_then(|n| {
            self.ctx
                .lists
                .is_ordered(n.num_id, n.level)
                .map(|ordered| (n.level, ordered))
        });
        match list {
            Some((level, ordered)) => self.list_item(level, ordered, &inner),
            None => {
                self.close_lists();
                let tag = self.paragraph_tag(p);
                let _ = write!(self.out, "<{tag}>{inner}</{tag}>");
            }
        }
    }

    fn paragraph_tag(&mut self, p: &Paragraph) -> &'static str {
        let Some(id) = p.style_id.as_deref() else {
            return "p";
        };
        let name = self.ctx.styles.paragraph_name(id).to_string();
        if let Some(level) = heading_level(id, &name) {
            return HEADINGS[level - 1];
        }
        if id.eq_ignore_ascii_case("title") || name.eq_ignore_ascii_case("title") {
            return "h1";
        }
        if !id.eq_ignore_ascii_case("normal") {
            self.warn(format!(
                "Unrecognised paragraph style: '{name}' (Style ID: {id})"
            ));
        }
        "p"
    }

    fn list_item(&mut self, level: usize, ordered: bool, inner: &str) {
        while self.lists.last().is_some_and(|f| f.level > level) {
            self.close_list();
        }
        if let Some(top) = self.lists.last().copied() {
            if top.level == level {
                if top.ordered == ordered {
                    self.out.push_str("</li>");
                } else {
                    self.close_list();
                }
            }
        }
        if self.lists.last().is_none_or(|f| f.level < level) {
            self.out.push_str(if ordered { "<ol>" } else { "<ul>" });
            self.lists.push(ListFrame { level, ordered });
        }
        self.out.push_str("<li>");
        self.out.push_str(inner);
    }

    fn close_list(&mut self) {
        if let Some(frame) = self.lists.pop() {
            self.out.push_str("</li>");
            self.out
                .push_str(if frame.ordered { "</ol>" } else { "</ul>" });
        }
    }

    fn close_lists(&mut self) {
        while !self.lists.is_empty() {
            self.close_list();
        }
    }

    /// Render `blocks` in isolation (table cells), with their own list state.
    fn nested(&mut self, blocks: &[Block]) -> String {
        let saved_out = std::mem::take(&mut self.out);
        let saved_lists = std::mem::take(&mut self.lists);
        self.blocks(blocks);
        self.close_lists();
        self.lists = saved_lists;
        std::mem::replace(&mut self.out, saved_out)
    }

    fn table(&mut self, table: &Table) {
        self.close_lists();
        let spans = row_spans(table);
        self.out.push_str("<table>");
        for (r, row) in table.rows.iter().enumerate() {
            self.out.push_str("<tr>");
            for (c, cell) in row.cells.iter().enumerate() {
                let Some(rowspan) = spans[r][c] else {
                    continue;
                };
                let inner = self.nested(&cell.blocks);
                self.out.push_str("<td");
                if cell.col_span > 1 {
                    let _ = write!(self.out, " colspan=\"{}\"", cell.col_span);
                }
                if rowspan > 1 {
                    let _ = write!(self.out, " rowspan=\"{rowspan}\"");
                }
                let _ = write!(self.out, ">{inner}</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }

    fn inlines(&mut self, inlines: &[Inline]) -> String {
        let mut out = String::new();
        let mut pending: Vec<&Run> = Vec::new();
        for inline in inlines {
            match inline {
                Inline::Run(run) => pending.push(run),
                Inline::Hyperlink(link) => {
                    out.push_str(&self.runs(&pending));
                    pending.clear();
                    self.hyperlink(link, &mut out);
                }
            }
        }
        out.push_str(&self.runs(&pending));
        out
    }

    fn hyperlink(&mut self, link: &Hyperlink, out: &mut String) {
        let runs: Vec<&Run> = link.runs.iter().collect();
        let inner = self.runs(&runs);
        if inner.is_empty() {
            return;
        }
        match &link.href {
            Some(href) => {
                let _ = write!(out, "<a href=\"{}\">{inner}</a>", escape_attr(href));
            }
            None => out.push_str(&inner),
        }
    }

    /// Consecutive runs with the same formatting share one set of tags.
    fn runs(&mut self, runs: &[&Run]) -> String {
        let mut out = String::new();
        let mut current: Option<Format> = None;
        let mut buf = String::new();
        for run in runs {
            let content = self.run_content(run);
            if content.is_empty() {
                continue;
            }
            let format = self.format(&run.props);
            if current != Some(format) {
                if let Some(f) = current {
                    out.push_str(&wrap(f, &buf));
                    buf.clear();
                }
                current = Some(format);
            }
            buf.push_str(&content);
        }
        if let Some(f) = current {
            out.push_str(&wrap(f, &buf));
        }
        out
    }

    fn format(&mut self, props: &RunProps) -> Format {
        let mut bold = props.bold;
        if let Some(id) = props.style_id.as_deref() {
            let name = self.ctx.styles.character_name(id).to_string();
            if name == STRONG_STYLE || id == STRONG_STYLE {
                bold = true;
            } else if !SILENT_CHARACTER_STYLES.contains(&id) {
                self.warn(format!("Unrecognised run style: '{name}' (Style ID: {id})"));
            }
        }
        Format {
            bold,
            italic: props.italic,
            strike: props.strike,
            vertical: props.vertical,
        }
    }

    fn run_content(&mut self, run: &Run) -> String {
        let images = self.ctx.images;
        let mut out = String::new();
        for content in &run.content {
            match content {
                RunContent::Text(text) => out.push_str(&escape_text(text)),
                RunContent::Tab => out.push('\t'),
                RunContent::Break => out.push_str("<br />"),
                RunContent::Image(image) => match images.get(&image.rel_id) {
                    Some(src) => {
                        let _ = write!(out, "<img src=\"{src}\" />");
                    }
                    None => self.warn(format!(
                        "Could not find image for relationship '{}'",
                        image.rel_id
                    )),
                },
            }
        }
        out
    }
}

fn heading_level(id: &str, name: &str) -> Option<usize> {
    let from_id = id.strip_prefix("Heading").and_then(|n| n.parse().ok());
    let from_name = || {
        name.to_ascii_lowercase()
            .strip_prefix("heading ")
            .and_then(|n| n.parse().ok())
    };
    from_id
        .or_else(from_name)
        .filter(|level: &usize| (1..=HEADINGS.len()).contains(level))
}

fn wrap(format: Format, inner: &str) -> String {
    let mut html = inner.to_string();
    match format.vertical {
        VerticalAlign::Superscript => html = format!("<sup>{html}</sup>"),
        VerticalAlign::Subscript => html = format!("<sub>{html}</sub>"),
        VerticalAlign::Baseline => {}
    }
    if format.strike {
        html = format!("<s>{html}</s>");
    }
    if format.italic {
        html = format!("<em>{html}</em>");
    }
    if format.bold {
        html = format!("<strong>{html}</strong>");
    }
    html
}

/// Per cell: `Some(rowspan)`, or `None` for cells absorbed by a vertical merge above.
fn row_spans(table: &Table) -> Vec<Vec<Option<usize>>> {
    let mut spans: Vec<Vec<Option<usize>>> = table
        .rows
        .iter()
        .map(|row| vec![Some(1); row.cells.len()])
        .collect();
    // grid column -> (row, cell) of the merge origin
    let mut open: HashMap<usize, (usize, usize)> = HashMap::new();

    for (r, row) in table.rows.iter().enumerate() {
        let mut col = 0;
        for (c, cell) in row.cells.iter().enumerate() {
            match cell.vertical_merge {
                VerticalMerge::Restart => {
                    open.insert(col, (r, c));
                }
                VerticalMerge::Continue => {
                    if let Some(&(origin_row, origin_cell)) = open.get(&col) {
                        if let Some(Some(n)) = spans[origin_row].get_mut(origin_cell) {
                            *n += 1;
                        }
                        spans[r][c] = None;
                    }
                }
                VerticalMerge::None => {
                    open.remove(&col);
                }
            }
            col += cell.col_span;
        }
    }
    spans
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
