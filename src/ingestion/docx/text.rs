//! Plain-text rendering: one line per paragraph, no formatting.

use super::model::{Block, Inline, Paragraph, Run, RunContent};

pub(crate) fn render(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    collect(blocks, &mut lines);

    let mut out = String::new();
    for line in lines.iter().flat_map(|l| l.split('\n')) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out.trim().to_string()
}

fn collect(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => lines.push(paragraph_text(p)),
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| &r.cells) {
                    collect(&cell.blocks, lines);
                }
            }
        }
    }
}

fn paragraph_text(p: &Paragraph) -> String {
    let mut out = String::new();
    for inline in &p.inlines {
        match inline {
            Inline::Run(run) => run_text(run, &mut out),
            Inline::Hyperlink(link) => {
                for run in &link.runs {
                    run_text(run, &mut out);
                }
            }
        }
    }
    out
}

fn run_text(run: &Run, out: &mut String) {
    for content in &run.content {
        match content {
            RunContent::Text(t) => out.push_str(t),
            RunContent::Tab => out.push('\t'),
            RunContent::Break => out.push('\n'),
            RunContent::Image(_) => {}
        }
    }
}
