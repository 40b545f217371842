//! Maps the tree produced by `docx_rs::read_docx` onto the block model the renderers walk.
//!
//! A few `docx-rs` property types keep their values private (bold/italic flags, style names,
//! cell spans). Flags are compared against the values the reader constructs; names and spans are
//! read back from the types' `Serialize` output.

use std::collections::HashMap;

use docx_rs::{
    Bold, Break, BreakType, DocumentChild, Docx, DrawingData, HyperlinkData, InsertChild, Italic,
    Name, Numberings, ParagraphChild, RunChild, StyleType, Styles, TableCellContent,
    TableCellProperty, TableChild, TableRowChild, VertAlign, VertAlignType,
};
use serde_json::Value;

use super::model::{
    Block, Hyperlink, ImageRef, Inline, NumberingRef, Paragraph, Run, RunContent, RunProps, Table,
    TableCell, TableRow, VerticalAlign, VerticalMerge,
};

/// A decoded document: body blocks plus the lookups markup rendering needs.
pub(crate) struct ReadDocument {
    pub blocks: Vec<Block>,
    pub styles: StyleNames,
    pub lists: ListFormats,
    /// Relationship id -> (part path, bytes).
    pub images: HashMap<String, (String, Vec<u8>)>,
}

impl ReadDocument {
    pub fn from_docx(docx: Docx) -> Self {
        let links: HashMap<&str, &str> = docx
            .hyperlinks
            .iter()
            .map(|(id, target, _)| (id.as_str(), target.as_str()))
            .collect();
        let reader = BodyReader { links: &links };
        let blocks = docx
            .document
            .children
            .iter()
            .filter_map(|child| reader.document_child(child))
            .collect();
        let styles = StyleNames::new(&docx.styles);
        let lists = ListFormats::new(&docx.numberings);

        let images = docx
            .images
            .into_iter()
            .map(|(id, path, image, _)| (id, (path, image.0)))
            .collect();

        Self {
            blocks,
            styles,
            lists,
            images,
        }
    }
}

/// Display names of paragraph and character styles, keyed by style id.
#[derive(Debug, Clone, Default)]
pub(crate) struct StyleNames {
    paragraph: HashMap<String, String>,
    character: HashMap<String, String>,
}

impl StyleNames {
    fn new(styles: &Styles) -> Self {
        let mut names = Self::default();
        for style in &styles.styles {
            let name = display_name(&style.name).unwrap_or_else(|| style.style_id.clone());
            let table = match style.style_type {
                StyleType::Paragraph => &mut names.paragraph,
                StyleType::Character => &mut names.character,
                _ => continue,
            };
            table.insert(style.style_id.clone(), name);
        }
        names
    }

    /// Display name of a paragraph style, the id itself when undeclared.
    pub fn paragraph_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.paragraph.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn character_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.character.get(id).map(String::as_str).unwrap_or(id)
    }
}

fn display_name(name: &Name) -> Option<String> {
    match serde_json::to_value(name) {
        Ok(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Whether each defined list level is numbered, keyed by `(numId, ilvl)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListFormats {
    ordered: HashMap<(usize, usize), bool>,
}

impl ListFormats {
    fn new(numberings: &Numberings) -> Self {
        let abstracts: HashMap<usize, _> = numberings
            .abstract_nums
            .iter()
            .map(|abstract_num| (abstract_num.id, abstract_num))
            .collect();
        let mut ordered = HashMap::new();
        for num in &numberings.numberings {
            let Some(abstract_num) = abstracts.get(&num.abstract_num_id) else {
                continue;
            };
            for level in &abstract_num.levels {
                ordered.insert((num.id, level.level), level.format.val != "bullet");
            }
        }
        Self { ordered }
    }

    /// `Some(true)` for a numbered level, `Some(false)` for bullets, `None` when undefined.
    pub fn is_ordered(&self, num_id: usize, level: usize) -> Option<bool> {
        self.ordered.get(&(num_id, level)).copied()
    }

    #[cfg(test)]
    pub(crate) fn with_level(mut self, num_id: usize, level: usize, ordered: bool) -> Self {
        self.ordered.insert((num_id, level), ordered);
        self
    }
}

struct BodyReader<'a> {
    /// Hyperlink relationship id -> target.
    links: &'a HashMap<&'a str, &'a str>,
}

impl BodyReader<'_> {
    fn document_child(&self, child: &DocumentChild) -> Option<Block> {
        match child {
            DocumentChild::Paragraph(p) => Some(Block::Paragraph(self.paragraph(p))),
            DocumentChild::Table(t) => Some(Block::Table(self.table(t))),
            _ => None,
        }
    }

    fn paragraph(&self, p: &docx_rs::Paragraph) -> Paragraph {
        let numbering = p.property.numbering_property.as_ref().and_then(|n| {
            let num_id = n.id.as_ref()?.id;
            // numId 0 switches numbering off.
            (num_id != 0).then(|| NumberingRef {
                num_id,
                level: n.level.as_ref().map_or(0, |l| l.val),
            })
        });
        let mut inlines = Vec::new();
        for child in &p.children {
            self.paragraph_child(child, &mut inlines);
        }
        Paragraph {
            style_id: p.property.style.as_ref().map(|s| s.val.clone()),
            numbering,
            inlines,
        }
    }

    fn paragraph_child(&self, child: &ParagraphChild, out: &mut Vec<Inline>) {
        match child {
            ParagraphChild::Run(run) => out.push(Inline::Run(read_run(run))),
            ParagraphChild::Insert(insert) => {
                for child in &insert.children {
                    if let InsertChild::Run(run) = child {
                        out.push(Inline::Run(read_run(run)));
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => out.push(Inline::Hyperlink(self.hyperlink(link))),
            _ => {}
        }
    }

    fn hyperlink(&self, link: &docx_rs::Hyperlink) -> Hyperlink {
        let href = match &link.link {
            HyperlinkData::External { rid, .. } => {
                self.links.get(rid.as_str()).map(|target| target.to_string())
            }
            HyperlinkData::Anchor { anchor } => Some(format!("#{anchor}")),
        };
        let mut inlines = Vec::new();
        for child in &link.children {
            self.paragraph_child(child, &mut inlines);
        }
        let runs = inlines
            .into_iter()
            .flat_map(|inline| match inline {
                Inline::Run(run) => vec![run],
                Inline::Hyperlink(nested) => nested.runs,
            })
            .collect();
        Hyperlink { href, runs }
    }

    fn table(&self, table: &docx_rs::Table) -> Table {
        let rows = table
            .rows
            .iter()
            .map(|TableChild::TableRow(row)| TableRow {
                cells: row
                    .cells
                    .iter()
                    .map(|TableRowChild::TableCell(cell)| self.cell(cell))
                    .collect(),
            })
            .collect();
        Table { rows }
    }

    fn cell(&self, cell: &docx_rs::TableCell) -> TableCell {
        let (col_span, vertical_merge) = cell_layout(&cell.property);
        let blocks = cell
            .children
            .iter()
            .filter_map(|content| match content {
                TableCellContent::Paragraph(p) => Some(Block::Paragraph(self.paragraph(p))),
                TableCellContent::Table(t) => Some(Block::Table(self.table(t))),
                _ => None,
            })
            .collect();
        TableCell {
            col_span,
            vertical_merge,
            blocks,
        }
    }
}

fn read_run(run: &docx_rs::Run) -> Run {
    let rp = &run.run_property;
    let vertical = match &rp.vert_align {
        Some(v) if *v == VertAlign::new(VertAlignType::SuperScript) => VerticalAlign::Superscript,
        Some(v) if *v == VertAlign::new(VertAlignType::SubScript) => VerticalAlign::Subscript,
        _ => VerticalAlign::Baseline,
    };
    let props = RunProps {
        bold: rp.bold.as_ref().is_some_and(|b| *b == Bold::new()),
        italic: rp.italic.as_ref().is_some_and(|i| *i == Italic::new()),
        strike: rp.strike.as_ref().is_some_and(|s| s.val),
        vertical,
        style_id: rp.style.as_ref().map(|s| s.val.clone()),
    };

    let line_break = Break::new(BreakType::TextWrapping);
    let content = run
        .children
        .iter()
        .filter_map(|child| match child {
            RunChild::Text(t) => Some(RunContent::Text(t.text.clone())),
            RunChild::Tab(_) => Some(RunContent::Tab),
            // Page and column breaks have no markup counterpart.
            RunChild::Break(b) if *b == line_break => Some(RunContent::Break),
            RunChild::Drawing(drawing) => match &drawing.data {
                Some(DrawingData::Pic(pic)) if !pic.id.is_empty() => {
                    Some(RunContent::Image(ImageRef {
                        rel_id: pic.id.clone(),
                    }))
                }
                _ => None,
            },
            _ => None,
        })
        .collect();

    Run { props, content }
}

/// `(gridSpan, vMerge)` of a cell.
fn cell_layout(property: &TableCellProperty) -> (usize, VerticalMerge) {
    let value = serde_json::to_value(property).unwrap_or(Value::Null);
    let col_span = value
        .get("gridSpan")
        .and_then(Value::as_u64)
        .map_or(1, |span| usize::try_from(span).unwrap_or(1).max(1));
    let vertical_merge = match value.get("verticalMerge").and_then(Value::as_str) {
        Some("restart") => VerticalMerge::Restart,
        Some("continue") => VerticalMerge::Continue,
        _ => VerticalMerge::None,
    };
    (col_span, vertical_merge)
}
