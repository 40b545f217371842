//! Document content in the shape the renderers walk.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Paragraph {
    pub style_id: Option<String>,
    pub numbering: Option<NumberingRef>,
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumberingRef {
    pub num_id: usize,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hyperlink {
    /// Resolved target: an external URL or `#bookmark`. `None` when the relationship is missing.
    pub href: Option<String>,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Run {
    pub props: RunProps,
    pub content: Vec<RunContent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum VerticalAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RunProps {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub vertical: VerticalAlign,
    pub style_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RunContent {
    Text(String),
    Tab,
    Break,
    Image(ImageRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageRef {
    pub rel_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum VerticalMerge {
    #[default]
    None,
    Restart,
    Continue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableCell {
    pub col_span: usize,
    pub vertical_merge: VerticalMerge,
    pub blocks: Vec<Block>,
}

impl Block {
    /// Relationship ids of every image, in document order.
    pub fn image_rel_ids<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Block::Paragraph(p) => {
                for inline in &p.inlines {
                    let runs: &[Run] = match inline {
                        Inline::Run(run) => std::slice::from_ref(run),
                        Inline::Hyperlink(link) => &link.runs,
                    };
                    for run in runs {
                        for content in &run.content {
                            if let RunContent::Image(image) = content {
                                out.push(&image.rel_id);
                            }
                        }
                    }
                }
            }
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| &r.cells) {
                    for block in &cell.blocks {
                        block.image_rel_ids(out);
                    }
                }
            }
        }
    }
}
