use super::blocks::Block;

/// A non-empty run of contiguous non-blank blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.paragraphs.iter().flat_map(|p| &p.blocks)
    }
}

/// Group a block stream into paragraphs, using runs of `Blank` as separators.
pub fn assemble(blocks: Vec<Block>) -> Document {
    let mut paragraphs = Vec::new();
    let mut current: Vec<Block> = Vec::new();

    for block in blocks {
        if block.is_blank() {
            if !current.is_empty() {
                paragraphs.push(Paragraph {
                    blocks: std::mem::take(&mut current),
                });
            }
            continue;
        }
        current.push(block);
    }

    if !current.is_empty() {
        paragraphs.push(Paragraph { blocks: current });
    }

    Document { paragraphs }
}
