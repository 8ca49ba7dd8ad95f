/// String chunk granularity, ordered from finest to coarsest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ChunkExprType {
    Char = 1,
    Word = 2,
    Item = 3,
    Line = 4,
}

impl ChunkExprType {
    pub fn name(self) -> &'static str {
        match self {
            ChunkExprType::Char => "char",
            ChunkExprType::Word => "word",
            ChunkExprType::Item => "item",
            ChunkExprType::Line => "line",
        }
    }
}
