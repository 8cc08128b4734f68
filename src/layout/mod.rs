pub mod block;
pub mod edit;
pub mod grid;
pub mod parse;
pub mod signature;
pub mod xlsx;

pub use block::{BlockState, Mode, WeekBlock, BLOCK_ROWS, BLOCK_STRIDE};
pub use edit::EditableWorkbook;
pub use grid::{Sheet, Workbook};
pub use parse::{find_blocks, ParsedBlock};
pub use signature::Signature;
pub use xlsx::{load, load_bytes, save, to_bytes};
