pub mod analysis;
pub mod item;
pub mod money;
pub mod receipt;

pub use analysis::{CategoryBucket, SpendingAnalysis};
pub use item::{ReceiptLineItem, DEFAULT_CONFIDENCE, UNCATEGORIZED};
pub use money::{parse_amount, round_cents, round_dp};
pub use receipt::{Receipt, ReceiptDraft};
