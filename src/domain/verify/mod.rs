pub mod claim_index;

pub use claim_index::{decode_claim, decode_event, ClaimIndex};
