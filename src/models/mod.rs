pub mod candidate;
pub mod claim;
pub mod evidence;
pub mod ids;
pub mod input;
pub mod verdict;

pub use candidate::Candidate;
pub use claim::{Claim, Confidence, Extraction};
pub use evidence::{Assessment, Evidence, SourceRelation, SourceType, MIN_QUOTE_CHARS};
pub use ids::RunId;
pub use input::{InputText, MAX_INPUT_CHARS, MIN_INPUT_CHARS};
pub use verdict::{clip_summary, Relation, Verdict, MAX_SUMMARY_CHARS};
