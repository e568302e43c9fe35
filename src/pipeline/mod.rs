pub mod assembler;
pub mod comparer;
pub mod controller;
pub mod extractor;
pub mod fanout;
pub mod gate;
pub mod llm_completion;
pub mod mock;
pub mod prompts;
pub mod responses;
pub mod retriever;
pub mod tavily;
pub mod traits;

pub use assembler::{assemble_verdict, select_best, Assembled};
pub use comparer::compare_sources;
pub use controller::{Pipeline, PipelineOptions, RunReport, RunState, Stage};
pub use extractor::extract_claim;
pub use fanout::{bounded_fan_out, cancel_pair, CancelHandle, CancelToken};
pub use gate::gate_candidates;
pub use llm_completion::LlmCompletion;
pub use mock::{ScriptedCompletion, StaticSearch};
pub use retriever::retrieve_candidates;
pub use tavily::TavilySearch;
pub use traits::{
    complete_structured, CompletionRequest, CompletionService, SearchDepth, SearchHit,
    SearchProvider, SearchQuery,
};
