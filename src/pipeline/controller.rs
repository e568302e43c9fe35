use crate::config::Settings;
use crate::models::{Assessment, Candidate, Evidence, Extraction, InputText, RunId, Verdict};
use crate::pipeline::assembler::{assemble_verdict, verdict_for_failed_extraction, Assembled};
use crate::pipeline::comparer::compare_sources;
use crate::pipeline::extractor::{extract_claim, DEFAULT_EXTRACTION_FAILURE};
use crate::pipeline::fanout::CancelToken;
use crate::pipeline::gate::gate_candidates;
use crate::pipeline::retriever::retrieve_candidates;
use crate::pipeline::traits::{CompletionService, SearchDepth, SearchProvider, SearchQuery};
use serde::Serialize;
use std::fmt::Display;
use tracing::Instrument;

#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub max_concurrency: usize,
    pub max_results: u32,
    pub search_depth: SearchDepth,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
            max_results: crate::config::DEFAULT_MAX_RESULTS,
            search_depth: SearchDepth::Advanced,
        }
    }
}

impl From<&Settings> for PipelineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            max_concurrency: settings.max_concurrency,
            max_results: settings.tavily_max_results,
            search_depth: settings.tavily_search_depth,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Retrieving,
    Filtering,
    Comparing,
    Assembling,
    Done,
}

/// Accumulator owned by a single run. Never shared across runs.
#[derive(Debug)]
pub struct RunState {
    pub run_id: RunId,
    pub input: InputText,
    pub origin_url: Option<String>,
    pub extraction: Option<Extraction>,
    pub search_query: Option<String>,
    pub candidates: Vec<Candidate>,
    pub evidence: Vec<Evidence>,
    pub assessments: Vec<Assessment>,
    pub verdict: Option<Verdict>,
    pub errors: Vec<String>,
}

impl RunState {
    fn new(input: InputText, origin_url: Option<String>) -> Self {
        Self {
            run_id: RunId::new(),
            input,
            origin_url,
            extraction: None,
            search_query: None,
            candidates: Vec::new(),
            evidence: Vec::new(),
            assessments: Vec::new(),
            verdict: None,
            errors: Vec::new(),
        }
    }

    fn record_error(&mut self, stage: &str, error: impl Display) {
        tracing::error!(stage, error = %error, "stage failed");
        self.errors.push(format!("{stage}: {error}"));
    }

    fn claim_text(&self) -> Option<String> {
        self.extraction
            .as_ref()
            .and_then(Extraction::claim)
            .map(|c| c.text.clone())
    }
}

/// What a run hands back: the verdict plus the non-fatal error log.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub search_query: Option<String>,
    pub verdict: Verdict,
    pub errors: Vec<String>,
}

pub struct Pipeline<C, S>
where
    C: CompletionService,
    S: SearchProvider,
{
    pub completion: C,
    pub search: S,
    pub options: PipelineOptions,
}

impl<C, S> Pipeline<C, S>
where
    C: CompletionService,
    S: SearchProvider,
{
    pub fn new(completion: C, search: S, options: PipelineOptions) -> Self {
        Self {
            completion,
            search,
            options,
        }
    }

    /// Runs the full pipeline and returns only the verdict. Never fails.
    pub async fn run_verification(&self, input: InputText, origin_url: Option<&str>) -> Verdict {
        self.run(input, origin_url, &CancelToken::never()).await.verdict
    }

    pub async fn run(
        &self,
        input: InputText,
        origin_url: Option<&str>,
        cancel: &CancelToken,
    ) -> RunReport {
        let state = RunState::new(input, origin_url.map(str::to_string));
        let span = tracing::info_span!("verification", run_id = %state.run_id);
        let state = self.drive(state, cancel).instrument(span).await;

        let verdict = match state.verdict {
            Some(verdict) => verdict,
            None => Verdict::not_found(
                state.claim_text().unwrap_or_default(),
                "The run ended without producing a verdict.",
            ),
        };
        RunReport {
            run_id: state.run_id,
            search_query: state.search_query,
            verdict,
            errors: state.errors,
        }
    }

    async fn drive(&self, mut state: RunState, cancel: &CancelToken) -> RunState {
        tracing::info!(
            chars = state.input.char_len(),
            origin = state.origin_url.is_some(),
            "processing input"
        );
        let limit = self.options.max_concurrency.max(1);
        let mut stage = Stage::Extracting;

        while stage != Stage::Done {
            tracing::debug!(?stage, "entering stage");
            stage = match stage {
                Stage::Extracting => {
                    let extraction = match extract_claim(&self.completion, &state.input, cancel).await {
                        Ok(extraction) => extraction,
                        Err(e) => {
                            state.record_error("Claim extraction", &e);
                            Extraction::Failed {
                                reason: e.to_string(),
                            }
                        }
                    };
                    let next = if extraction.is_failed() {
                        Stage::Assembling
                    } else {
                        Stage::Retrieving
                    };
                    state.extraction = Some(extraction);
                    next
                }
                Stage::Retrieving => {
                    if let Some(text) = state.claim_text() {
                        let query = SearchQuery {
                            text,
                            max_results: self.options.max_results,
                            depth: self.options.search_depth,
                        };
                        state.search_query = Some(query.text.clone());
                        match retrieve_candidates(
                            &self.search,
                            &query,
                            state.origin_url.as_deref(),
                            cancel,
                        )
                        .await
                        {
                            Ok(candidates) => state.candidates = candidates,
                            Err(e) => state.record_error("Source retrieval", e),
                        }
                    }
                    Stage::Filtering
                }
                Stage::Filtering => {
                    if let Some(text) = state.claim_text() {
                        let candidates = std::mem::take(&mut state.candidates);
                        state.evidence =
                            gate_candidates(&self.completion, &text, candidates, limit, cancel).await;
                    }
                    Stage::Comparing
                }
                Stage::Comparing => {
                    if let Some(text) = state.claim_text() {
                        let evidence = std::mem::take(&mut state.evidence);
                        state.assessments =
                            compare_sources(&self.completion, &text, evidence, limit, cancel).await;
                    }
                    Stage::Assembling
                }
                Stage::Assembling => {
                    let assessments = std::mem::take(&mut state.assessments);
                    let assembled = match &state.extraction {
                        Some(Extraction::Claimed(claim)) => {
                            assemble_verdict(&self.completion, claim, assessments, cancel).await
                        }
                        Some(Extraction::Failed { reason }) => Assembled {
                            verdict: verdict_for_failed_extraction(reason),
                            error: None,
                        },
                        None => Assembled {
                            verdict: verdict_for_failed_extraction(DEFAULT_EXTRACTION_FAILURE),
                            error: None,
                        },
                    };
                    if let Some(e) = assembled.error {
                        state.record_error("Attribution assembly", e);
                    }
                    tracing::info!(relation = ?assembled.verdict.relation, "run complete");
                    state.verdict = Some(assembled.verdict);
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }
        state
    }
}
