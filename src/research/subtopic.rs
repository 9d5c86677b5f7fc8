//! Per-subtopic research loop.
//!
//! ```text
//! GENERATING ──queries──▶ COLLECTING ──▶ ASSESSING ──sufficient──▶ DONE
//!     │  ▲                                   │
//!     │  └──────────── REFINING ◀──gaps──────┘ (iteration < max_loops)
//!     └──no usable queries──▶ DONE
//! ```
//!
//! Every insufficient pass through ASSESSING (or a generation call with no
//! signal) increments `iteration`, which therefore never exceeds `max_loops`.

use crate::research::collector::EvidenceCollector;
use crate::research::events::{ResearchEvent, SharedSink};
use crate::research::model::ResearchModel;
use crate::research::with_timeout;
use crate::types::{SubtopicState, TerminationReason};
use crate::utils::toml_config::ResearchConfig;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Generating,
    Collecting,
    Assessing,
    Refining,
    Done,
}

#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub max_loops: u32,
    /// Pause between iterations
    pub iteration_delay: Duration,
    pub call_timeout: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::from(&ResearchConfig::default())
    }
}

impl From<&ResearchConfig> for LoopSettings {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            max_loops: config.max_loops,
            iteration_delay: config.iteration_delay(),
            call_timeout: config.call_timeout(),
        }
    }
}

/// Drives one subtopic from its first query batch to a terminal state.
pub struct SubtopicResearchLoop {
    collector: Arc<EvidenceCollector>,
    model: Arc<dyn ResearchModel>,
    settings: LoopSettings,
    events: SharedSink,
}

impl SubtopicResearchLoop {
    pub fn new(
        collector: Arc<EvidenceCollector>,
        model: Arc<dyn ResearchModel>,
        settings: LoopSettings,
        events: SharedSink,
    ) -> Self {
        Self {
            collector,
            model,
            settings,
            events,
        }
    }

    /// Research `subtopic` until a termination condition holds.
    ///
    /// Always returns a terminated state. External failures only shorten the
    /// run or leave it with less evidence.
    pub async fn run(&self, subtopic: &str) -> SubtopicState {
        let mut state = SubtopicState::new(subtopic);
        let mut batch: Vec<String> = Vec::new();
        let mut phase = LoopPhase::Generating;

        self.events.emit(&ResearchEvent::SubtopicStarted {
            subtopic: subtopic.to_string(),
            max_loops: self.settings.max_loops,
        });

        if self.settings.max_loops == 0 {
            state.terminate(TerminationReason::MaxIterations);
            phase = LoopPhase::Done;
        }

        while phase != LoopPhase::Done {
            phase = match phase {
                LoopPhase::Generating => match self.generate(&state).await {
                    Some(queries) if queries.is_empty() => {
                        state.terminate(TerminationReason::NoQueriesProduced);
                        LoopPhase::Done
                    }
                    Some(queries) => {
                        batch = queries;
                        LoopPhase::Collecting
                    }
                    None => self.advance(&mut state),
                },
                LoopPhase::Collecting => {
                    let items = self
                        .collector
                        .collect(&batch, subtopic, &mut state.history)
                        .await;
                    state.accepted_evidence.extend(items);
                    LoopPhase::Assessing
                }
                LoopPhase::Assessing => self.assess(&mut state).await,
                LoopPhase::Refining => {
                    tokio::time::sleep(self.settings.iteration_delay).await;
                    LoopPhase::Generating
                }
                LoopPhase::Done => LoopPhase::Done,
            };
        }

        self.events.emit(&ResearchEvent::SubtopicFinished {
            subtopic: subtopic.to_string(),
            iterations: state.iteration,
            evidence: state.accepted_evidence.len(),
            reason: state
                .termination_reason
                .unwrap_or(TerminationReason::MaxIterations),
        });

        state
    }

    /// Usable queries for the next batch, or `None` when the model gave no signal.
    ///
    /// Queries that were already issued for this subtopic are not usable.
    async fn generate(&self, state: &SubtopicState) -> Option<Vec<String>> {
        let plan = with_timeout(
            self.settings.call_timeout,
            self.model.generate_queries(
                &state.subtopic,
                &state.knowledge_gaps,
                state.history.issued_queries(),
            ),
        )
        .await;

        match plan {
            Ok(plan) => {
                let queries: Vec<String> = plan
                    .queries
                    .into_iter()
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty() && !state.history.has_query(q))
                    .collect();

                self.events.emit(&ResearchEvent::QueriesGenerated {
                    subtopic: state.subtopic.clone(),
                    iteration: state.iteration,
                    queries: queries.clone(),
                    rationale: plan.operator_rationale.map(|r| match r {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    }),
                    knowledge_gaps: plan.knowledge_gaps,
                });
                Some(queries)
            }
            Err(e) => {
                self.events.emit(&ResearchEvent::NoSignal {
                    subtopic: state.subtopic.clone(),
                    stage: "generate_queries",
                    error: e.to_string(),
                });
                None
            }
        }
    }

    async fn assess(&self, state: &mut SubtopicState) -> LoopPhase {
        let verdict = with_timeout(
            self.settings.call_timeout,
            self.model.assess(&state.subtopic, &state.accepted_evidence),
        )
        .await;

        match verdict {
            Ok(verdict) => {
                self.events.emit(&ResearchEvent::Assessed {
                    subtopic: state.subtopic.clone(),
                    iteration: state.iteration,
                    sufficient: verdict.sufficient,
                    knowledge_gaps: verdict.missing_info.clone(),
                });
                if verdict.sufficient {
                    state.terminate(TerminationReason::Sufficient);
                    return LoopPhase::Done;
                }
                state.knowledge_gaps = verdict.missing_info;
            }
            Err(e) => {
                // Gaps from the previous assessment stay in place.
                self.events.emit(&ResearchEvent::NoSignal {
                    subtopic: state.subtopic.clone(),
                    stage: "assess",
                    error: e.to_string(),
                });
            }
        }

        self.advance(state)
    }

    /// Close an insufficient iteration.
    fn advance(&self, state: &mut SubtopicState) -> LoopPhase {
        state.iteration += 1;
        if state.iteration >= self.settings.max_loops {
            state.terminate(TerminationReason::MaxIterations);
            LoopPhase::Done
        } else {
            LoopPhase::Refining
        }
    }
}
