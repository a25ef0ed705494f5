use crate::evaluator::EvalContext;
use crate::program::ast::{CompiledPhase, Program};
use crate::program::CompiledProgram;
use crate::router::{self, AccumulatorMessage};
use crate::vertex::VertexState;
use accuflow_api::graph::GraphStore;
use accuflow_common::config::EngineOptions;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use accuflow_common::value::Value;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub name: String,
    /// Update rounds this phase ran; its init round is not counted.
    pub supersteps: u64,
}

#[derive(Debug, Clone)]
pub struct SchedulerResult {
    /// Update rounds executed across all phases, the quantity `maxGSS`
    /// bounds.
    pub supersteps: u64,
    /// Per-phase statistics in execution order.
    pub phases: Vec<PhaseStats>,
    /// Set when the run stopped at the superstep limit in best-effort mode.
    pub deadline_hit: bool,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Init,
    Running { phase: usize, superstep: u64 },
    PhaseConverged { phase: usize },
    Halted,
}

/// The BSP control loop: one init round per phase, then update rounds until
/// the active set empties, phases strictly in declaration order, the whole
/// run bounded by `maxGSS` update rounds.
pub struct SuperstepScheduler<'a> {
    program: &'a CompiledProgram,
    options: &'a EngineOptions,
}

impl<'a> SuperstepScheduler<'a> {
    pub fn new(program: &'a CompiledProgram, options: &'a EngineOptions) -> Self {
        Self { program, options }
    }

    pub fn run<G: GraphStore>(
        &self,
        vertices: &mut [VertexState],
        graph: &G,
    ) -> AccuFlowResult<SchedulerResult> {
        let index: HashMap<String, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id.clone(), i))
            .collect();

        let mut phase_stats: Vec<PhaseStats> = Vec::new();
        let mut supersteps: u64 = 0;
        let mut deadline_hit = false;
        let mut state = State::Init;

        loop {
            state = match state {
                State::Init => State::Running {
                    phase: 0,
                    superstep: 0,
                },
                State::Running { phase, superstep } => {
                    let compiled_phase = &self.program.phases[phase];
                    if superstep == 0 {
                        tracing::debug!(
                            target: "accuflow::scheduler",
                            phase = %compiled_phase.name,
                            "phase init"
                        );
                        phase_stats.push(PhaseStats {
                            name: compiled_phase.name.clone(),
                            supersteps: 0,
                        });
                        let active = self.round(
                            vertices,
                            graph,
                            &index,
                            compiled_phase,
                            &compiled_phase.init,
                            true,
                            supersteps,
                        )?;
                        // A no-op update program can never move the phase
                        // forward, so it converges right after init.
                        if active == 0 || matches!(compiled_phase.update, Program::NoOp) {
                            State::PhaseConverged { phase }
                        } else {
                            State::Running {
                                phase,
                                superstep: 1,
                            }
                        }
                    } else if supersteps + 1 > self.program.max_gss {
                        if self.options.deadline_best_effort {
                            tracing::warn!(
                                target: "accuflow::scheduler",
                                max_gss = self.program.max_gss,
                                "superstep limit reached; halting with partial state"
                            );
                            deadline_hit = true;
                            State::Halted
                        } else {
                            return Err(AccuFlowError::DeadlineExceeded {
                                max_gss: self.program.max_gss,
                            });
                        }
                    } else {
                        let active = self.round(
                            vertices,
                            graph,
                            &index,
                            compiled_phase,
                            &compiled_phase.update,
                            false,
                            supersteps,
                        )?;
                        supersteps += 1;
                        if let Some(stats) = phase_stats.last_mut() {
                            stats.supersteps += 1;
                        }
                        if active == 0 {
                            State::PhaseConverged { phase }
                        } else {
                            State::Running {
                                phase,
                                superstep: superstep + 1,
                            }
                        }
                    }
                }
                State::PhaseConverged { phase } => {
                    tracing::debug!(
                        target: "accuflow::scheduler",
                        phase = %self.program.phases[phase].name,
                        "phase converged"
                    );
                    if phase + 1 < self.program.phases.len() {
                        State::Running {
                            phase: phase + 1,
                            superstep: 0,
                        }
                    } else {
                        State::Halted
                    }
                }
                State::Halted => {
                    return Ok(SchedulerResult {
                        supersteps,
                        phases: phase_stats,
                        deadline_hit,
                    });
                }
            };
        }
    }

    /// One synchronized round: evaluate (init rounds run everyone, update
    /// rounds only the active set), then merge every emitted message before
    /// returning. Returns the size of the next active set.
    #[allow(clippy::too_many_arguments)]
    fn round<G: GraphStore>(
        &self,
        vertices: &mut [VertexState],
        graph: &G,
        index: &HashMap<String, usize>,
        phase: &CompiledPhase,
        program: &Program,
        run_all: bool,
        global_superstep: u64,
    ) -> AccuFlowResult<usize> {
        let start = Instant::now();
        let messages: Vec<AccumulatorMessage> = match program {
            Program::NoOp => {
                for v in vertices.iter_mut() {
                    v.active = false;
                }
                Vec::new()
            }
            Program::Run(expr) => {
                let registry = &self.program.registry;
                let bindings = &self.program.bindings;
                let missing_fatal = self.options.missing_attribute_fatal;
                let phase_name = phase.name.as_str();

                let outboxes = vertices
                    .par_iter_mut()
                    .map(|v| {
                        if !run_all && !v.active {
                            return Ok(Vec::new());
                        }
                        let (result, outbox) = {
                            let mut ctx = EvalContext::new(
                                &v.id,
                                v.unique_id,
                                &mut v.accumulators,
                                registry,
                                graph.outbound_edges(&v.id),
                                bindings,
                                global_superstep,
                                missing_fatal,
                            );
                            let result = ctx.evaluate(expr);
                            (result, ctx.outbox)
                        };
                        let value = result
                            .map_err(|e| e.in_vertex(&v.id, phase_name, global_superstep))?;
                        v.active = match value {
                            Value::Bool(b) => b,
                            other => {
                                tracing::warn!(
                                    target: "accuflow::scheduler",
                                    vertex = %v.id,
                                    phase = %phase_name,
                                    result = %other,
                                    "program did not end in a boolean vote; voting halt"
                                );
                                false
                            }
                        };
                        Ok(outbox)
                    })
                    .collect::<AccuFlowResult<Vec<_>>>()?;
                outboxes.into_iter().flatten().collect()
            }
        };

        router::route(messages, vertices, index, &self.program.registry)?;
        let active = vertices.iter().filter(|v| v.active).count();

        metrics::counter!("accuflow_scheduler_rounds_total").increment(1);
        metrics::histogram!("accuflow_scheduler_round_ms")
            .record(start.elapsed().as_millis() as f64);
        Ok(active)
    }
}
