use crate::graph::InMemoryGraph;
use crate::program::{compile, CompiledProgram};
use crate::scheduler::{SchedulerResult, SuperstepScheduler};
use crate::vertex::VertexState;
use accuflow_api::descriptor::ProgramDescriptor;
use accuflow_api::engine::EngineKind;
use accuflow_api::graph::GraphStore;
use accuflow_common::config::EngineOptions;
use accuflow_common::error::{AccuFlowError, AccuFlowResult};
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Opaque reference to a submitted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Running,
    Halted,
    Failed { message: String },
}

type RunOutput = AccuFlowResult<(InMemoryGraph, SchedulerResult)>;

struct JobSlot {
    status: ExecutionStatus,
    worker: Option<JoinHandle<RunOutput>>,
}

/// Runs a descriptor synchronously against any graph store. Structural
/// errors reject before the first superstep; on success the result snapshot
/// is already written into the graph.
pub fn run_program<G: GraphStore>(
    kind: EngineKind,
    graph: G,
    program: &JsonValue,
    options: &EngineOptions,
) -> AccuFlowResult<(G, SchedulerResult)> {
    let descriptor = ProgramDescriptor::from_json(program)?;
    let compiled = compile(&descriptor, options)?;
    tracing::info!(
        target: "accuflow::engine",
        engine = %kind,
        result_field = %compiled.result_field,
        phases = compiled.phases.len(),
        "program accepted"
    );
    run_compiled(&compiled, graph, options)
}

fn run_compiled<G: GraphStore>(
    compiled: &CompiledProgram,
    mut graph: G,
    options: &EngineOptions,
) -> AccuFlowResult<(G, SchedulerResult)> {
    let mut vertices: Vec<VertexState> = graph
        .vertices()
        .iter()
        .enumerate()
        .map(|(i, record)| VertexState::from_record(record, i as u64, &compiled.registry))
        .collect();

    let scheduler = SuperstepScheduler::new(compiled, options);
    let result = scheduler.run(&mut vertices, &graph)?;

    let snapshots = vertices
        .iter()
        .map(|v| (v.id.clone(), v.snapshot(&compiled.registry)))
        .collect();
    graph.write_results(&compiled.result_field, snapshots)?;

    tracing::info!(
        target: "accuflow::engine",
        supersteps = result.supersteps,
        deadline_hit = result.deadline_hit,
        "run halted"
    );
    Ok((graph, result))
}

/// The submission front: accepts a program, runs it on a background thread,
/// and tracks it in a handle table for polling.
pub struct Engine {
    options: EngineOptions,
    jobs: Arc<DashMap<u64, JobSlot>>,
    next_id: AtomicU64,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            jobs: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Validates and compiles now, so a bad descriptor never becomes a job,
    /// then runs the program in the background.
    pub fn submit(
        &self,
        kind: EngineKind,
        graph: InMemoryGraph,
        program: &JsonValue,
    ) -> AccuFlowResult<ExecutionHandle> {
        let descriptor = ProgramDescriptor::from_json(program)?;
        let compiled = compile(&descriptor, &self.options)?;
        tracing::info!(
            target: "accuflow::engine",
            engine = %kind,
            result_field = %compiled.result_field,
            phases = compiled.phases.len(),
            "program accepted"
        );

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.jobs.insert(
            id,
            JobSlot {
                status: ExecutionStatus::Running,
                worker: None,
            },
        );

        let jobs = Arc::clone(&self.jobs);
        let options = self.options.clone();
        let worker = std::thread::spawn(move || {
            let output = run_compiled(&compiled, graph, &options);
            let status = match &output {
                Ok(_) => ExecutionStatus::Halted,
                Err(e) => ExecutionStatus::Failed {
                    message: e.to_string(),
                },
            };
            if let Some(mut slot) = jobs.get_mut(&id) {
                slot.status = status;
            }
            output
        });

        if let Some(mut slot) = self.jobs.get_mut(&id) {
            slot.worker = Some(worker);
        }
        Ok(ExecutionHandle(id))
    }

    pub fn status(&self, handle: ExecutionHandle) -> AccuFlowResult<ExecutionStatus> {
        self.jobs
            .get(&handle.0)
            .map(|slot| slot.status.clone())
            .ok_or_else(|| AccuFlowError::InvalidArgument(format!("unknown execution {handle:?}")))
    }

    /// Blocks until the run finishes and returns the graph with results
    /// written, or the abort error. Each handle can be joined once.
    pub fn join(&self, handle: ExecutionHandle) -> RunOutput {
        let worker = self
            .jobs
            .get_mut(&handle.0)
            .ok_or_else(|| AccuFlowError::InvalidArgument(format!("unknown execution {handle:?}")))?
            .worker
            .take()
            .ok_or_else(|| {
                AccuFlowError::InvalidArgument(format!("execution {handle:?} already joined"))
            })?;
        worker
            .join()
            .map_err(|_| AccuFlowError::Internal("execution thread panicked".to_string()))?
    }
}
