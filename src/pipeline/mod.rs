//! Stage orchestration. Stages run in dependency order and each commits its
//! final chunk before the next stage is allowed to start, so every stage can
//! rely on its prerequisites being fully visible in the warehouse.

mod stages;

use crate::config::AppConfig;
use crate::error::EtlError;
use crate::warehouse::{Table, WarehouseStore};
use clap::ValueEnum;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// What to do when a single source row fails normalization or parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RowErrorPolicy {
    /// Count the row as failed and keep going.
    #[default]
    Skip,
    /// Fail the stage on the first bad row.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Committed,
    Failed,
}

pub struct StageDef {
    pub name: &'static str,
    pub prerequisites: &'static [&'static str],
}

pub const STAGES: &[StageDef] = &[
    StageDef {
        name: "reference_data",
        prerequisites: &[],
    },
    StageDef {
        name: "titles",
        prerequisites: &["reference_data"],
    },
    StageDef {
        name: "people",
        prerequisites: &["reference_data"],
    },
    StageDef {
        name: "principals",
        prerequisites: &["titles", "people"],
    },
    StageDef {
        name: "crew",
        prerequisites: &["titles", "people"],
    },
    StageDef {
        name: "episodes",
        prerequisites: &["titles"],
    },
    StageDef {
        name: "awards",
        prerequisites: &["titles", "people"],
    },
    StageDef {
        name: "ratings",
        prerequisites: &["titles", "episodes", "principals", "crew"],
    },
];

#[derive(Debug)]
pub struct StageResult {
    pub name: &'static str,
    pub status: StageStatus,
    pub rows_written: BTreeMap<Table, usize>,
    pub rows_failed: usize,
    pub elapsed: Duration,
}

impl StageResult {
    pub fn total_written(&self) -> usize {
        self.rows_written.values().sum()
    }
}

pub struct Pipeline {
    store: WarehouseStore,
    config: AppConfig,
    committed: BTreeSet<&'static str>,
    failed: BTreeSet<&'static str>,
    running: Option<&'static str>,
}

impl Pipeline {
    pub fn new(store: WarehouseStore, config: AppConfig) -> Self {
        Self {
            store,
            config,
            committed: BTreeSet::new(),
            failed: BTreeSet::new(),
            running: None,
        }
    }

    pub fn status(&self, name: &str) -> StageStatus {
        if self.running == Some(name) {
            StageStatus::Running
        } else if self.committed.contains(name) {
            StageStatus::Committed
        } else if self.failed.contains(name) {
            StageStatus::Failed
        } else {
            StageStatus::Pending
        }
    }

    fn stage_def(name: &str) -> Result<&'static StageDef, EtlError> {
        STAGES
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| EtlError::UnknownStage(name.to_string()))
    }

    /// Run a single stage by name. Fails if any prerequisite stage has not
    /// committed during this run.
    pub fn run_stage(&mut self, name: &str) -> Result<StageResult, EtlError> {
        let def = Self::stage_def(name)?;
        for prerequisite in def.prerequisites {
            if !self.committed.contains(prerequisite) {
                return Err(EtlError::PrerequisiteNotCommitted {
                    stage: def.name,
                    prerequisite,
                });
            }
        }

        info!("Stage {} starting", def.name);
        self.running = Some(def.name);
        let started = Instant::now();
        let outcome = stages::run(def.name, &mut self.store, &self.config);
        let elapsed = started.elapsed();
        self.running = None;

        match outcome {
            Ok(outcome) => {
                self.committed.insert(def.name);
                let result = StageResult {
                    name: def.name,
                    status: StageStatus::Committed,
                    rows_written: outcome.rows_written,
                    rows_failed: outcome.rows_failed,
                    elapsed,
                };
                info!(
                    "Stage {} committed, {} rows written, {} rows failed, took {:?}",
                    result.name,
                    result.total_written(),
                    result.rows_failed,
                    result.elapsed,
                );
                Ok(result)
            }
            Err(e) => {
                self.failed.insert(def.name);
                error!("Stage {} failed after {:?}: {}", def.name, elapsed, e);
                Err(e)
            }
        }
    }

    /// Run every stage in declaration order, halting at the first failure.
    pub fn run_all(&mut self) -> Result<Vec<StageResult>, EtlError> {
        let mut results = Vec::with_capacity(STAGES.len());
        for def in STAGES {
            results.push(self.run_stage(def.name)?);
        }
        Ok(results)
    }

    pub fn store(&self) -> &WarehouseStore {
        &self.store
    }
}
