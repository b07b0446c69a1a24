// src/exec/function.rs

//! In-process modules: a registered Rust function instead of an
//! executable.
//!
//! A [`FunctionTask`] follows the same start / run / future contract as a
//! [`ModuleTask`](super::ModuleTask). The function runs on Tokio's blocking
//! pool; an `Err` or a panic becomes [`ModuleError::Invocation`]. Progress
//! always ends as the single-step range `0..=1` at value 1.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::errors::ModuleError;
use crate::exec::pool::WorkerPool;
use crate::future::ModuleFuture;

/// Signature of an in-process module: argv in, `(parameter, value)`
/// results out.
pub type ModuleFn =
    Arc<dyn Fn(&[String]) -> anyhow::Result<Vec<(String, String)>> + Send + Sync>;

const PANIC_MESSAGE: &str = "unknown exception in module function";

/// Location → function lookup table.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, ModuleFn>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("locations", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `location`, replacing any previous entry.
    pub fn register<F>(&mut self, location: impl Into<String>, function: F)
    where
        F: Fn(&[String]) -> anyhow::Result<Vec<(String, String)>> + Send + Sync + 'static,
    {
        self.functions.insert(location.into(), Arc::new(function));
    }

    pub fn get(&self, location: &str) -> Option<ModuleFn> {
        self.functions.get(location).cloned()
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

pub struct FunctionTask {
    location: String,
    function: ModuleFn,
    argv: Vec<String>,
    future: ModuleFuture,
}

impl fmt::Debug for FunctionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTask")
            .field("location", &self.location)
            .field("argv", &self.argv)
            .field("future", &self.future)
            .finish_non_exhaustive()
    }
}

impl FunctionTask {
    pub fn new(location: impl Into<String>, function: ModuleFn, argv: Vec<String>) -> Self {
        Self {
            location: location.into(),
            function,
            argv,
            future: ModuleFuture::new(),
        }
    }

    /// Look `location` up in `registry`.
    pub fn from_registry(
        registry: &FunctionRegistry,
        location: &str,
        argv: Vec<String>,
    ) -> Result<Self, ModuleError> {
        let function = registry
            .get(location)
            .ok_or_else(|| ModuleError::SpawnFailure {
                executable: location.to_string(),
                reason: "no function registered at this location".to_string(),
            })?;
        Ok(Self::new(location, function, argv))
    }

    pub fn future(&self) -> ModuleFuture {
        self.future.clone()
    }

    pub fn start(self, pool: &WorkerPool) -> ModuleFuture {
        if self.future.is_canceled() {
            info!(location = %self.location, "function task canceled before scheduling");
            return ModuleFuture::canceled_result();
        }

        self.future.report_started();
        let future = self.future.clone();
        pool.submit(future.clone(), self.run());
        future
    }

    pub async fn run(self) {
        let future = self.future;
        if !future.try_begin_running() {
            info!(location = %self.location, "function task canceled before running");
            future.report_finished();
            return;
        }

        info!(location = %self.location, argv = ?self.argv, "invoking module function");

        let function = self.function;
        let argv = self.argv;
        let outcome = tokio::task::spawn_blocking(move || function(&argv)).await;

        match outcome {
            Ok(Ok(results)) => {
                for (parameter, value) in results {
                    future.report_result(&parameter, &value);
                }
            }
            Ok(Err(err)) => {
                error!(location = %self.location, error = %err, "module function failed");
                future.report_exception(ModuleError::Invocation(format!("{err:#}")));
            }
            Err(join) => {
                error!(location = %self.location, error = %join, "module function panicked");
                future.report_exception(ModuleError::Invocation(PANIC_MESSAGE.to_string()));
            }
        }

        future.set_progress_range(0, 1);
        future.set_progress_value(1);
        future.report_finished();
    }
}
