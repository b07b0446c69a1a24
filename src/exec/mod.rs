// src/exec/mod.rs

//! Module execution layer.
//!
//! - [`task`] holds [`ModuleTask`], one invocation of an external module.
//! - [`function`] holds [`FunctionTask`], the in-process counterpart that
//!   calls a registered function.
//! - [`pool`] provides the bounded [`WorkerPool`] both kinds run on.
//! - [`supervisor`] binds a running child process to its future.
//! - [`scale`] maps progress protocol events onto the integer scale.
//! - [`signals`] suspends / resumes child processes where possible.
//! - [`schema`] implements the time-bounded schema handshake.

pub mod function;
pub mod options;
pub mod pool;
pub mod scale;
pub mod schema;
pub mod signals;
pub mod supervisor;
pub mod task;

pub use function::{FunctionRegistry, FunctionTask, ModuleFn};
pub use options::RunnerOptions;
pub use pool::WorkerPool;
pub use scale::{
    PROGRESS_FILTER_END, PROGRESS_FULL, PROGRESS_NOT_STARTED, PROGRESS_TERMINATED, ProgressScale,
};
pub use schema::fetch_schema;
pub use supervisor::{ProcessSupervisor, SupervisedExit};
pub use task::ModuleTask;
