pub mod client;
pub mod engine;
pub mod executor;
pub mod invoker;

pub use client::{BuildError, CheckResult, DoctorReport, EngineClient, VerifyError, VerifyReport};
pub use engine::EngineError;
pub use executor::{EngineExecutor, RealExecutor};
pub use invoker::{EntryInvoker, InvokeError, exit_code_of};
