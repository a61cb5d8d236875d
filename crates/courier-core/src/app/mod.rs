//! App - the delivery engine and the classification pipeline
//!
//! # Components
//! - **BackoffPolicy**: retry count -> wait
//! - **RetryLedger**: failures per message, engine-local
//! - **CommitDiscipline**: monotonic per-partition commit points
//! - **DeadLetterRouter**: publishes exhausted messages to `<topic>.dlq`
//! - **DeliveryLoop**: poll -> deliver -> commit / retry / dead-letter
//! - **EngineBuilder**: fail-fast wiring
//! - **ClassificationPipeline** / **AnalysisPool**: the processor run in production

pub mod backoff;
pub mod builder;
pub mod commit;
pub mod dead_letter;
pub mod delivery_loop;
pub mod ledger;
pub mod pipeline;
pub mod pool;
pub mod shutdown;

pub use self::backoff::{BackoffPolicy, Growth};
pub use self::builder::EngineBuilder;
pub use self::commit::{CommitDiscipline, CommitOutcome};
pub use self::dead_letter::DeadLetterRouter;
pub use self::delivery_loop::{DeliveryLoop, EngineConfig};
pub use self::ledger::RetryLedger;
pub use self::pipeline::ClassificationPipeline;
pub use self::pool::AnalysisPool;
pub use self::shutdown::{RunningEngine, ShutdownHandle, ShutdownSignal};
