pub mod invocation_ctx;
pub mod task_flow;

pub use invocation_ctx::InvocationCtx;
pub use task_flow::{plan_calls, CallPayload, FlowReport, PlannedCall, SlotSnapshot, TaskFlow};
