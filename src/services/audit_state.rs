//! 审核会话状态
//!
//! 槽位、结果、令牌和运行中任务放在同一把锁后面，
//! 令牌检查和结果写入在一次加锁内完成。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::models::FileFormat;
use crate::services::{InFlightTracker, InvocationTokens, ResultStore, SlotRegistry};

#[derive(Debug, Default)]
pub struct AuditState {
    pub registry: SlotRegistry,
    pub results: ResultStore,
    pub tokens: InvocationTokens,
    pub in_flight: InFlightTracker,
}

impl AuditState {
    pub fn new(format: FileFormat) -> Self {
        Self {
            registry: SlotRegistry::new(format),
            ..Default::default()
        }
    }

    /// 切换格式：清空全部结果并作废所有未完成调用，文档保持不变
    pub fn switch_format(&mut self, format: FileFormat) {
        self.registry.set_format(format);
        self.results.reset();
        self.tokens.invalidate_all();
    }
}

/// 共享的会话状态
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<AuditState>>);

impl SharedState {
    pub fn new(format: FileFormat) -> Self {
        Self(Arc::new(Mutex::new(AuditState::new(format))))
    }

    /// 加锁；锁中毒时继续使用内部数据，状态写入都是单步的
    pub fn lock(&self) -> MutexGuard<'_, AuditState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
