use crate::time::get_current_milli_timestamp_u64;
use log::debug;
use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{runtime::Handle, task::JoinHandle};

pub type TimerAction = Box<dyn FnOnce() + Send + 'static>;
pub type IntervalAction = Arc<dyn Fn() + Send + Sync + 'static>;

/// 时间与定时器抽象
/// 业务组件只通过该接口获取当前时间和注册定时任务，测试中可替换为虚拟时间
pub trait TimeProvider: Send + Sync {
    /// 当前时间（毫秒时间戳）
    fn utc_now(&self) -> u64;

    /// 延迟 delay 后执行一次
    fn set_timeout(&self, action: TimerAction, delay: Duration);

    /// 每隔 interval 执行一次，首次执行在 interval 之后
    fn set_interval(&self, action: IntervalAction, interval: Duration);
}

/// 基于 tokio 运行时的真实时间实现
pub struct TokioTimeProvider {
    handle: Handle,

    /// 定时任务句柄
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TokioTimeProvider {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// 使用当前所在的 tokio 运行时，不在运行时内时返回 None
    pub fn from_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    fn push_task(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    /// 当前仍在运行的定时任务数量
    pub fn active_timers(&self) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// 停止所有定时任务
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl TimeProvider for TokioTimeProvider {
    fn utc_now(&self) -> u64 {
        get_current_milli_timestamp_u64()
    }

    fn set_timeout(&self, action: TimerAction, delay: Duration) {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });
        self.push_task(task);
    }

    fn set_interval(&self, action: IntervalAction, interval: Duration) {
        if interval.is_zero() {
            debug!("ignore zero interval timer");
            return;
        }
        let Some(start) = tokio::time::Instant::now().checked_add(interval) else {
            debug!("ignore interval timer beyond representable time: {:?}", interval);
            return;
        };
        let task = self.handle.spawn(async move {
            let mut interval_timer = tokio::time::interval_at(start, interval);
            loop {
                interval_timer.tick().await;
                action();
            }
        });
        self.push_task(task);
    }
}

impl Drop for TokioTimeProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}
