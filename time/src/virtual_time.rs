use crate::time_provider::{IntervalAction, TimeProvider, TimerAction};
use std::{
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

enum Task {
    Once(TimerAction),
    Repeat {
        action: IntervalAction,
        interval_ms: u64,
    },
}

struct Inner {
    now: u64,
    seq: u64,
    // (到期时间, 注册序号) -> 任务，同一时刻按注册顺序执行
    pending: BTreeMap<(u64, u64), Task>,
}

impl Inner {
    fn schedule(&mut self, due: u64, task: Task) {
        let seq = self.seq;
        self.seq += 1;
        self.pending.insert((due, seq), task);
    }
}

/// 虚拟时间，只有调用 advance 时才推进并触发到期任务
pub struct VirtualTimeProvider {
    inner: Mutex<Inner>,
}

impl VirtualTimeProvider {
    pub fn new(start_ms: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                now: start_ms,
                seq: 0,
                pending: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 推进 duration，期间到期的任务依次在锁外执行
    pub fn advance(&self, duration: Duration) {
        let target = self.lock().now.saturating_add(duration_ms(duration));
        self.advance_to(target);
    }

    /// 推进到指定时间戳，早于当前时间时只执行已到期任务
    pub fn advance_to(&self, target_ms: u64) {
        loop {
            let task = {
                let mut inner = self.lock();
                let due = match inner.pending.first_key_value() {
                    Some((&(due, _), _)) if due <= target_ms => due,
                    _ => break,
                };
                let Some((_, task)) = inner.pending.pop_first() else {
                    break;
                };
                if due > inner.now {
                    inner.now = due;
                }
                task
            };

            match task {
                Task::Once(action) => action(),
                Task::Repeat {
                    action,
                    interval_ms,
                } => {
                    {
                        let mut inner = self.lock();
                        // 超出 u64 范围的下一次触发永远不会到达，不再排队
                        if let Some(next) = inner.now.checked_add(interval_ms) {
                            inner.schedule(
                                next,
                                Task::Repeat {
                                    action: action.clone(),
                                    interval_ms,
                                },
                            );
                        }
                    }
                    action();
                }
            }
        }

        let mut inner = self.lock();
        if target_ms > inner.now {
            inner.now = target_ms;
        }
    }

    /// 等待执行的任务数量
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

impl TimeProvider for VirtualTimeProvider {
    fn utc_now(&self) -> u64 {
        self.lock().now
    }

    fn set_timeout(&self, action: TimerAction, delay: Duration) {
        let mut inner = self.lock();
        let due = inner.now.saturating_add(duration_ms(delay));
        inner.schedule(due, Task::Once(action));
    }

    fn set_interval(&self, action: IntervalAction, interval: Duration) {
        // 间隔至少 1ms，避免 advance 死循环
        let interval_ms = duration_ms(interval).max(1);
        let mut inner = self.lock();
        let due = inner.now.saturating_add(interval_ms);
        inner.schedule(
            due,
            Task::Repeat {
                action,
                interval_ms,
            },
        );
    }
}
