use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

pub type EventHandler = Arc<dyn Fn() + Send + Sync + 'static>;

/// 无负载事件
/// 同步观察者在 trigger 时按注册顺序调用，异步消费者通过 subscribe 获取通知，
/// 收到通知后自行读取最新状态
pub struct Event {
    handlers: RwLock<Vec<EventHandler>>,
    tx: broadcast::Sender<()>,
}

impl Event {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            handlers: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// 注册同步观察者
    pub fn on<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(Arc::new(handler));
    }

    /// 订阅异步通知
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn trigger(&self) {
        // 复制一份再调用，观察者内部可以继续注册或触发事件
        let handlers: Vec<EventHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler();
        }
        let _ = self.tx.send(());
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}
