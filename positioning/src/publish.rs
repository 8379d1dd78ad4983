use log::trace;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

pub type SnapshotFn<T> = Box<dyn Fn() -> Option<T> + Send + Sync + 'static>;

/// 快照发布接口
pub trait Publisher<T>: Send + Sync {
    /// 发布新值，不阻塞调用方
    fn publish(&self, value: T);

    /// 注册快照函数，新订阅者接入时由发布方主动拉取当前状态
    fn register_snapshot(&self, snapshot: SnapshotFn<T>);
}

/// 基于 broadcast 通道的进程内发布实现
pub struct BroadcastPublisher<T> {
    topic: String,
    tx: broadcast::Sender<T>,
    snapshot: RwLock<Option<SnapshotFn<T>>>,
}

impl<T: Clone + Send + Sync + 'static> BroadcastPublisher<T> {
    pub fn new(topic: &str, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            topic: topic.to_string(),
            tx,
            snapshot: RwLock::new(None),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 当前快照，未注册快照函数或尚无数据时为 None
    pub fn snapshot(&self) -> Option<T> {
        let snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        snapshot.as_ref().and_then(|f| f())
    }

    /// 订阅：先拉取快照，再接收后续发布
    pub fn subscribe(&self) -> (Option<T>, broadcast::Receiver<T>) {
        let rx = self.tx.subscribe();
        (self.snapshot(), rx)
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for BroadcastPublisher<T> {
    fn publish(&self, value: T) {
        // 没有订阅者时直接丢弃
        let receivers = self.tx.send(value).unwrap_or(0);
        trace!("publish {} to {} receivers", self.topic, receivers);
    }

    fn register_snapshot(&self, snapshot: SnapshotFn<T>) {
        let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(snapshot);
    }
}
