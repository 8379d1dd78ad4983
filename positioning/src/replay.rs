use crate::{
    config::PositioningConfig,
    errors::{PositioningError, Result},
    models::{EwmaChart, FairValue, PositionReport, TargetBasePositionValue},
    pipeline::PositioningPipeline,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::{TimeProvider, VirtualTimeProvider};
use tokio::sync::broadcast::{self, error::TryRecvError};

/// 回放样本：某一时刻的公允价格
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub timestamp: u64,
    pub price: f64,
}

/// 回放期间发布的全部快照
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub charts: Vec<EwmaChart>,
    pub targets: Vec<TargetBasePositionValue>,
    pub final_bias: Option<f64>,
}

pub fn load_replay_records(path: &str) -> Result<Vec<ReplayRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PositioningError::ReplayError {
        message: format!("open {} err: {}", path, e),
    })?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: ReplayRecord = row.map_err(|e| PositioningError::ReplayError {
            message: format!("parse {} err: {}", path, e),
        })?;
        records.push(record);
    }
    Ok(records)
}

fn drain<T: Clone + Serialize>(rx: &mut broadcast::Receiver<T>, topic: &str, out: &mut Vec<T>) {
    loop {
        match rx.try_recv() {
            Ok(value) => {
                match serde_json::to_string(&value) {
                    Ok(json) => info!("{}: {}", topic, json),
                    Err(e) => warn!("{} serialize err: {}", topic, e),
                }
                out.push(value);
            }
            Err(TryRecvError::Lagged(n)) => warn!("{} receiver lagged, {} values skipped", topic, n),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
}

/// 在虚拟时间上回放公允价格序列
/// 每条记录先推进到记录时间（触发到期的定时计算），再写入新的公允价格
pub fn run_replay(
    config: &PositioningConfig,
    position_value: f64,
    records: &[ReplayRecord],
) -> Result<ReplayReport> {
    let Some(first) = records.first() else {
        return Err(PositioningError::ReplayError {
            message: "no replay records".to_string(),
        });
    };
    if records.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
        return Err(PositioningError::ReplayError {
            message: "replay records must be sorted by timestamp".to_string(),
        });
    }

    let time_provider = Arc::new(VirtualTimeProvider::new(first.timestamp));
    let pipeline = PositioningPipeline::build(config, time_provider.clone())?;

    let (_, mut chart_rx) = pipeline.chart_publisher.subscribe();
    let (_, mut target_rx) = pipeline.target_publisher.subscribe();
    let mut report = ReplayReport::default();

    pipeline.positions.update(PositionReport {
        value: position_value,
        timestamp: time_provider.utc_now(),
    });

    for record in records {
        time_provider.advance_to(record.timestamp);
        pipeline
            .fair_values
            .update(FairValue::new(record.price, record.timestamp));

        drain(&mut chart_rx, pipeline.chart_publisher.topic(), &mut report.charts);
        drain(&mut target_rx, pipeline.target_publisher.topic(), &mut report.targets);
    }

    report.final_bias = pipeline.signal_smoother.latest_target_position();
    info!(
        "replay finished, records: {}, charts: {}, targets: {}, final bias: {:?}",
        records.len(),
        report.charts.len(),
        report.targets.len(),
        report.final_bias
    );
    Ok(report)
}
