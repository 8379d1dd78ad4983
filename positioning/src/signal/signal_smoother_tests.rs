use crate::{
    models::{BrokerProfile, EwmaChart, FairValue},
    providers::FairValueCell,
    publish::BroadcastPublisher,
    signal::{SignalSmoother, SmootherSchedule, compute_bias},
    statistics::{ComputeStatistics, EwmaStatisticCalculator},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};
use time::{TimeProvider, VirtualTimeProvider};
use tokio::sync::broadcast;

const START: u64 = 1_700_000_000_000;

/// 按顺序返回预设值，用完后重复最后一个
struct ScriptedStatistics {
    values: Vec<f64>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedStatistics {
    fn boxed(values: &[f64]) -> (Box<dyn ComputeStatistics>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stats = Self {
            values: values.to_vec(),
            calls: calls.clone(),
        };
        (Box::new(stats), calls)
    }
}

impl ComputeStatistics for ScriptedStatistics {
    fn add_new_value(&mut self, _value: f64) -> f64 {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.values[idx.min(self.values.len() - 1)]
    }
}

struct Fixture {
    time: Arc<VirtualTimeProvider>,
    fair_values: Arc<FairValueCell>,
    publisher: Arc<BroadcastPublisher<EwmaChart>>,
    smoother: Arc<SignalSmoother>,
    events: Arc<AtomicUsize>,
}

impl Fixture {
    fn new(
        min_tick: Decimal,
        short: Box<dyn ComputeStatistics>,
        long: Box<dyn ComputeStatistics>,
    ) -> Self {
        let time = Arc::new(VirtualTimeProvider::new(START));
        let fair_values = Arc::new(FairValueCell::new());
        let publisher = Arc::new(BroadcastPublisher::new("ewma_chart", 64));
        let smoother = SignalSmoother::new(
            BrokerProfile::new(min_tick).unwrap(),
            time.clone(),
            fair_values.clone(),
            short,
            long,
            publisher.clone(),
            SmootherSchedule::default(),
        );

        let events = Arc::new(AtomicUsize::new(0));
        let events_clone = events.clone();
        smoother.new_target_position().on(move || {
            events_clone.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            time,
            fair_values,
            publisher,
            smoother,
            events,
        }
    }

    fn with_ewma(short_periods: u32, long_periods: u32) -> Self {
        Self::new(
            dec!(0.01),
            Box::new(EwmaStatisticCalculator::with_periods(short_periods).unwrap()),
            Box::new(EwmaStatisticCalculator::with_periods(long_periods).unwrap()),
        )
    }

    fn scripted(short: &[f64], long: &[f64]) -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (short, short_calls) = ScriptedStatistics::boxed(short);
        let (long, long_calls) = ScriptedStatistics::boxed(long);
        (Self::new(dec!(0.01), short, long), short_calls, long_calls)
    }

    fn set_price(&self, price: f64) {
        self.fair_values
            .update(FairValue::new(price, self.time.utc_now()));
    }

    fn event_count(&self) -> usize {
        self.events.load(Ordering::SeqCst)
    }
}

fn drain(rx: &mut broadcast::Receiver<EwmaChart>) -> Vec<EwmaChart> {
    let mut charts = Vec::new();
    while let Ok(chart) = rx.try_recv() {
        charts.push(chart);
    }
    charts
}

#[test]
fn test_compute_bias() {
    assert_eq!(compute_bias(100.0, 100.0, 0.01), 0.0);
    assert!((compute_bias(100.1, 100.0, 0.01) - 0.5).abs() < 1e-9);
    assert!((compute_bias(99.9, 100.0, 0.01) + 0.5).abs() < 1e-9);
    assert_eq!(compute_bias(200.0, 100.0, 0.01), 1.0);
    assert_eq!(compute_bias(50.0, 100.0, 0.01), -1.0);
}

#[test]
fn test_compute_bias_degenerate_long() {
    assert_eq!(compute_bias(1.0, 0.0, 0.01), 1.0);
    assert_eq!(compute_bias(-1.0, 0.0, 0.01), -1.0);
    assert!(compute_bias(0.0, 0.0, 0.01).is_nan());
}

#[test]
fn test_tick_without_fair_value_is_noop() {
    let fixture = Fixture::with_ewma(3, 9);
    let (snapshot, mut rx) = fixture.publisher.subscribe();
    assert_eq!(snapshot, None);

    fixture.smoother.on_periodic_tick();
    fixture.time.advance(Duration::from_secs(3600));

    assert!(drain(&mut rx).is_empty());
    assert!(fixture.smoother.regular_fair_values().is_empty());
    assert_eq!(fixture.smoother.latest_target_position(), None);
    assert_eq!(fixture.smoother.snapshot(), None);
}

#[test]
fn test_warmup_and_interval_schedule() {
    let fixture = Fixture::with_ewma(3, 9);
    fixture.set_price(100.0);
    let (_, mut rx) = fixture.publisher.subscribe();

    fixture.time.advance(Duration::from_secs(59));
    assert!(fixture.smoother.regular_fair_values().is_empty());

    fixture.time.advance(Duration::from_secs(1));
    let history = fixture.smoother.regular_fair_values();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].timestamp, START + 60_000);

    fixture.time.advance(Duration::from_secs(540));
    let history = fixture.smoother.regular_fair_values();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].timestamp, START + 600_000);

    fixture.time.advance(Duration::from_secs(600));
    assert_eq!(fixture.smoother.regular_fair_values().len(), 3);

    let charts = drain(&mut rx);
    assert_eq!(charts.len(), 3);
    assert_eq!(charts[2].timestamp, START + 1_200_000);
}

#[test]
fn test_history_keeps_last_seven_in_order() {
    let fixture = Fixture::with_ewma(3, 9);

    for i in 0..10 {
        fixture.set_price(100.0 + i as f64);
        fixture.smoother.on_periodic_tick();
        fixture.time.advance(Duration::from_secs(1));
    }

    let history = fixture.smoother.regular_fair_values();
    assert_eq!(history.len(), 7);
    assert_eq!(
        history.iter().map(|h| h.price).collect::<Vec<_>>(),
        vec![103.0, 104.0, 105.0, 106.0, 107.0, 108.0, 109.0]
    );
    assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(history[0].timestamp, START + 3_000);
}

#[test]
fn test_constant_price_never_fires() {
    let fixture = Fixture::with_ewma(3, 9);
    fixture.set_price(100.0);

    for _ in 0..20 {
        fixture.smoother.on_periodic_tick();
    }

    assert_eq!(fixture.event_count(), 0);
    assert_eq!(fixture.smoother.latest_target_position(), None);
}

#[test]
fn test_bias_fires_once_within_tolerance() {
    let (fixture, _, _) = Fixture::scripted(&[100.1, 100.1005, 100.099], &[100.0]);
    fixture.set_price(100.0);

    for _ in 0..5 {
        fixture.smoother.on_periodic_tick();
    }

    // 后续偏向变化都不超过 0.01
    assert_eq!(fixture.event_count(), 1);
    let bias = fixture.smoother.latest_target_position().unwrap();
    assert!((bias - 0.5).abs() < 1e-9);
}

#[test]
fn test_bias_refires_past_tolerance() {
    let (fixture, _, _) = Fixture::scripted(&[100.1, 100.3, 100.3], &[100.0]);
    fixture.set_price(100.0);

    fixture.smoother.on_periodic_tick();
    fixture.smoother.on_periodic_tick();
    fixture.smoother.on_periodic_tick();

    assert_eq!(fixture.event_count(), 2);
    assert_eq!(fixture.smoother.latest_target_position(), Some(1.0));
}

#[test]
fn test_bias_always_within_bounds() {
    let fixture = Fixture::with_ewma(2, 20);
    let prices = [100.0, 130.0, 60.0, 250.0, 1.0, 99.0, 100.5, 0.5, 1000.0, 101.0];

    for price in prices {
        fixture.set_price(price);
        fixture.smoother.on_periodic_tick();
        if let Some(bias) = fixture.smoother.latest_target_position() {
            assert!((-1.0..=1.0).contains(&bias), "bias out of range: {}", bias);
        }
    }
    assert!(fixture.event_count() > 0);
}

#[test]
fn test_degenerate_long_ewma_keeps_previous_bias() {
    let (fixture, _, _) = Fixture::scripted(&[0.0], &[0.0]);
    fixture.set_price(0.0);

    fixture.smoother.on_periodic_tick();

    // 0/0 得到 NaN，不会越过阈值
    assert_eq!(fixture.event_count(), 0);
    assert_eq!(fixture.smoother.latest_target_position(), None);

    let (fixture, _, _) = Fixture::scripted(&[1.0], &[0.0]);
    fixture.set_price(1.0);
    fixture.smoother.on_periodic_tick();
    assert_eq!(fixture.event_count(), 1);
    assert_eq!(fixture.smoother.latest_target_position(), Some(1.0));
}

#[test]
fn test_published_values_rounded_to_tick() {
    let fixture = Fixture::new(
        dec!(0.05),
        Box::new(EwmaStatisticCalculator::with_periods(3).unwrap()),
        Box::new(EwmaStatisticCalculator::with_periods(9).unwrap()),
    );
    let (_, mut rx) = fixture.publisher.subscribe();
    fixture.set_price(100.123);

    fixture.smoother.on_periodic_tick();

    let charts = drain(&mut rx);
    assert_eq!(charts.len(), 1);
    assert_eq!(
        charts[0],
        EwmaChart {
            quote_ewma: None,
            short_ewma: Some(dec!(100.10)),
            long_ewma: Some(dec!(100.10)),
            fair_value: Some(dec!(100.10)),
            timestamp: START,
        }
    );
}

#[test]
fn test_push_quote_ewma_requires_value_and_fair_value() {
    let fixture = Fixture::with_ewma(3, 9);
    let (_, mut rx) = fixture.publisher.subscribe();

    fixture.smoother.push_quote_ewma(Some(100.0));
    assert!(drain(&mut rx).is_empty());

    fixture.set_price(100.0);
    fixture.smoother.push_quote_ewma(None);
    assert!(drain(&mut rx).is_empty());
    assert_eq!(fixture.smoother.snapshot(), None);
}

#[test]
fn test_push_quote_ewma_does_not_touch_smoothing_state() {
    let (fixture, short_calls, long_calls) = Fixture::scripted(&[100.1], &[100.0]);
    let (_, mut rx) = fixture.publisher.subscribe();
    fixture.set_price(100.0);
    fixture.smoother.on_periodic_tick();

    let tick_chart = drain(&mut rx).pop().unwrap();
    let bias = fixture.smoother.latest_target_position();
    let events = fixture.event_count();

    fixture.set_price(101.0);
    fixture.smoother.push_quote_ewma(Some(100.123));

    let charts = drain(&mut rx);
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].quote_ewma, Some(dec!(100.12)));
    assert_eq!(charts[0].short_ewma, tick_chart.short_ewma);
    assert_eq!(charts[0].long_ewma, tick_chart.long_ewma);
    assert_eq!(charts[0].fair_value, Some(dec!(101)));

    assert_eq!(short_calls.load(Ordering::SeqCst), 1);
    assert_eq!(long_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.smoother.latest_target_position(), bias);
    assert_eq!(fixture.event_count(), events);
    assert_eq!(fixture.smoother.regular_fair_values().len(), 1);

    // 下一次定时计算沿用最近推送的报价 EWMA
    fixture.smoother.on_periodic_tick();
    let charts = drain(&mut rx);
    assert_eq!(charts[0].quote_ewma, Some(dec!(100.12)));
}

#[test]
fn test_snapshot_for_late_subscriber() {
    let fixture = Fixture::with_ewma(3, 9);
    fixture.set_price(100.0);

    fixture.smoother.push_quote_ewma(Some(99.5));
    let (snapshot, _rx) = fixture.publisher.subscribe();
    assert_eq!(
        snapshot,
        Some(EwmaChart {
            quote_ewma: Some(dec!(99.5)),
            short_ewma: None,
            long_ewma: None,
            fair_value: Some(dec!(100)),
            timestamp: START,
        })
    );

    fixture.time.advance(Duration::from_secs(60));
    let (snapshot, _rx) = fixture.publisher.subscribe();
    let snapshot = snapshot.unwrap();
    assert_eq!(snapshot.short_ewma, Some(dec!(100)));
    assert_eq!(snapshot.long_ewma, Some(dec!(100)));
    assert_eq!(snapshot.timestamp, START + 60_000);
}

#[test]
fn test_concurrent_ticks_trigger_once() {
    let (fixture, short_calls, _) = Fixture::scripted(&[100.1], &[100.0]);
    fixture.set_price(100.0);

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..10 {
                    fixture.smoother.on_periodic_tick();
                }
            });
        }
    });

    assert_eq!(short_calls.load(Ordering::SeqCst), 80);
    assert_eq!(fixture.event_count(), 1);
    assert!((fixture.smoother.latest_target_position().unwrap() - 0.5).abs() < 1e-9);
    assert_eq!(fixture.smoother.regular_fair_values().len(), 7);
}
