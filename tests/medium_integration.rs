//! ---
//! wiresim_section: "06-testing-qa"
//! wiresim_subsection: "integration"
//! wiresim_type: "source"
//! wiresim_scope: "test"
//! wiresim_description: "Shared-medium summation and listener arming under contention."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use wiresim_card::NetworkCard;
use wiresim_common::{LineConfig, NoiseConfig};
use wiresim_frame::CountingSink;
use wiresim_medium::{NoiseSource, TwistedWirePair, WirePair};

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_contributors_sum_exactly() {
    let wire = Arc::new(TwistedWirePair::new());

    let mut tasks = Vec::new();
    for index in 0..16u32 {
        let wire = wire.clone();
        tasks.push(tokio::spawn(async move {
            let device = format!("device-{index}");
            // Churn through intermediate values before settling.
            for step in 0..32 {
                wire.set_voltage(&device, f64::from(step) * 0.1);
                tokio::task::yield_now().await;
            }
            wire.set_voltage(&device, f64::from(index));
        }));
    }
    for task in tasks {
        task.await.expect("writer task");
    }

    let expected: f64 = (0..16).map(f64::from).sum();
    assert!((wire.voltage("observer") - expected).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn torn_sums_are_never_observed() {
    let wire = Arc::new(TwistedWirePair::new());
    // One device flips between two exact values while another holds steady;
    // every observed sum must be one of the two valid totals.
    wire.set_voltage("flip-a", 2.5);
    wire.set_voltage("flip-b", -2.5);

    let writer = {
        let wire = wire.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                wire.set_voltage("flip-a", -2.5);
                wire.set_voltage("flip-a", 2.5);
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..500 {
        let volts = wire.voltage("observer");
        assert!(
            volts == 0.0 || volts == -5.0,
            "observed sum {volts} reflects a partial contribution"
        );
        tokio::task::yield_now().await;
    }
    writer.await.expect("writer task");
}

fn listen_line() -> LineConfig {
    LineConfig {
        pulse_width: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
        ..LineConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn threshold_equal_contribution_never_delivers() {
    let line = listen_line();
    let wire: Arc<dyn WirePair> = Arc::new(TwistedWirePair::new());

    let sink = Arc::new(CountingSink::new());
    let mut listener =
        NetworkCard::new("card-b", wire.clone(), line.clone()).with_sink(sink.clone());
    listener.start().expect("listener starts");

    wire.set_voltage("steady", line.alert_threshold());
    tokio::time::sleep(Duration::from_millis(600)).await;

    listener
        .take_listener()
        .expect("handle present")
        .shutdown()
        .await;
    assert_eq!(sink.deliveries(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn mild_thermal_noise_never_delivers() {
    let line = listen_line();
    let wire: Arc<dyn WirePair> = Arc::new(TwistedWirePair::new());

    let sink = Arc::new(CountingSink::new());
    let mut listener =
        NetworkCard::new("card-b", wire.clone(), line.clone()).with_sink(sink.clone());
    listener.start().expect("listener starts");

    let noise = NoiseSource::new(
        wire.clone(),
        NoiseConfig {
            enabled: true,
            device_name: "thermal-noise".to_owned(),
            sigma_volts: 0.05,
            interval: Duration::from_millis(5),
            seed: 97,
        },
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(600)).await;

    noise.shutdown().await;
    listener
        .take_listener()
        .expect("handle present")
        .shutdown()
        .await;
    assert_eq!(sink.deliveries(), 0);
}
