use std::sync::Arc;
use std::time::Duration;

use interbus::devices::{basik, extreme, rf_driver, select, varia};
use interbus::sim::SimulatedBus;
use interbus::transport::{PortCode, PortSelector, RegisterCode};
use interbus::{Bus, CommError, DiscoveryConfig, DiscoveryError, Error, Port};

fn bus(sim: &Arc<SimulatedBus>) -> Bus<SimulatedBus> {
    Bus::new(sim.clone(), DiscoveryConfig::default())
}

/// Two racks: an Extreme with Select and RF driver on COM3, a second Select
/// and a Varia on COM7.
fn two_racks() -> Arc<SimulatedBus> {
    let sim = SimulatedBus::new();
    sim.add_module("COM3", 15, 0x60);
    sim.add_module("COM3", 16, 0x67);
    sim.add_module("COM3", 17, 0x66);
    sim.add_module("COM7", 18, 0x67);
    sim.add_module("COM7", 20, 0x68);
    Arc::new(sim)
}

#[tokio::test]
async fn unique_kinds_resolve() {
    let sim = two_racks();
    let bus = bus(&sim);

    let extreme = bus.discover(&extreme::SIGNATURE).await.unwrap();
    assert_eq!((extreme.port().name(), extreme.address()), ("COM3", 15));

    let rf = bus.discover(&rf_driver::SIGNATURE).await.unwrap();
    assert_eq!((rf.port().name(), rf.address()), ("COM3", 17));
    assert_eq!(rf.device_type(), 0x66);

    let varia = bus.discover(&varia::SIGNATURE).await.unwrap();
    assert_eq!((varia.port().name(), varia.address()), ("COM7", 20));
}

#[tokio::test]
async fn duplicate_kind_is_ambiguous() {
    let sim = two_racks();
    let err = bus(&sim).discover(&select::SIGNATURE).await.unwrap_err();

    match err {
        Error::Discovery(DiscoveryError::Ambiguous { kind, locations }) => {
            assert_eq!(kind, "SuperK Select");
            assert_eq!(
                locations,
                vec![(Port::new("COM3"), 16), (Port::new("COM7"), 18)]
            );
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
}

#[tokio::test]
async fn absent_kind_is_not_found() {
    let sim = two_racks();
    let err = bus(&sim).discover(&basik::SIGNATURE).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Discovery(DiscoveryError::NotFound { kind: "Koheras BASIK" })
    ));
}

#[tokio::test]
async fn module_outside_address_range_is_ignored() {
    let sim = SimulatedBus::new();
    // An Extreme type byte, but not at the Extreme's fixed address.
    sim.add_module("COM1", 16, 0x60);
    let sim = Arc::new(sim);

    let err = bus(&sim).discover(&extreme::SIGNATURE).await.unwrap_err();
    assert!(matches!(err, Error::Discovery(DiscoveryError::NotFound { .. })));
}

#[tokio::test]
async fn repeated_discovery_is_deterministic() {
    let sim = two_racks();
    let bus = bus(&sim);

    let first = bus.discover(&rf_driver::SIGNATURE).await.unwrap();
    let second = bus.discover(&rf_driver::SIGNATURE).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn ports_closed_after_success_and_ambiguity() {
    let sim = two_racks();
    let bus = bus(&sim);

    bus.discover(&extreme::SIGNATURE).await.unwrap();
    assert!(sim.open_ports().is_empty());

    bus.discover(&select::SIGNATURE).await.unwrap_err();
    assert!(sim.open_ports().is_empty());

    // Each scan opens both ports and closes exactly those, never "all".
    assert_eq!(sim.opened_ports().len(), 4);
    let closes = sim.close_calls();
    assert_eq!(closes.len(), 4);
    assert!(closes.iter().all(|c| matches!(c, PortSelector::One(_))));
}

#[tokio::test]
async fn empty_port_does_not_hide_module_elsewhere() {
    let sim = SimulatedBus::new();
    sim.add_port("COM1");
    sim.add_module("COM3", 16, 0x67);
    // COM1 answers "no devices on port".
    sim.script_open_codes([PortCode(3), PortCode(0)]);
    let sim = Arc::new(sim);

    let binding = bus(&sim).discover(&select::SIGNATURE).await.unwrap();
    assert_eq!((binding.port().name(), binding.address()), ("COM3", 16));
    assert_eq!(sim.opened_ports(), vec![Port::new("COM3")]);
    assert_eq!(sim.close_calls(), vec![PortSelector::One("COM3".into())]);
}

#[tokio::test]
async fn busy_open_closes_what_was_opened() {
    let sim = two_racks();
    // COM3 opens, COM7 answers busy.
    sim.script_open_codes([PortCode(0), PortCode(4)]);

    let err = bus(&sim).discover(&varia::SIGNATURE).await.unwrap_err();
    assert!(matches!(err, Error::Comm(CommError::Busy)));
    assert_eq!(sim.opened_ports(), vec![Port::new("COM3")]);
    assert_eq!(sim.close_calls(), vec![PortSelector::One("COM3".into())]);
    assert!(sim.open_ports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancelled_discovery_releases_ports() {
    let sim = two_racks();
    sim.set_table_latency(Duration::from_millis(500));
    let bus = bus(&sim);

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        bus.discover(&extreme::SIGNATURE),
    )
    .await;
    assert!(outcome.is_err());

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(sim.open_ports().is_empty());
    assert_eq!(sim.close_calls().len(), 2);
}

#[tokio::test]
async fn busy_open_surfaces_busy() {
    let sim = two_racks();
    sim.script_open_codes([PortCode(4)]);

    let err = bus(&sim).discover(&varia::SIGNATURE).await.unwrap_err();
    assert!(matches!(err, Error::Comm(CommError::Busy)));
    assert!(sim.close_calls().is_empty());
}

#[tokio::test]
async fn failed_close_does_not_fail_scan() {
    let sim = two_racks();
    sim.script_close_codes([PortCode(1)]);

    let binding = bus(&sim).discover(&extreme::SIGNATURE).await.unwrap();
    assert_eq!(binding.address(), 15);
    assert_eq!(sim.close_calls().len(), 2);
}

#[tokio::test]
async fn empty_port_list_finds_nothing_and_opens_nothing() {
    let sim = Arc::new(SimulatedBus::new());
    let err = bus(&sim).discover(&select::SIGNATURE).await.unwrap_err();

    assert!(matches!(err, Error::Discovery(DiscoveryError::NotFound { .. })));
    assert!(sim.opened_ports().is_empty());
    assert!(sim.close_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn busy_probes_are_retried_during_fallback_scan() {
    let sim = SimulatedBus::new();
    sim.add_module("COM2", 15, 0x60);
    sim.disable_device_table();
    // Address 15 is the only one probed; it answers busy twice first.
    sim.script_read_codes([RegisterCode(3), RegisterCode(15)]);
    let sim = Arc::new(sim);

    let binding = bus(&sim).discover(&extreme::SIGNATURE).await.unwrap();
    assert_eq!(binding.address(), 15);
    assert_eq!(sim.read_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn persistent_busy_reads_as_absent() {
    let sim = SimulatedBus::new();
    sim.add_module("COM2", 15, 0x60);
    sim.disable_device_table();
    sim.script_read_codes([RegisterCode(3); 10]);
    let sim = Arc::new(sim);

    let config = DiscoveryConfig {
        busy_retries: 2,
        busy_backoff: Duration::from_millis(10),
        ..Default::default()
    };
    let err = Bus::new(sim.clone(), config)
        .discover(&extreme::SIGNATURE)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Discovery(DiscoveryError::NotFound { .. })));
    assert_eq!(sim.read_count(), 3);
}

#[tokio::test]
async fn table_snapshot_avoids_per_address_reads() {
    let sim = two_racks();
    bus(&sim).discover(&rf_driver::SIGNATURE).await.unwrap();

    assert_eq!(sim.read_count(), 0);
    assert_eq!(sim.table_read_count(), 2);
}

#[tokio::test]
async fn explicit_bind_resolves_ambiguity() {
    let sim = two_racks();
    let bus = bus(&sim);

    let binding = bus
        .bind_verified("COM7".into(), 18, &select::SIGNATURE)
        .await
        .unwrap();
    assert_eq!(binding.device_type(), 0x67);

    let access = bus.access(binding);
    assert_eq!(access.device_type().await.unwrap(), 0x67);
}
