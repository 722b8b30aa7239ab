use std::sync::Arc;

use interbus::devices::{basik, extreme, select};
use interbus::sim::SimulatedBus;
use interbus::transport::RegisterCode;
use interbus::{Bus, CommError, DiscoveryConfig, EncodingError, Error, RawPair, RegisterValue};

async fn basik_on_com1() -> (Arc<SimulatedBus>, interbus::RegisterAccess<SimulatedBus>) {
    let sim = Arc::new(SimulatedBus::new());
    sim.add_module("COM1", 1, 0x33);
    let bus = Bus::new(sim.clone(), DiscoveryConfig::default());
    let binding = bus.discover(&basik::SIGNATURE).await.unwrap();
    (sim, bus.access(binding))
}

#[tokio::test]
async fn bounds_reject_before_any_write() {
    let (sim, access) = basik_on_com1().await;

    let err = access
        .write(&basik::WAVELENGTH_MODULATION_LEVEL, 1500u16)
        .await
        .unwrap_err();
    match err {
        Error::Encoding(EncodingError::ValueOutOfRange { value, min, max, unit }) => {
            assert_eq!((value, min, max, unit), (1500.0, 0.0, 1000.0, "‰"));
        }
        other => panic!("expected out of range, got {other:?}"),
    }
    assert_eq!(sim.write_count(), 0);

    access
        .write(&basik::WAVELENGTH_MODULATION_LEVEL, 1000u16)
        .await
        .unwrap();
    assert_eq!(sim.write_count(), 1);
}

#[tokio::test]
async fn negative_offset_round_trips() {
    let (sim, access) = basik_on_com1().await;

    access
        .write(&basik::WAVELENGTH_MODULATION_OFFSET, -250i16)
        .await
        .unwrap();
    assert_eq!(sim.register("COM1", 1, 0x2F).unwrap(), vec![0x06, 0xFF]);
    assert_eq!(
        access.read::<i16>(&basik::WAVELENGTH_MODULATION_OFFSET).await.unwrap(),
        -250
    );
}

#[tokio::test]
async fn scaled_power_reads_in_milliwatts() {
    let (sim, access) = basik_on_com1().await;
    sim.set_register("COM1", 1, 0x17, &1234u16.to_le_bytes());

    assert_eq!(
        access.read_physical(&basik::OUTPUT_POWER).await.unwrap(),
        RegisterValue::Number(12.34)
    );

    access
        .write_physical(&basik::OUTPUT_POWER_SETPOINT, 20.01)
        .await
        .unwrap();
    assert_eq!(sim.register("COM1", 1, 0x22).unwrap(), 2001u16.to_le_bytes());
}

#[tokio::test]
async fn both_frequency_slots_are_independent() {
    let (sim, access) = basik_on_com1().await;
    sim.set_register("COM1", 1, 0xB8, &[0; 8]);

    access
        .write_physical(&basik::WAVELENGTH_MODULATION_FREQUENCY_1, 10.0)
        .await
        .unwrap();
    access
        .write_physical(&basik::WAVELENGTH_MODULATION_FREQUENCY_2, 250.0)
        .await
        .unwrap();

    assert_eq!(
        access.read::<f32>(&basik::WAVELENGTH_MODULATION_FREQUENCY_1).await.unwrap(),
        10.0
    );
    assert_eq!(
        access.read::<f32>(&basik::WAVELENGTH_MODULATION_FREQUENCY_2).await.unwrap(),
        250.0
    );

    let err = access
        .write_physical(&basik::WAVELENGTH_MODULATION_FREQUENCY_2, 2e5)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Encoding(EncodingError::ValueOutOfRange { .. })));
}

#[tokio::test(start_paused = true)]
async fn busy_surfaces_on_first_read() {
    let (sim, access) = basik_on_com1().await;
    sim.set_register("COM1", 1, 0x1C, &215i16.to_le_bytes());
    sim.script_read_codes([RegisterCode(3), RegisterCode(3)]);
    let reads_before = sim.read_count();

    let err = access.read::<i16>(&basik::MODULE_TEMPERATURE).await.unwrap_err();
    assert!(matches!(err, Error::Comm(CommError::Busy)));
    assert_eq!(sim.read_count(), reads_before + 1);

    // The caller decides to retry.
    access.read::<i16>(&basik::MODULE_TEMPERATURE).await.unwrap_err();
    let celsius = access.read_physical(&basik::MODULE_TEMPERATURE).await.unwrap();
    assert_eq!(celsius.as_number(), Some(21.5));
}

#[tokio::test]
async fn timeout_and_port_errors_are_distinct() {
    let (sim, access) = basik_on_com1().await;
    sim.script_read_codes([RegisterCode(6), RegisterCode(10)]);

    let err = access.device_type().await.unwrap_err();
    assert!(matches!(err, Error::Comm(CommError::Timeout)));
    let err = access.device_type().await.unwrap_err();
    assert!(matches!(err, Error::Comm(CommError::PortError { code: 10, .. })));
}

#[tokio::test]
async fn status_and_setup_words() {
    let (sim, access) = basik_on_com1().await;
    sim.set_register("COM1", 1, 0x66, &0x8001u16.to_le_bytes());
    sim.set_register("COM1", 1, 0x31, &0x0010u16.to_le_bytes());
    sim.set_register("COM1", 1, 0x67, &3u16.to_le_bytes());

    let status = access.read_status(&basik::STATUS).await.unwrap();
    assert_eq!(status.labels(), ["emission", "error code present"]);
    assert!(status.contains("error code present"));

    let setup = access.read_status(&basik::SETUP).await.unwrap();
    assert_eq!(setup.labels(), ["internal wavelength modulation"]);

    assert_eq!(basik::describe_error(access.error_code().await.unwrap()), "low voltage");
}

#[tokio::test]
async fn extreme_interlock_and_power() {
    let sim = Arc::new(SimulatedBus::new());
    sim.add_module("COM4", 15, 0x60);
    sim.set_register("COM4", 15, 0x32, &[0, 2]);
    let bus = Bus::new(sim.clone(), DiscoveryConfig::default());
    let access = bus.access(bus.discover(&extreme::SIGNATURE).await.unwrap());

    let pair: RawPair = access.read(&extreme::INTERLOCK).await.unwrap();
    assert_eq!(extreme::interlock_state(pair), "door switch open");

    access.write_physical(&extreme::POWER_LEVEL, 42.5).await.unwrap();
    assert_eq!(sim.register("COM4", 15, 0x37).unwrap(), 425u16.to_le_bytes());

    let err = access.write_physical(&extreme::POWER_LEVEL, 101.0).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(EncodingError::ValueOutOfRange { .. })));
    assert_eq!(sim.write_count(), 1);
}

#[tokio::test]
async fn serial_number_is_ascii() {
    let sim = Arc::new(SimulatedBus::new());
    sim.add_module("COM2", 19, 0x67);
    sim.set_register("COM2", 19, 0x65, b"SEL-20391\0");
    let bus = Bus::new(sim, DiscoveryConfig::default());
    let access = bus.access(bus.discover(&select::SIGNATURE).await.unwrap());

    assert_eq!(access.serial_number().await.unwrap(), "SEL-20391");
    assert_eq!(
        access.read_physical(&interbus::register::common::SERIAL_NUMBER).await.unwrap(),
        RegisterValue::Text("SEL-20391".into())
    );
}
