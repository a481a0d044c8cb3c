//! End-to-end GATT enumeration tests over the mock session.

use std::sync::Arc;

use desklink_core::gatt::GattCharacteristicHandle;
use desklink_core::mock::{MockGattSession, ReleaseEvent, ServiceBehavior};
use desklink_core::{CommunicationStatus, ConnectionStatus, GattEnumerator};
use uuid::Uuid;

const HEIGHT_SERVICE: Uuid = Uuid::from_u128(0x99FA_0001);
const HEIGHT_CHAR: Uuid = Uuid::from_u128(0x99FA_0002);
const CONTROL_SERVICE: Uuid = Uuid::from_u128(0x99FA_0010);
const CONTROL_CHAR: Uuid = Uuid::from_u128(0x99FA_0011);

#[tokio::test]
async fn test_refresh_builds_the_characteristic_lookup_table() {
    let session = Arc::new(
        MockGattSession::builder()
            .service(
                HEIGHT_SERVICE,
                ServiceBehavior::characteristics(vec![HEIGHT_CHAR]),
            )
            .service(
                CONTROL_SERVICE,
                ServiceBehavior::characteristics(vec![CONTROL_CHAR]),
            )
            .build(),
    );
    let enumerator = GattEnumerator::new(session);
    let mut refreshed = enumerator.refreshed();

    assert!(enumerator.refresh().await.is_success());
    assert_eq!(refreshed.try_recv().unwrap(), CommunicationStatus::Success);

    // Downstream lookup: service UUID to its characteristic handles.
    let cache = enumerator.cache();
    let view = cache.view();
    assert_eq!(view.len(), 2);
    let entry = view.get(&HEIGHT_SERVICE).unwrap();
    assert_eq!(entry.characteristics().len(), 1);
    assert_eq!(entry.characteristics()[0].uuid(), HEIGHT_CHAR);
}

#[tokio::test]
async fn test_second_refresh_releases_the_first_refreshs_handles() {
    let session = Arc::new(
        MockGattSession::builder()
            .service(
                HEIGHT_SERVICE,
                ServiceBehavior::characteristics(vec![HEIGHT_CHAR]),
            )
            .build(),
    );
    let log = session.release_log();
    let enumerator = GattEnumerator::new(session);

    assert!(enumerator.refresh().await.is_success());
    log.clear();

    assert!(enumerator.refresh().await.is_success());

    // The opening clear released the first refresh's entry, characteristics
    // before their service, before the new entry landed.
    let events = log.events();
    assert_eq!(events[0], ReleaseEvent::Characteristic(HEIGHT_CHAR));
    assert_eq!(events[1], ReleaseEvent::Service(HEIGHT_SERVICE));
    assert_eq!(enumerator.cache().len(), 1);
}

#[tokio::test]
async fn test_one_failing_service_leaves_the_rest_cached() {
    let session = Arc::new(
        MockGattSession::builder()
            .service(
                HEIGHT_SERVICE,
                ServiceBehavior::characteristics(vec![HEIGHT_CHAR]),
            )
            .service(Uuid::from_u128(0xBAD), ServiceBehavior::failure("timeout"))
            .service(
                CONTROL_SERVICE,
                ServiceBehavior::characteristics(vec![CONTROL_CHAR]),
            )
            .build(),
    );
    let enumerator = GattEnumerator::new(session);
    let mut refreshed = enumerator.refreshed();

    assert!(enumerator.refresh().await.is_success());

    let cache = enumerator.cache();
    assert_eq!(cache.len(), 2);
    {
        let view = cache.view();
        assert!(view.contains_key(&HEIGHT_SERVICE));
        assert!(view.contains_key(&CONTROL_SERVICE));
        assert!(!view.contains_key(&Uuid::from_u128(0xBAD)));
    }

    // Exactly one terminal event despite the mid-flight failure.
    assert_eq!(refreshed.try_recv().unwrap(), CommunicationStatus::Success);
    assert!(refreshed.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnected_peripheral_short_circuits() {
    let session = Arc::new(MockGattSession::builder().disconnected().build());
    let enumerator = GattEnumerator::new(Arc::clone(&session));
    let mut refreshed = enumerator.refreshed();

    assert_eq!(
        enumerator.refresh().await,
        CommunicationStatus::Unreachable
    );
    assert_eq!(
        refreshed.try_recv().unwrap(),
        CommunicationStatus::Unreachable
    );
    assert_eq!(session.services_call_count(), 0);

    // Reconnecting makes the next refresh succeed without a new enumerator.
    session.set_connection_status(ConnectionStatus::Connected);
    assert!(enumerator.refresh().await.is_success());
    assert_eq!(session.services_call_count(), 1);
}

#[tokio::test]
async fn test_every_subscriber_sees_the_terminal_status() {
    let session = Arc::new(MockGattSession::builder().build());
    let enumerator = GattEnumerator::new(session);
    let mut first = enumerator.refreshed();
    let mut second = enumerator.refreshed();

    assert!(enumerator.refresh().await.is_success());

    assert_eq!(first.try_recv().unwrap(), CommunicationStatus::Success);
    assert_eq!(second.try_recv().unwrap(), CommunicationStatus::Success);
}
