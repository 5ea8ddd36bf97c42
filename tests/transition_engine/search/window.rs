//! Window Tests
//!
//! Page-at-a-time browsing and the inactive-predicate path.

use crate::*;

#[tokio::test]
async fn test_first_page_is_the_window() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());

    let page = pitlane.service_tickets.load_page(0).await.unwrap();
    assert_eq!(ids(&page), ids(&corpus[..6]));
    assert_eq!(ids(&pitlane.service_tickets.window()), ids(&corpus[..6]));
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::PartiallyLoaded);
}

#[tokio::test]
async fn test_blank_search_returns_window_without_fetching() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());
    pitlane.service_tickets.load_page(0).await.unwrap();

    for needle in ["", "   ", "\t"] {
        let hits = pitlane.service_tickets.search(needle).await.unwrap();
        assert_eq!(ids(&hits), ids(&corpus[..6]), "needle {:?}", needle);
    }
    let unfiltered = pitlane.service_tickets.query(&Predicate::None).await.unwrap();
    assert_eq!(unfiltered.len(), 6);

    assert_eq!(transport.fetch_count(), 1);
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::PartiallyLoaded);
}

#[tokio::test]
async fn test_blank_search_before_any_load_is_empty() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(4));

    assert!(pitlane.service_tickets.search("").await.unwrap().is_empty());
    assert_eq!(transport.fetch_count(), 0);
}

#[tokio::test]
async fn test_paging_moves_the_window() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(14);
    transport.seed(corpus.clone());
    let cache = pitlane.engine().cache(EntityKind::ServiceTicket);

    pitlane.service_tickets.load_page(0).await.unwrap();
    pitlane.service_tickets.load_page(1).await.unwrap();
    assert_eq!(ids(&pitlane.service_tickets.window()), ids(&corpus[6..12]));
    assert_eq!(cache.current_page(), Some(1));

    let last = pitlane.service_tickets.load_page(2).await.unwrap();
    assert_eq!(ids(&last), ids(&corpus[12..]));
    assert_eq!(cache.total_pages(), Some(3));
    assert_eq!(cache.loaded_pages(), vec![0, 1, 2]);

    // Every page seen, but no full load was asked for
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::PartiallyLoaded);
    assert_eq!(cache.len(), 14);
}

#[tokio::test]
async fn test_reloading_a_page_overwrites_by_id() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(6));
    pitlane.service_tickets.load_page(0).await.unwrap();

    transport.upsert(
        Entity::new(2u64, ServiceTicketStatus::WaitingForQuotation)
            .with_field("customerName", "Renamed Customer"),
    );
    pitlane.service_tickets.load_page(0).await.unwrap();

    let id = EntityId::from(2u64);
    let entity = pitlane.service_tickets.get(&id).unwrap();
    assert_eq!(entity.text("customerName"), Some("Renamed Customer"));
    assert_eq!(
        pitlane.service_tickets.status_of(&id),
        Some(ServiceTicketStatus::WaitingForQuotation)
    );
    assert_eq!(pitlane.service_tickets.window().len(), 6);
}

#[tokio::test]
async fn test_failed_page_keeps_state() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(12));
    pitlane.service_tickets.load_page(0).await.unwrap();
    transport.fail_fetches(TransportError::Network("offline".into()));

    let err = pitlane.service_tickets.load_page(1).await.unwrap_err();
    assert!(matches!(err, Error::Load(LoadError::Remote { page: 1, .. })));
    assert!(err.is_retryable());
    assert_eq!(pitlane.service_tickets.window().len(), 6);
    assert_eq!(
        pitlane.engine().cache(EntityKind::ServiceTicket).current_page(),
        Some(0)
    );
}

#[tokio::test]
async fn test_refresh_forgets_pages() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(12));
    pitlane.service_tickets.load_all().await.unwrap();
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::FullyLoaded);

    pitlane.service_tickets.refresh();
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::Empty);
    assert!(pitlane.service_tickets.window().is_empty());
    assert!(pitlane.service_tickets.get(&EntityId::from(1u64)).is_none());

    transport.reset_counters();
    pitlane.service_tickets.search("nguyen").await.unwrap();
    assert_eq!(transport.fetch_count(), 2);
}
