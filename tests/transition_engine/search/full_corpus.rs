//! Full-Corpus Search Tests
//!
//! The first active search loads every page exactly once, de-duplicated by
//! id, and filters the whole corpus rather than the window.

use crate::*;
use proptest::prelude::*;

// =============================================================================
// SINGLE SEARCH
// =============================================================================

#[tokio::test]
async fn test_search_from_cold_cache_fetches_every_page_once() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());

    let hits = pitlane.service_tickets.search("NGUYEN").await.unwrap();

    assert_eq!(ids(&hits), ids_matching(&corpus, "nguyen"));
    assert_eq!(hits.len(), 9);
    assert_eq!(
        transport.fetch_log(),
        vec![
            (EntityKind::ServiceTicket, 0),
            (EntityKind::ServiceTicket, 1),
            (EntityKind::ServiceTicket, 2),
        ]
    );
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::FullyLoaded);
}

#[tokio::test]
async fn test_search_reaches_beyond_the_window() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());
    let window = pitlane.service_tickets.load_page(0).await.unwrap();

    let in_window = ids_matching(&window, "nguyen");
    let hits = pitlane.service_tickets.search("nguyen").await.unwrap();
    assert!(hits.len() > in_window.len());
    assert!(ids(&hits).contains(&EntityId::from(18u64)));

    // Page 0 was not fetched again, and the window did not move
    assert_eq!(transport.fetch_count(), 3);
    assert_eq!(ids(&pitlane.service_tickets.window()), ids(&corpus[..6]));
}

#[tokio::test]
async fn test_preloaded_middle_page_is_not_duplicated() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());
    pitlane.service_tickets.load_page(1).await.unwrap();

    let everything = pitlane
        .service_tickets
        .query(&Predicate::custom(|_| true))
        .await
        .unwrap();
    assert_eq!(ids(&everything), ids(&corpus));
    assert_eq!(
        transport.fetch_log(),
        vec![
            (EntityKind::ServiceTicket, 1),
            (EntityKind::ServiceTicket, 0),
            (EntityKind::ServiceTicket, 2),
        ]
    );
}

#[tokio::test]
async fn test_repeated_searches_stay_local() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(18));

    pitlane.service_tickets.search("nguyen").await.unwrap();
    pitlane.service_tickets.search("tran").await.unwrap();
    pitlane.service_tickets.search("51F-007").await.unwrap();
    assert_eq!(transport.fetch_count(), 3);
}

#[tokio::test]
async fn test_search_matches_any_default_field() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(18));

    let by_plate = pitlane.service_tickets.search("51f-012").await.unwrap();
    assert_eq!(ids(&by_plate), vec![EntityId::from(12u64)]);
    let by_code = pitlane.service_tickets.search("st-0003").await.unwrap();
    assert_eq!(ids(&by_code), vec![EntityId::from(3u64)]);

    let by_field = pitlane
        .service_tickets
        .query(&Predicate::text_in("ST-0003", ["customerName"]))
        .await
        .unwrap();
    assert!(by_field.is_empty());
}

#[tokio::test]
async fn test_no_match_is_empty_not_an_error() {
    let (pitlane, transport) = open(Role::Receptionist);
    transport.seed(service_tickets(7));

    assert!(pitlane.service_tickets.search("zzz").await.unwrap().is_empty());
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::FullyLoaded);
}

#[tokio::test]
async fn test_empty_backend_is_fully_loaded_after_one_fetch() {
    let (pitlane, transport) = open(Role::Receptionist);

    assert!(pitlane.payroll.search("march").await.unwrap().is_empty());
    assert_eq!(transport.fetch_count(), 1);
    assert_eq!(pitlane.payroll.load_state(), LoadState::FullyLoaded);
}

#[tokio::test]
async fn test_latest_page_count_bounds_the_load() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(9);
    transport.seed_pages(
        EntityKind::ServiceTicket,
        vec![corpus[..3].to_vec(), corpus[3..6].to_vec(), corpus[6..].to_vec()],
    );

    let all = pitlane.service_tickets.query(&Predicate::custom(|_| true)).await.unwrap();
    assert_eq!(all.len(), 9);
    assert_eq!(transport.fetch_count(), 3);
    assert_eq!(
        pitlane.engine().cache(EntityKind::ServiceTicket).total_pages(),
        Some(3)
    );
}

#[tokio::test]
async fn test_id_on_several_pages_keeps_latest_copy() {
    let (pitlane, transport) = open(Role::Receptionist);
    let ticket = |id: &str, name: &str| {
        Entity::new(id, ServiceTicketStatus::Created).with_field("customerName", name)
    };
    transport.seed_pages(
        EntityKind::ServiceTicket,
        vec![
            vec![ticket("t-1", "Nguyen Van An"), ticket("dup", "Walk-in")],
            vec![ticket("t-2", "Tran Thi Binh"), ticket("t-3", "Nguyen Thi Ba")],
            vec![ticket("dup", "Nguyen Van Moi"), ticket("t-4", "Le Van Cuong")],
        ],
    );
    let window = pitlane.service_tickets.load_page(0).await.unwrap();
    assert_eq!(window[1].text("customerName"), Some("Walk-in"));

    let hits = pitlane.service_tickets.search("nguyen").await.unwrap();
    assert_eq!(
        ids(&hits),
        vec![EntityId::from("t-1"), EntityId::from("t-3"), EntityId::from("dup")]
    );
    assert_eq!(hits[2].text("customerName"), Some("Nguyen Van Moi"));

    let everything = pitlane
        .service_tickets
        .query(&Predicate::custom(|_| true))
        .await
        .unwrap();
    assert_eq!(everything.len(), 5);
    assert_eq!(ids(&everything).iter().filter(|id| id.as_str() == "dup").count(), 1);

    // The window still lists page 0, now showing the merged record
    let window = pitlane.service_tickets.window();
    assert_eq!(ids(&window), vec![EntityId::from("t-1"), EntityId::from("dup")]);
    assert_eq!(window[1].text("customerName"), Some("Nguyen Van Moi"));
    assert!(pitlane.service_tickets.search("walk-in").await.unwrap().is_empty());
}

// =============================================================================
// CREATED ENTITIES AND FAILURES
// =============================================================================

#[tokio::test]
async fn test_created_entity_is_searchable_and_last() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(12);
    transport.seed(corpus.clone());
    pitlane.service_tickets.load_page(0).await.unwrap();

    let mut fields = Payload::new();
    fields.insert("customerName".into(), json!("Nguyen Walk-in"));
    let created = pitlane.service_tickets.create(fields).await.unwrap();
    assert_eq!(created.status, Status::from(ServiceTicketStatus::Created));

    let hits = pitlane.service_tickets.search("nguyen").await.unwrap();
    let mut expected = ids_matching(&corpus, "nguyen");
    expected.push(created.id.clone());
    assert_eq!(ids(&hits), expected);
}

#[tokio::test]
async fn test_failed_full_load_can_be_retried() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());
    pitlane.service_tickets.load_page(0).await.unwrap();
    transport.fail_fetches(TransportError::http(502, "bad gateway"));

    let err = pitlane.service_tickets.search("nguyen").await.unwrap_err();
    assert_eq!(err.error_code(), "RemoteError");
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::PartiallyLoaded);

    transport.clear_failures();
    transport.reset_counters();
    let hits = pitlane.service_tickets.search("nguyen").await.unwrap();
    assert_eq!(ids(&hits), ids_matching(&corpus, "nguyen"));
    assert_eq!(transport.fetch_count(), 2);
}

// =============================================================================
// CONCURRENT SEARCHES
// =============================================================================

#[tokio::test]
async fn test_concurrent_searches_share_one_full_load() {
    let (pitlane, transport) = open(Role::Receptionist);
    let corpus = service_tickets(18);
    transport.seed(corpus.clone());
    let gate = transport.pause_fetches();

    let first = {
        let tickets = pitlane.service_tickets.clone();
        tokio::spawn(async move { tickets.search("nguyen").await })
    };
    let second = {
        let tickets = pitlane.service_tickets.clone();
        tokio::spawn(async move { tickets.search("tran").await })
    };
    gate.entered().await;
    gate.open();

    let nguyen = first.await.unwrap().unwrap();
    let tran = second.await.unwrap().unwrap();
    assert_eq!(ids(&nguyen), ids_matching(&corpus, "nguyen"));
    assert_eq!(ids(&tran), ids_matching(&corpus, "tran"));
    assert_eq!(transport.fetch_count(), 3);
}

// =============================================================================
// PROPERTY: SEARCH EQUALS FILTERING THE BACKEND
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_search_equals_backend_filter(
        n in 0u64..40,
        preload in proptest::option::of(0usize..8),
        needle in prop::sample::select(vec!["nguyen", "van", "THI", "binh", "gia", "xyz"]),
    ) {
        let corpus = service_tickets(n);
        let expected = ids_matching(&corpus, needle);
        let pages = (n as usize).div_ceil(6).max(1);

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (hits, fetches, len) = runtime.block_on(async {
            let (pitlane, transport) = open(Role::Receptionist);
            transport.seed(corpus.clone());
            if let Some(page) = preload {
                pitlane.service_tickets.load_page(page).await.unwrap();
            }
            let hits = pitlane.service_tickets.search(needle).await.unwrap();
            let len = pitlane.engine().cache(EntityKind::ServiceTicket).len();
            (hits, transport.fetch_count(), len)
        });

        prop_assert_eq!(ids(&hits), expected);
        prop_assert_eq!(len, n as usize);
        // A preloaded page beyond the end costs one extra fetch
        let extra = usize::from(matches!(preload, Some(p) if p >= pages));
        prop_assert_eq!(fetches, pages + extra);
    }
}
