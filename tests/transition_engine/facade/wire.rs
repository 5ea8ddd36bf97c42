//! Wire Format Tests
//!
//! The facade over `JsonTransport`, with a backend that answers in each of
//! the list envelopes the garage API uses.

use crate::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `[ ... ]`, whole corpus at once
    Bare,
    /// `{ "data": [ ... ] }`, whole corpus at once
    Data,
    /// `{ "content": [...], "totalPages": n, "totalElements": m }`
    Paged,
    /// `{ "result": { "content": [...], "totalPages": n } }`
    Wrapped,
    /// `{ "content": [...], "totalElements": m }`
    Counted,
}

struct ShapedBackend {
    shape: Shape,
    echo: bool,
    records: Mutex<Vec<Value>>,
    list_calls: Mutex<Vec<usize>>,
    status_bodies: Mutex<Vec<(EntityId, Value)>>,
    auth: Mutex<Vec<Option<String>>>,
}

impl ShapedBackend {
    fn new(shape: Shape, records: Vec<Value>) -> Self {
        Self {
            shape,
            echo: true,
            records: Mutex::new(records),
            list_calls: Mutex::new(Vec::new()),
            status_bodies: Mutex::new(Vec::new()),
            auth: Mutex::new(Vec::new()),
        }
    }

    fn silent(mut self) -> Self {
        self.echo = false;
        self
    }
}

fn wire_id(record: &Value) -> String {
    match &record["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl JsonBackend for ShapedBackend {
    async fn get_list(
        &self,
        ctx: &SessionContext,
        _kind: EntityKind,
        page: usize,
        page_size: usize,
    ) -> std::result::Result<Value, TransportError> {
        self.list_calls.lock().push(page);
        self.auth.lock().push(ctx.authorization_header());
        let records = self.records.lock().clone();
        let total = records.len();
        let pages = total.div_ceil(page_size).max(1);
        let slice: Vec<Value> = records
            .iter()
            .skip(page * page_size)
            .take(page_size)
            .cloned()
            .collect();
        Ok(match self.shape {
            Shape::Bare => Value::Array(records),
            Shape::Data => json!({ "data": records }),
            Shape::Paged => json!({ "content": slice, "totalPages": pages, "totalElements": total }),
            Shape::Wrapped => json!({ "result": { "content": slice, "totalPages": pages } }),
            Shape::Counted => json!({ "content": slice, "totalElements": total }),
        })
    }

    async fn post_status(
        &self,
        ctx: &SessionContext,
        _kind: EntityKind,
        id: &EntityId,
        body: Value,
    ) -> std::result::Result<Value, TransportError> {
        self.auth.lock().push(ctx.authorization_header());
        self.status_bodies.lock().push((id.clone(), body.clone()));
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| wire_id(r) == id.as_str())
            .ok_or_else(|| TransportError::http(404, format!("no record {}", id)))?;
        if let (Value::Object(record), Value::Object(body)) = (record, body) {
            record.extend(body);
            record.insert("updatedBy".into(), json!("u-1"));
            if self.echo {
                return Ok(json!({ "result": Value::Object(record.clone()) }));
            }
        }
        Ok(json!({ "message": "updated" }))
    }

    async fn post_create(
        &self,
        _ctx: &SessionContext,
        _kind: EntityKind,
        body: Value,
    ) -> std::result::Result<Value, TransportError> {
        let mut records = self.records.lock();
        let mut reply = body;
        reply["id"] = json!(records.len() + 1);
        // The reply leaves the initial status implicit
        let mut stored = reply.clone();
        stored["status"] = json!("CREATED");
        records.push(stored);
        Ok(json!({ "data": reply }))
    }
}

/// Wire form of `service_tickets(n)`, with numeric ids
fn wire_tickets(n: u64) -> Vec<Value> {
    service_tickets(n)
        .into_iter()
        .zip(1u64..)
        .map(|(entity, i)| {
            let mut map = entity.fields.clone();
            map.insert("id".into(), json!(i));
            map.insert("status".into(), json!(entity.status.as_str()));
            Value::Object(map)
        })
        .collect()
}

fn open_json(backend: ShapedBackend) -> (Pitlane, Arc<JsonTransport<ShapedBackend>>) {
    init_tracing();
    let transport = Arc::new(JsonTransport::new(backend));
    let pitlane = Pitlane::builder()
        .shared_transport(transport.clone())
        .context(SessionContext::new(Role::Receptionist).with_token("desk-token"))
        .open()
        .unwrap();
    (pitlane, transport)
}

// =============================================================================
// LIST ENVELOPES
// =============================================================================

#[tokio::test]
async fn test_search_over_every_list_shape() {
    let expected = ids_matching(&service_tickets(14), "nguyen");

    for (shape, fetches) in [
        (Shape::Bare, 1),
        (Shape::Data, 1),
        (Shape::Paged, 3),
        (Shape::Wrapped, 3),
        (Shape::Counted, 3),
    ] {
        let (pitlane, transport) = open_json(ShapedBackend::new(shape, wire_tickets(14)));

        let hits = pitlane.service_tickets.search("nguyen").await.unwrap();
        assert_eq!(ids(&hits), expected, "{:?}", shape);
        assert_eq!(transport.backend().list_calls.lock().len(), fetches, "{:?}", shape);
        assert_eq!(pitlane.service_tickets.load_state(), LoadState::FullyLoaded);
    }
}

#[tokio::test]
async fn test_numeric_ids_are_normalized() {
    let (pitlane, _transport) = open_json(ShapedBackend::new(Shape::Paged, wire_tickets(3)));
    pitlane.service_tickets.load_page(0).await.unwrap();

    let entity = pitlane.service_tickets.get(&EntityId::from("2")).unwrap();
    assert_eq!(entity.id, EntityId::from(2u64));
    assert_eq!(entity.text("code"), Some("ST-0002"));
    assert!(entity.field("id").is_none());
    assert!(entity.field("status").is_none());
}

#[tokio::test]
async fn test_undecodable_page_fails_the_load() {
    let mut records = wire_tickets(3);
    records[1]["status"] = json!("ARCHIVED");
    let (pitlane, _transport) = open_json(ShapedBackend::new(Shape::Paged, records));

    let err = pitlane.service_tickets.load_page(0).await.unwrap_err();
    assert!(matches!(err, Error::Load(LoadError::Remote { .. })));
    assert!(err.to_string().contains("ARCHIVED"));
    assert_eq!(pitlane.service_tickets.load_state(), LoadState::Empty);
}

#[tokio::test]
async fn test_credentials_travel_with_every_call() {
    let (pitlane, transport) = open_json(ShapedBackend::new(Shape::Paged, wire_tickets(8)));
    pitlane.service_tickets.load_all().await.unwrap();
    pitlane.service_tickets.cancel(1u64).await.unwrap();

    let auth = transport.backend().auth.lock().clone();
    assert_eq!(auth.len(), 3);
    assert!(auth.iter().all(|h| h.as_deref() == Some("Bearer desk-token")));
}

// =============================================================================
// STATUS CHANGES
// =============================================================================

#[tokio::test]
async fn test_transition_body_and_echo() {
    let (pitlane, transport) = open_json(ShapedBackend::new(Shape::Wrapped, wire_tickets(4)));
    pitlane.service_tickets.load_page(0).await.unwrap();

    let settled = pitlane.service_tickets.send_quotation(3u64).await.unwrap();
    assert_eq!(settled.status, Status::from(ServiceTicketStatus::WaitingForQuotation));
    assert_eq!(settled.text("updatedBy"), Some("u-1"));

    let bodies = transport.backend().status_bodies.lock().clone();
    assert_eq!(
        bodies,
        vec![(EntityId::from(3u64), json!({ "status": "WAITING_FOR_QUOTATION" }))]
    );
}

#[tokio::test]
async fn test_reason_is_sent_alongside_status() {
    let records = vec![json!({ "id": "pr-1", "status": "PENDING", "code": "PR-0001" })];
    let backend = ShapedBackend::new(Shape::Data, records);
    let transport = Arc::new(JsonTransport::new(backend));
    let pitlane = Pitlane::builder()
        .shared_transport(transport.clone())
        .actor(Role::Manager)
        .open()
        .unwrap();
    pitlane.purchase_requests.load_page(0).await.unwrap();

    let rejected = pitlane
        .purchase_requests
        .reject("pr-1", "supplier discontinued part")
        .await
        .unwrap();
    assert_eq!(rejected.text("reason"), Some("supplier discontinued part"));

    let (_, body) = transport.backend().status_bodies.lock()[0].clone();
    assert_eq!(
        body,
        json!({ "status": "REJECTED", "reason": "supplier discontinued part" })
    );
}

#[tokio::test]
async fn test_reply_without_entity_confirms_target() {
    let (pitlane, _transport) =
        open_json(ShapedBackend::new(Shape::Paged, wire_tickets(2)).silent());
    pitlane.service_tickets.load_page(0).await.unwrap();

    let settled = pitlane.service_tickets.cancel(2u64).await.unwrap();
    assert_eq!(settled.status, Status::from(ServiceTicketStatus::Canceled));
    assert!(settled.field("updatedBy").is_none());
}

#[tokio::test]
async fn test_backend_not_found_rolls_back() {
    let (pitlane, transport) = open_json(ShapedBackend::new(Shape::Paged, wire_tickets(2)));
    pitlane.service_tickets.load_page(0).await.unwrap();
    transport.backend().records.lock().retain(|r| wire_id(r) != "1");

    let err = pitlane.service_tickets.cancel(1u64).await.unwrap_err();
    assert_eq!(err.error_code(), "RemoteError");
    assert!(err.to_string().contains("404"));
    assert_eq!(
        pitlane.service_tickets.status_of(&EntityId::from(1u64)),
        Some(ServiceTicketStatus::Created)
    );
}

// =============================================================================
// CREATION
// =============================================================================

#[tokio::test]
async fn test_create_decodes_wrapped_reply() {
    let (pitlane, transport) = open_json(ShapedBackend::new(Shape::Paged, wire_tickets(2)));
    let mut fields = Payload::new();
    fields.insert("customerName".into(), json!("Le Thi Hoa"));

    let created = pitlane.service_tickets.create(fields).await.unwrap();
    assert_eq!(created.id, EntityId::from(3u64));
    assert_eq!(created.status, Status::from(ServiceTicketStatus::Created));
    assert_eq!(created.text("customerName"), Some("Le Thi Hoa"));
    assert_eq!(transport.backend().records.lock().len(), 3);

    let hits = pitlane.service_tickets.search("thi hoa").await.unwrap();
    assert_eq!(ids(&hits), vec![EntityId::from(3u64)]);
}
