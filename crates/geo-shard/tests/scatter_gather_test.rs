use geo_shard::{
    AggregateQuery, Country, GeoShards, InMemoryConnector, ListParams, Predicate, Probe,
    ProbeMode, ShardClient, ShardConfig, ShardEntity, ShardError, ShardKey, SortOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Contact {
    id: String,
    email: String,
    country: String,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    created_at: u64,
}

#[derive(Debug)]
struct ContactCreate {
    email: String,
    country: String,
    state: Option<String>,
    score: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
enum ContactError {
    #[error(transparent)]
    Shard(#[from] ShardError),
}

impl ShardEntity for Contact {
    type Create = ContactCreate;
    type Update = ();
    type Error = ContactError;

    const COLLECTION: &'static str = "contacts";
    const SEARCH_FIELDS: &'static [&'static str] = &["email"];
    const DEDUP_FIELD: &'static str = "email";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create_params(params: ContactCreate, created_at: u64) -> Result<Self, ContactError> {
        Ok(Self {
            id: String::new(),
            email: params.email,
            country: params.country,
            state: params.state,
            score: params.score,
            created_at,
        })
    }

    fn on_update(&mut self, _update: ()) -> Result<(), ContactError> {
        Ok(())
    }
}

struct Contacts {
    shards: GeoShards,
}

impl ShardClient<Contact> for Contacts {
    fn shards(&self) -> &GeoShards {
        &self.shards
    }
}

fn setup(config: ShardConfig) -> (Arc<InMemoryConnector>, Contacts) {
    let connector = Arc::new(InMemoryConnector::new(32));
    let shards = GeoShards::new(connector.clone(), config);
    (connector, Contacts { shards })
}

async fn add(contacts: &Contacts, email: &str, country: &str, state: Option<&str>, score: Option<i64>) -> Contact {
    contacts
        .shards
        .place::<Contact>(Some(country), state)
        .await
        .unwrap()
        .create(ContactCreate {
            email: email.to_string(),
            country: country.to_string(),
            state: state.map(str::to_string),
            score,
        })
        .await
        .unwrap()
}

fn emails(contacts: &[Contact]) -> Vec<&str> {
    contacts.iter().map(|c| c.email.as_str()).collect()
}

#[tokio::test]
async fn test_all_countries_newest_first() {
    let (_, contacts) = setup(ShardConfig::default());
    let a = add(&contacts, "a@x.com", "IN", Some("West Bengal"), None).await;
    let b = add(&contacts, "b@x.com", "US", None, None).await;
    assert!(a.created_at < b.created_at);
    assert!(a.id.starts_with("contacts-in-wb-"));
    assert!(b.id.starts_with("contacts-us-"));

    let page = contacts.list(ListParams::default()).await.unwrap();
    assert_eq!(emails(&page.items), ["b@x.com", "a@x.com"]);
    assert_eq!(page.total, 2);
    assert!(!page.partial);
    assert!(page.skipped.is_empty());
}

#[tokio::test]
async fn test_duplicate_in_two_shards_counts_once() {
    let (_, contacts) = setup(ShardConfig::default());
    add(&contacts, "dup@x.com", "IN", Some("West Bengal"), None).await;
    add(&contacts, "dup@x.com", "IN", Some("Maharashtra"), None).await;
    add(&contacts, "solo@x.com", "IN", Some("Kerala"), None).await;
    add(&contacts, "us@x.com", "US", None, None).await;

    let mut raw = 0;
    for shard in ShardKey::for_country(Country::In) {
        let repo = contacts.shards.repository::<Contact>(shard).await.unwrap();
        raw += repo.count(geo_shard::Filter::all()).await.unwrap();
    }
    assert_eq!(raw, 3);

    let params = ListParams {
        country: "IN".into(),
        ..ListParams::default()
    };
    let page = contacts.list(params).await.unwrap();
    assert_eq!(page.total, raw - 1);
    assert_eq!(
        page.items.iter().filter(|c| c.email == "dup@x.com").count(),
        1
    );
    assert!(!emails(&page.items).contains(&"us@x.com"));
}

#[tokio::test]
async fn test_pages_reproduce_sorted_set() {
    let (_, contacts) = setup(ShardConfig::default());
    let places = [
        ("IN", Some("Delhi")),
        ("US", None),
        ("EU", None),
        ("IN", Some("Tamil Nadu")),
        ("IN", None),
    ];
    for i in 0..13 {
        let (country, state) = places[i % places.len()];
        add(&contacts, &format!("user{i:02}@x.com"), country, state, Some(i as i64 % 4)).await;
    }
    add(&contacts, "user03@x.com", "IN", Some("Rajasthan"), Some(9)).await;

    let full = contacts
        .list_query(AggregateQuery {
            sort_by: "score".into(),
            order: SortOrder::Asc,
            page_size: 100,
            ..AggregateQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(full.total, 13);

    let mut rebuilt = Vec::new();
    for page in 1..=5 {
        let part = contacts
            .list_query(AggregateQuery {
                sort_by: "score".into(),
                order: SortOrder::Asc,
                page,
                page_size: 4,
                ..AggregateQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(part.total, 13);
        rebuilt.extend(part.items);
    }
    assert_eq!(rebuilt, full.items);

    let scores: Vec<i64> = full.items.iter().filter_map(|c| c.score).collect();
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_missing_sort_values_last() {
    let (_, contacts) = setup(ShardConfig::default());
    add(&contacts, "none@x.com", "US", None, None).await;
    add(&contacts, "low@x.com", "EU", None, Some(1)).await;
    add(&contacts, "high@x.com", "IN", Some("Delhi"), Some(5)).await;

    for (order, expected) in [
        ("asc", ["low@x.com", "high@x.com", "none@x.com"]),
        ("desc", ["high@x.com", "low@x.com", "none@x.com"]),
    ] {
        let params = ListParams {
            sort_by: "score".into(),
            sort_order: order.into(),
            ..ListParams::default()
        };
        let page = contacts.list(params).await.unwrap();
        assert_eq!(emails(&page.items), expected);
    }
}

#[tokio::test]
async fn test_failing_shard_marks_page_partial() {
    let (connector, contacts) = setup(ShardConfig::default());
    add(&contacts, "us@x.com", "US", None, None).await;
    add(&contacts, "eu@x.com", "EU", None, None).await;
    add(&contacts, "wb@x.com", "IN", Some("West Bengal"), None).await;

    connector.fail_shard(ShardKey::EU).await;
    let page = contacts.list(ListParams::default()).await.unwrap();
    assert_eq!(emails(&page.items), ["wb@x.com", "us@x.com"]);
    assert_eq!(page.total, 2);
    assert!(page.partial);
    assert_eq!(page.skipped, vec![ShardKey::EU]);

    let body = serde_json::to_value(&page).unwrap();
    assert_eq!(body["skipped"], json!(["EU"]));
    assert_eq!(body["partial"], json!(true));
}

#[tokio::test]
async fn test_slow_shard_times_out() {
    let config = ShardConfig {
        query_timeout_ms: 50,
        ..ShardConfig::default()
    };
    let (connector, contacts) = setup(config);
    add(&contacts, "fast@x.com", "US", None, None).await;
    add(&contacts, "slow@x.com", "IN", Some("Delhi"), None).await;

    let dl = ShardKey::india_state("DL").unwrap();
    connector.set_latency(dl, Duration::from_millis(500)).await;

    let page = contacts.list(ListParams::default()).await.unwrap();
    assert_eq!(emails(&page.items), ["fast@x.com"]);
    assert_eq!(page.skipped, vec![dl]);

    // The locator skips the slow shard too.
    let found = contacts
        .shards
        .locator()
        .locate::<Contact>(&Probe::new("email", "slow@x.com"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_search_state_and_extra_filters() {
    let (_, contacts) = setup(ShardConfig::default());
    add(&contacts, "alice@x.com", "IN", Some("Delhi"), Some(3)).await;
    add(&contacts, "alicia@x.com", "IN", Some("Goa"), Some(7)).await;
    add(&contacts, "bob@x.com", "IN", Some("Delhi"), Some(8)).await;
    add(&contacts, "a.l.i@x.com", "US", None, Some(1)).await;

    let params = ListParams {
        search: Some("ALI".into()),
        ..ListParams::default()
    };
    let page = contacts.list(params).await.unwrap();
    assert_eq!(page.total, 2);

    let params = ListParams {
        search: Some("ali".into()),
        state: Some("delhi".into()),
        ..ListParams::default()
    };
    let page = contacts.list(params).await.unwrap();
    assert_eq!(emails(&page.items), ["alice@x.com"]);

    // "." is matched literally.
    let params = ListParams {
        search: Some("a.l".into()),
        ..ListParams::default()
    };
    let page = contacts.list(params).await.unwrap();
    assert_eq!(emails(&page.items), ["a.l.i@x.com"]);

    let query = AggregateQuery {
        country: Some(Country::In),
        ..AggregateQuery::default()
    }
    .with_filter(Predicate::range("score", Some(json!(5)), None));
    let page = contacts.list_query(query).await.unwrap();
    assert_eq!(emails(&page.items), ["bob@x.com", "alicia@x.com"]);
}

#[tokio::test]
async fn test_get_and_delete_by_id() {
    for mode in [ProbeMode::Sequential, ProbeMode::Race] {
        let config = ShardConfig {
            probe_mode: mode,
            ..ShardConfig::default()
        };
        let (_, contacts) = setup(config);
        let rj = add(&contacts, "rj@x.com", "IN", Some("Rajasthan"), None).await;

        let fetched = contacts.get(&rj.id).await.unwrap().unwrap();
        assert_eq!(fetched, rj);

        contacts.delete(&rj.id).await.unwrap();
        assert!(contacts.get(&rj.id).await.unwrap().is_none());
        assert!(matches!(
            contacts.delete(&rj.id).await,
            Err(ContactError::Shard(ShardError::NotFoundAcrossShards { .. }))
        ));
    }
}

#[tokio::test]
async fn test_write_falls_back_when_home_shard_is_down() {
    let (connector, contacts) = setup(ShardConfig::default());
    let wb = ShardKey::india_state("WB").unwrap();
    connector.fail_shard(wb).await;

    let placed = add(&contacts, "moved@x.com", "IN", Some("West Bengal"), None).await;
    assert!(placed.id.starts_with("contacts-in-default-"));
    assert_eq!(placed.state.as_deref(), Some("West Bengal"));
}

#[tokio::test]
async fn test_unknown_country_rejected() {
    let (_, contacts) = setup(ShardConfig::default());
    let params = ListParams {
        country: "ZZ".into(),
        ..ListParams::default()
    };
    assert!(matches!(
        contacts.list(params).await,
        Err(ContactError::Shard(ShardError::InvalidQuery(_)))
    ));
}
