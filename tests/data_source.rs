// ==============================================
// DATA SOURCE INTEGRATION TESTS
// ==============================================
//
// Buffered and unbuffered mutation flows end to end, query aggregation
// reaching the provider, and commit failure handling.

use itemstore::builder::DataSourceBuilder;
use itemstore::error::{PersistenceError, StoreError};
use itemstore::provider::{FnCommitHandler, InMemoryProvider, RecordingCommitHandler, ValueIdentity};
use itemstore::query::{FilterValue, QueryConfig, QueryFilter, QuerySort, SortDirection};
use itemstore::traits::QueryConfigProvider;

/// Provider filter reading `min` from the query parameters and honoring the
/// first sort's direction.
fn numbers(n: i64) -> InMemoryProvider<i64> {
    InMemoryProvider::new((1..=n).collect())
        .with_predicate(|item, query| match query.parameter("min") {
            Some(FilterValue::Int(min)) => item >= min,
            _ => true,
        })
        .with_comparator(|a, b, query: &QueryConfig| match query.sorts().first() {
            Some(sort) if sort.direction == SortDirection::Descending => b.cmp(a),
            _ => a.cmp(b),
        })
}

struct Descending;

impl QueryConfigProvider for Descending {
    fn sorts(&self) -> Vec<QuerySort> {
        vec![QuerySort::desc("value")]
    }
}

#[test]
fn buffered_session_commits_once_and_persists() {
    let backing = std::sync::Arc::new(std::sync::Mutex::new(vec!["a", "b", "c"]));
    let sink = std::sync::Arc::clone(&backing);
    let persist = move |added: &[&'static str],
                        _modified: &[&'static str],
                        removed: &[&'static str]|
          -> Result<(), PersistenceError> {
        let mut rows = sink.lock().map_err(|_| PersistenceError::new("sink poisoned"))?;
        rows.retain(|row| !removed.contains(row));
        rows.extend_from_slice(added);
        Ok(())
    };
    let handler = FnCommitHandler::new(persist);

    let provider = InMemoryProvider::new(vec!["a", "b", "c"]);
    let mut source = DataSourceBuilder::new(provider, ValueIdentity)
        .batch_size(2)
        .buffered(true)
        .commit_handler(handler)
        .build();

    source.add("d").unwrap();
    assert!(source.remove(&"b").unwrap());
    assert_eq!(source.get_item_ids().unwrap(), vec!["d", "a", "c"]);

    source.commit().unwrap();
    assert!(!source.is_modified());

    let persisted = backing.lock().unwrap().clone();
    assert_eq!(persisted, vec!["a", "c", "d"]);

    // the provider now reflects what the handler wrote
    source.store().provider().replace_items(persisted);
    source.refresh();
    assert_eq!(source.get_item_ids().unwrap(), vec!["a", "c", "d"]);
}

#[test]
fn failed_commit_can_be_retried() {
    let handler = RecordingCommitHandler::new();
    let mut source = DataSourceBuilder::new(InMemoryProvider::new(vec![1u32, 2, 3]), ValueIdentity)
        .buffered(true)
        .commit_handler(handler.clone())
        .build();

    source.remove_at(0).unwrap();
    source.update(3).unwrap();
    handler.reject_commits(true);
    assert!(matches!(source.commit(), Err(StoreError::Persistence(_))));
    assert_eq!(source.removed_items(), vec![1]);
    assert_eq!(source.modified_items(), vec![3]);

    handler.reject_commits(false);
    source.commit().unwrap();
    let records = handler.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].removed, vec![1]);
    assert_eq!(records[0].modified, vec![3]);
}

#[test]
fn refresh_with_pending_removal_keeps_size_cheap() {
    let mut source = DataSourceBuilder::new(numbers(10_000), ValueIdentity)
        .batch_size(50)
        .max_cache_size(4)
        .buffered(true)
        .commit_handler(RecordingCommitHandler::new())
        .build();

    source.remove_at(0).unwrap();
    source.refresh();
    source.store().provider().reset_stats();

    assert_eq!(source.size().unwrap(), 9_999);
    assert_eq!(source.store().provider().load_calls(), 0);
    assert_eq!(source.store().provider().count_calls(), 1);
    assert_eq!(source.get_item(0).unwrap(), 2);
    assert_eq!(source.removed_items(), vec![1]);
}

#[test]
fn unbuffered_mutations_never_touch_overlay() {
    let handler = RecordingCommitHandler::new();
    let mut source = DataSourceBuilder::new(InMemoryProvider::new(vec!["x", "y"]), ValueIdentity)
        .commit_handler(handler.clone())
        .build();

    source.add("z").unwrap();
    source.update("x").unwrap();
    source.remove_at(1).unwrap();

    assert!(!source.is_modified());
    assert_eq!(source.size().unwrap(), 2);
    let records = handler.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].removed, vec!["y"]);
}

#[test]
fn mode_switch_round_trip() {
    let handler = RecordingCommitHandler::new();
    let mut source = DataSourceBuilder::new(InMemoryProvider::new(vec![1u8]), ValueIdentity)
        .commit_handler(handler.clone())
        .build();

    assert!(matches!(source.commit(), Err(StoreError::IllegalState(_))));
    source.set_buffered(true).unwrap();
    source.add(2).unwrap();
    assert!(handler.is_empty());
    assert_eq!(source.size().unwrap(), 2);

    source.set_buffered(false).unwrap();
    assert!(!source.is_modified());
    assert_eq!(source.size().unwrap(), 1);
}

#[test]
fn query_contributions_shape_provider_results() {
    let mut source = DataSourceBuilder::new(numbers(20), ValueIdentity)
        .batch_size(5)
        .parameter("min", 15)
        .build();
    assert_eq!(source.size().unwrap(), 6);
    assert_eq!(source.get_item(0).unwrap(), 15);

    source.add_query_provider(Descending);
    assert_eq!(source.get_item(0).unwrap(), 20);

    source.set_parameter("min", 18);
    assert_eq!(source.items(0..3).unwrap(), vec![20, 19, 18]);

    source.set_fixed_filter(Some(QueryFilter::eq("parity", "even")));
    assert_eq!(
        source.query().filter().map(ToString::to_string).as_deref(),
        Some("parity = 'even'")
    );
}

#[test]
fn default_sort_is_replaced_by_provider_sort() {
    let source = DataSourceBuilder::new(numbers(3), ValueIdentity)
        .default_sort(QuerySort::asc("value"))
        .query_provider(Descending)
        .build();
    assert_eq!(source.query().sorts(), &[QuerySort::desc("value")]);
}
