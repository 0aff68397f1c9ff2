//! Property tests for the store handle contract.
//!
//! - put then get on the same key returns exactly what was put
//! - deleting an existing key makes it absent and lowers the count by one

use clinic_store::{Key, MemoryStore, Record, Schema, StoreHandle, Value};
use proptest::prelude::*;

fn field_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-zA-Z ]{0,12}".prop_map(Value::Text),
    ]
}

fn record_with_id(id: i64) -> impl Strategy<Value = Record> {
    prop::collection::vec(("[a-z]{1,6}", field_value()), 0..6).prop_map(move |fields| {
        let mut record: Record = fields
            .into_iter()
            .filter(|(name, _)| name != "id")
            .collect();
        record.set("id", id);
        record
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_put_get_round_trip(record in (1i64..1_000).prop_flat_map(record_with_id)) {
        let rt = runtime();
        rt.block_on(async {
            let store = MemoryStore::new(Schema::new("patients").auto_increment());
            let expected_key = record.key("id");

            let key = store.put(record.clone()).await.unwrap();
            prop_assert_eq!(Some(key.clone()), expected_key);
            prop_assert_eq!(store.get(&key).await.unwrap(), Some(record));
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_delete_lowers_count_by_one(n in 1usize..20, victim in 0usize..20) {
        let rt = runtime();
        rt.block_on(async {
            let store = MemoryStore::new(Schema::new("doctors").auto_increment());
            for i in 0..n {
                store.add(Record::new().with("first_name", format!("doc{i}"))).await.unwrap();
            }

            let victim = Key::Int(i64::try_from(victim % n).unwrap() + 1);
            let before = store.count().await.unwrap();
            store.delete(&victim).await.unwrap();

            prop_assert_eq!(store.get(&victim).await.unwrap(), None);
            prop_assert_eq!(store.count().await.unwrap(), before - 1);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
