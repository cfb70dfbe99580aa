use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

use service::storage::Collections;
use service::Services;

fn bench_user_lookups(c: &mut Criterion) {
    let services = Services::new(&Collections::in_memory());
    let rt = tokio::runtime::Runtime::new().unwrap();

    // seed outside of the measured loop
    let mut last_id = String::new();
    rt.block_on(async {
        for i in 0..1_000 {
            let created = services
                .users
                .create(json!({"phone": format!("600{i:06}"), "alias": format!("User {i}")}))
                .await
                .unwrap();
            last_id = created.id;
        }
    });

    c.bench_function("users_list_alias_filter", |b| {
        b.iter(|| rt.block_on(services.users.list(Some("user 99"))).unwrap());
    });
    c.bench_function("users_get_by_id", |b| {
        b.iter(|| rt.block_on(services.users.get(&last_id)).unwrap());
    });
}

criterion_group!(benches, bench_user_lookups);
criterion_main!(benches);
