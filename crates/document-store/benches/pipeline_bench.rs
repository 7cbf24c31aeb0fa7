use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use document_store::{Collection, Context, DocumentStore, Filter, InMemoryDocumentStore, Pipeline};
use serde_json::json;

fn seeded_store(rt: &tokio::runtime::Runtime, orders: usize) -> InMemoryDocumentStore {
    rt.block_on(async {
        let store = InMemoryDocumentStore::new();
        let ctx = Context::background();
        for c in 0..100 {
            let doc = json!({"id": format!("c{c}"), "name": format!("Customer {c}")});
            store
                .insert(&ctx, Collection::Customers, doc.as_object().cloned().unwrap())
                .await
                .unwrap();
        }
        for o in 0..orders {
            let doc = json!({
                "id": format!("o{o}"),
                "customerID": format!("c{}", o % 120),
                "items": [{"id": format!("i{o}"), "productID": "p1", "quantity": 1, "price": 9.99}],
                "total": 9.99,
                "status": "pending"
            });
            store
                .insert(&ctx, Collection::Orders, doc.as_object().cloned().unwrap())
                .await
                .unwrap();
        }
        store
    })
}

fn customer_join() -> Pipeline {
    Pipeline::new()
        .lookup(Collection::Customers, "customerID", "id", "customer")
        .unwind("customer")
}

fn bench_customer_join(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("pipeline/customer_join");

    for orders in [100, 1_000] {
        let store = seeded_store(&rt, orders);
        group.bench_with_input(BenchmarkId::from_parameter(orders), &orders, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    store
                        .aggregate(&Context::background(), Collection::Orders, customer_join())
                        .await
                        .unwrap()
                })
            });
        });
    }

    group.finish();
}

fn bench_single_order_join(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = seeded_store(&rt, 1_000);

    c.bench_function("pipeline/single_order_join", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .aggregate(
                        &Context::background(),
                        Collection::Orders,
                        customer_join().filter(Filter::by_id("o500")),
                    )
                    .await
                    .unwrap()
            })
        });
    });
}

criterion_group!(benches, bench_customer_join, bench_single_order_join);
criterion_main!(benches);
