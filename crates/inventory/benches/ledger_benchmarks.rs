use std::sync::Arc;

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};

use chrono::Utc;
use stockroom_core::ItemId;
use stockroom_events::InMemoryEventBus;
use stockroom_inventory::{
    InventoryItem, ItemDetails, LedgerConfig, LedgerEnvelope, MovementType, NewItem, NewMovement,
    StockLedger,
};

fn details(idx: usize) -> ItemDetails {
    ItemDetails {
        name: format!("Item {idx:04}"),
        category: "materials".to_string(),
        unit: "pcs".to_string(),
        location: "Bench".to_string(),
        min_stock: 10,
        max_stock: 1_000,
        cost_per_unit: 100,
        ..ItemDetails::default()
    }
}

fn movement(kind: MovementType) -> NewMovement {
    NewMovement {
        kind,
        quantity: 3,
        reason: "bench".to_string(),
        reference: None,
        date: None,
        created_by: None,
        occurred_at: Utc::now(),
    }
}

fn seeded_ledger() -> (StockLedger<Arc<InMemoryEventBus<LedgerEnvelope>>>, ItemId) {
    let ledger = StockLedger::in_memory(LedgerConfig::default());
    let item = ledger
        .register_item(NewItem {
            details: details(0),
            initial_stock: 500,
            created_by: None,
            occurred_at: Utc::now(),
        })
        .unwrap();
    let id = item.id_typed();
    (ledger, id)
}

fn bench_apply_movement(c: &mut Criterion) {
    // Fresh ledger per batch so history length stays bounded.
    c.bench_function("apply_movement", |b| {
        b.iter_batched(
            seeded_ledger,
            |(ledger, id)| {
                black_box(ledger.apply_movement(id, movement(MovementType::In)).unwrap());
                black_box(ledger.apply_movement(id, movement(MovementType::Out)).unwrap());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_low_stock_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_low_stock");

    for size in [100usize, 1_000, 5_000] {
        let ledger = StockLedger::in_memory(LedgerConfig::default());
        for idx in 0..size {
            ledger
                .register_item(NewItem {
                    details: details(idx),
                    initial_stock: (idx % 40) as i64,
                    created_by: None,
                    occurred_at: Utc::now(),
                })
                .unwrap();
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.query_low_stock().unwrap()));
        });
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let ledger = StockLedger::in_memory(LedgerConfig::default());
    let item = ledger
        .register_item(NewItem {
            details: details(0),
            initial_stock: 50,
            created_by: None,
            occurred_at: Utc::now(),
        })
        .unwrap();
    for n in 0..10_000 {
        let kind = if n % 3 == 0 { MovementType::Out } else { MovementType::In };
        ledger.apply_movement(item.id_typed(), movement(kind)).unwrap();
    }
    let item: InventoryItem = ledger.get(item.id_typed()).unwrap();

    c.bench_function("replay_10k_movements", |b| {
        b.iter(|| black_box(item.replayed_stock()));
    });
}

criterion_group!(benches, bench_apply_movement, bench_low_stock_query, bench_replay);
criterion_main!(benches);
