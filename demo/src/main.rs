use event_bus::{
    BusError, DispatchMode, EventRegistry, RegistryConfig, async_handler_fn, handler_fn,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Default)]
struct OrderPlaced {
    order_id: u32,
    amount: i64,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,event_bus=debug")),
        )
        .with_target(true)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = RegistryConfig::builder()
        .maybe_label(Some("orders".into()))
        .build();
    let bus: Arc<EventRegistry<OrderPlaced>> = Arc::new(EventRegistry::with_config(config));
    let revenue = Arc::new(AtomicI64::new(0));

    {
        let revenue = revenue.clone();
        bus.register(
            "order.placed",
            handler_fn("revenue", move |e: &OrderPlaced| {
                revenue.fetch_add(e.amount, Ordering::SeqCst);
                Ok(())
            }),
        );
    }
    bus.register_with_mode(
        "order.placed",
        async_handler_fn("mailer", |e: OrderPlaced| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tracing::info!(order_id = e.order_id, "confirmation mail sent");
            Ok(())
        }),
        DispatchMode::Spawned,
    );
    // 重复注册被忽略
    bus.register("order.placed", handler_fn("revenue", |_: &OrderPlaced| Ok(())));
    println!("{bus}");

    let handle = bus
        .emit(
            "order.placed",
            OrderPlaced {
                order_id: 1,
                amount: 120,
            },
        )
        .await?;
    let report = handle.join().await;
    println!(
        "order 1: revenue={} background_ok={}",
        revenue.load(Ordering::SeqCst),
        report.is_success()
    );

    let _ = bus
        .emit_only(
            "order.placed",
            "revenue",
            OrderPlaced {
                order_id: 2,
                amount: 30,
            },
        )
        .await?;
    println!(
        "order 2 (revenue only): revenue={}",
        revenue.load(Ordering::SeqCst)
    );

    let report = bus
        .emit_and_wait(
            "order.placed",
            OrderPlaced {
                order_id: 3,
                amount: 50,
            },
        )
        .await;
    println!(
        "order 3 (concurrent): completed={:?} revenue={}",
        report.completed(),
        revenue.load(Ordering::SeqCst)
    );

    let checkout = bus.emit_after("order.placed", |total: i64| async move { total * 2 });
    let doubled = checkout.call(21).await?;
    println!("emit_after returned {doubled}");

    bus.remove_handler("order.placed", "mailer")?;
    println!("handlers: {:?}", bus.handler_names("order.placed"));

    if let Err(err @ BusError::HandlerNotFound { .. }) =
        bus.remove_handler("order.placed", "mailer")
    {
        eprintln!("expected: {err}");
    }

    println!("{bus}");
    Ok(())
}
