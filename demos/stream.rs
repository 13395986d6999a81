//! # Example: Stream posts and handle changes
//!
//! ```text
//! cargo run --example stream -- [service] [collection...]
//! RUST_LOG=jetvisor=debug cargo run --example stream
//! ```
//!
//! Prints new posts and identity updates until Ctrl-C, then prints the cursor
//! to resume from.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use jetvisor::status::Bus;
use jetvisor::{Dispatcher, Firehose, StatusKind, SubscriptionOptions, topic};

#[derive(Deserialize)]
struct Post {
    text: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let service = args
        .next()
        .unwrap_or_else(|| "jetstream2.us-east.bsky.network".to_string());
    let mut collections: Vec<String> = args.collect();
    if collections.is_empty() {
        collections.push("app.bsky.feed.post".to_string());
    }

    let opts = SubscriptionOptions::builder(service)
        .collections(collections)
        .build();

    let dispatcher = Arc::new(Dispatcher::new());
    let posts = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&posts);
    dispatcher.on::<topic::Create>(move |ev| {
        counter.fetch_add(1, Ordering::Relaxed);
        match ev.commit.record_as::<Post>() {
            Ok(post) => println!("[{}] {}", ev.did, post.text.replace('\n', " ")),
            Err(_) => println!("[{}] {}", ev.did, ev.commit.uri(&ev.did)),
        }
    });
    dispatcher.on::<topic::Identity>(|ev| {
        println!("[identity] {} -> {:?}", ev.did, ev.identity.handle);
    });

    let bus = Bus::new(256);
    let mut status = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match status.recv().await {
                Ok(ev) if ev.kind != StatusKind::DecodeFailed => {
                    println!("[status #{}] {:?} {}", ev.seq, ev.kind, ev.reason.as_deref().unwrap_or(""));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => eprintln!("[status] skipped {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let firehose = Firehose::builder(opts)
        .with_dispatcher(dispatcher)
        .with_status_bus(bus)
        .build()?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => firehose.close(),
        _ = firehose.closed() => {}
    }

    if let Some(err) = firehose.closed().await {
        eprintln!("stream failed: {err}");
    }
    println!(
        "{} posts; resume with cursor {:?}",
        posts.load(Ordering::Relaxed),
        firehose.resume_options().cursor()
    );
    Ok(())
}
