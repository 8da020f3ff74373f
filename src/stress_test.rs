use async_stream::stream;
use futures::stream::Stream;
use futures::stream::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revdoc_core::{char_len, ClientId, DocumentId};
use revdoc_sdk::{
    ClientConfigBuilder, DocumentServer, EditorClient, MemoryTransport, Result as SdkResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Client = EditorClient<MemoryTransport>;

/// Statistics collected during stress testing
#[derive(Clone, Debug)]
pub struct StressTestStats {
    pub num_clients: usize,
    pub edits_per_client: usize,
    pub total_revisions: u64,
    pub total_time: Duration,
    pub avg_edit_time: Duration,
    pub ops_per_second: f64,
    pub converged: bool,
}

impl StressTestStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Stress Test Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Number of Clients:         {:>38} ║", self.num_clients);
        println!("║  Edits per Client:          {:>38} ║", self.edits_per_client);
        println!("║  Revisions Accepted:        {:>38} ║", self.total_revisions);
        println!("║  Total Time:                {:>39}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("║  Average Edit Time:         {:>36}µs ║", format!("{:.2}", self.avg_edit_time.as_micros()));
        println!("║  Operations/Second:         {:>38.0} ║", self.ops_per_second);
        println!("║  Converged:                 {:>38} ║", if self.converged { "yes" } else { "NO" });
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// What one step of the schedule does.
#[derive(Clone, Copy, Debug)]
enum Step {
    Insert { at: f64, len: usize },
    Delete { at: f64, len: usize },
    Publish,
    Deliver,
}

/// Generator that yields (client index, step) pairs for an editing session
fn edit_schedule_generator(num_clients: usize, num_steps: usize) -> impl Stream<Item = (usize, Step)> {
    stream! {
        let mut rng = StdRng::from_entropy();
        for _ in 0..num_steps {
            let client = rng.gen_range(0..num_clients);
            let step = match rng.gen_range(0..20) {
                0..=9 => Step::Insert { at: rng.gen(), len: rng.gen_range(1..6) },
                10..=14 => Step::Delete { at: rng.gen(), len: rng.gen_range(1..4) },
                15 => Step::Publish,
                _ => Step::Deliver,
            };
            yield (client, step);
        }
    }
}

/// Helper function to run one scheduled step on a client
async fn perform_step(client: &mut Client, step: Step, edit_times: &mut Vec<Duration>) -> SdkResult<()> {
    let len = char_len(client.draft());
    let started = Instant::now();

    match step {
        Step::Insert { at, len: count } => {
            let position = ((len as f64) * at) as usize;
            let text: String = "abcdefghij".chars().cycle().skip(position % 10).take(count).collect();
            client.insert(position.min(len), &text).await?;
        }
        Step::Delete { at, len: count } => {
            if len == 0 {
                return Ok(());
            }
            let position = (((len as f64) * at) as usize).min(len - 1);
            client.delete(position, count.min(len - position)).await?;
        }
        Step::Publish => client.publish().await?,
        Step::Deliver => {
            client.pump().await?;
            return Ok(());
        }
    }

    edit_times.push(started.elapsed());
    Ok(())
}

/// Deliver every outstanding broadcast until no client has pending edits
async fn settle(clients: &mut [Client]) -> SdkResult<()> {
    loop {
        let mut applied = 0;
        for client in clients.iter_mut() {
            applied += client.pump().await?;
        }
        if applied == 0 && clients.iter().all(|c| c.mirror().is_synchronized()) {
            return Ok(());
        }
    }
}

/// Stress test: many clients editing one document through the server
pub async fn stress_test_editing(num_clients: usize, edits_per_client: usize) -> SdkResult<StressTestStats> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Concurrent Editing Stress Test (Async)              ║");
    println!("║  Clients: {} | Edits/Client: {} ║", num_clients, edits_per_client);
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();

    let server = Arc::new(DocumentServer::default());
    let doc = DocumentId::new();
    server.create_document(doc.clone(), "The quick brown fox jumps over the lazy dog")?;
    let transport = Arc::new(MemoryTransport::new(server.clone()));

    println!("\n[Phase 1/3] Connecting clients...");
    let mut clients: Vec<Client> = Vec::with_capacity(num_clients);
    for i in 0..num_clients {
        let config = ClientConfigBuilder::new()
            .user_name(format!("user-{}", i))
            .client_id(ClientId::generate())
            .build();
        clients.push(EditorClient::connect(transport.clone(), doc.clone(), config).await?);
    }
    println!("[Phase 1/3] ✓ Completed");

    println!("[Phase 2/3] Editing concurrently...");
    let mut edit_times = vec![];
    let mut schedule = Box::pin(edit_schedule_generator(num_clients, num_clients * edits_per_client));

    let mut steps = 0;
    while let Some((index, step)) = schedule.next().await {
        perform_step(&mut clients[index], step, &mut edit_times).await?;
        steps += 1;
        if steps % 500 == 0 {
            println!("  Steps completed: {}/{}", steps, num_clients * edits_per_client);
            tokio::task::yield_now().await;
        }
    }
    println!("[Phase 2/3] ✓ Completed");

    println!("[Phase 3/3] Settling and verifying convergence...");
    settle(&mut clients).await?;

    let snapshot = server.snapshot(&doc)?;
    let converged = clients.iter().all(|client| {
        client.draft() == snapshot.draft
            && client.text() == snapshot.text
            && client.revision() == snapshot.revision
    });
    println!("[Phase 3/3] ✓ Completed");

    let total_time = start.elapsed();

    // Calculate statistics
    let avg_edit_time = if !edit_times.is_empty() {
        edit_times.iter().sum::<Duration>() / edit_times.len() as u32
    } else {
        Duration::ZERO
    };
    let ops_per_second = snapshot.revision.value() as f64 / total_time.as_secs_f64();

    Ok(StressTestStats {
        num_clients,
        edits_per_client,
        total_revisions: snapshot.revision.value(),
        total_time,
        avg_edit_time,
        ops_per_second,
        converged,
    })
}

/// Scaling analysis: how throughput changes with the number of clients
pub async fn stress_test_scaling(max_clients: usize, step_size: usize) -> SdkResult<()> {
    println!("\n  {:>8} | {:>10} | {:>12} | {:>9}", "Clients", "Revisions", "Ops/Second", "Converged");
    println!("  {:-<8}-+-{:-<10}-+-{:-<12}-+-{:-<9}", "", "", "", "");

    let mut clients = step_size.max(1);
    while clients <= max_clients {
        let stats = stress_test_editing(clients, 100).await?;
        println!(
            "  {:>8} | {:>10} | {:>12.0} | {:>9}",
            stats.num_clients,
            stats.total_revisions,
            stats.ops_per_second,
            stats.converged
        );
        clients += step_size.max(1);
    }
    Ok(())
}
