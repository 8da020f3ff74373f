use stress_test::{stress_test_editing, stress_test_scaling};
use tracing_subscriber::EnvFilter;
pub mod stress_test;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(async_main()) {
        eprintln!("stress test failed: {}", e);
        std::process::exit(1);
    }
}

async fn async_main() -> revdoc_sdk::Result<()> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: Small session
    let stats = stress_test_editing(3, 200).await?;
    stats.print();

    // Test 2: Medium session
    let stats = stress_test_editing(10, 300).await?;
    stats.print();

    // Test 3: Scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS                                  ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(20, 5).await?;

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
