//! `patternlab patterns`: list the benchmark catalog.

use patternlab_bench::catalog;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "{:<26} {:<30} {:<16} {:>6} {:<10} {:>8}",
        "Key", "Name", "Category", "Iters", "Complexity", "Base ms"
    );
    println!("{}", "-".repeat(101));
    for p in catalog::all() {
        println!(
            "{:<26} {:<30} {:<16} {:>6} {:<10} {:>8.0}",
            p.key,
            p.name,
            p.category.as_str(),
            p.iterations,
            p.complexity.as_str(),
            p.base_latency_ms
        );
    }
    println!("\n{} patterns", catalog::all().len());
    Ok(())
}
