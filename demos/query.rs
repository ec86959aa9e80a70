//! Runs a handful of queries and edits against an nginx-style config.
//!
//! ```sh
//! cargo run --example query
//! ```

use shor::ShorTree;

fn main() -> miette::Result<()> {
    let mut conf: ShorTree = include_str!("nginx.shor").parse()?;

    println!("all third level nodes with no key");
    println!("{}", conf.query().all("*").all("*").all(""));

    println!("\nlast two include nodes under http");
    println!("{}", conf.query().all("http").last_n("include", 2));

    println!("\nsecond top level node");
    println!("{}", conf.query().at("*", 1));

    println!("\nfourth to last node in the first http");
    println!("{}", conf.query().first("http").at("*", -4));

    println!("\nall nodes in the first server of mail");
    println!("{}", conf.query().first("mail").first("server").all("*"));

    if let Some(user) = conf.query().first("user").get(0).and_then(|n| n.get::<String>()) {
        println!("\nuser: {}", user);
    }
    if let Some(workers) = conf
        .query()
        .first("worker_processes")
        .get(0)
        .and_then(|n| n.get::<f64>())
    {
        println!("\nworker_processes: {}", workers);
    }

    let gzip = conf.query().first("http").first("gzip").into_ids();
    if let Some(&gzip) = gzip.first() {
        if let Some(enabled) = conf.get::<bool>(gzip) {
            println!("\ngzip: {}", enabled);
            conf.set(gzip, !enabled);
            println!("gzip set to opposite: {:?}", conf.get::<bool>(gzip));
        }
    }
    Ok(())
}
