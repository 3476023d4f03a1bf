//! `pawmatch` binary entrypoint.

#[tokio::main]
async fn main() {
    let code = pawmatch_cli::run().await;
    std::process::exit(code);
}
