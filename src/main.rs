#[tokio::main]
async fn main() {
    if let Err(err) = scada_ingest::run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
