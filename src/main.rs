//! mailadm binary entry point.

#[tokio::main]
async fn main() {
    std::process::exit(mailadm::run().await);
}
