#[tokio::main]
async fn main() {
    std::process::exit(cannon_cli::run().await);
}
