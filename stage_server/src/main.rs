#[tokio::main]
async fn main() -> std::io::Result<()> {
    stage_server::run_with_config().await
}
