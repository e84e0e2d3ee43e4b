#[tokio::main]
async fn main() {
    let code = scanorch::app::startup::startup().await;
    std::process::exit(code);
}
