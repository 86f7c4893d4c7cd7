#[tokio::main]
async fn main() {
    flashfeast::start_server().await;
}
