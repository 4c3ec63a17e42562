#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gardenbook_web::run().await
}
