/*
 * Responsibility
 * - tokio runtime 起動
 * - app::run() の呼び出し（ロジックは置かない）
 */
mod api;
mod app;
mod config;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
