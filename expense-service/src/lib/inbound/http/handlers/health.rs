pub async fn health() -> &'static str {
    "API is running..."
}
