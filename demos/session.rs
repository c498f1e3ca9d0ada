use household_api_client::{ApiClient, Config, Notification};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional: enable basic logging for the demo
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // HOUSEHOLD_API_BASE_URL, HOUSEHOLD_USER and HOUSEHOLD_PASSWORD must be set
    let client = ApiClient::new(Config::from_env()?)?;
    client.on_notification(|n: &Notification| eprintln!("[{:?}] {}", n.severity, n.message));
    let _logout = client.register_logout_handler(|| eprintln!("session lost; please log in again"));

    client
        .login(
            &std::env::var("HOUSEHOLD_USER")?,
            &std::env::var("HOUSEHOLD_PASSWORD")?,
        )
        .await?;
    println!("session valid: {}", client.check_session().await);

    let tasks: serde_json::Value = client.get_data("/tasks").await?;
    println!("{tasks:#}");

    client.logout().await;
    Ok(())
}
