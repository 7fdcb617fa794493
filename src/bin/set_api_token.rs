use lukkari::components::store::{keys, spawn_redis_store, LocalStore};
use lukkari::components::ApiClient;
use lukkari::config::Config;
use lukkari::error::{config_error, other_error, PlannerResult};
use std::sync::Arc;

const USAGE: &str = "usage: set_api_token [TOKEN] [--verify]\n\
    TOKEN defaults to the API_TOKEN environment variable";

#[tokio::main]
async fn main() -> PlannerResult<()> {
    let mut verify = false;
    let mut token_arg = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--verify" => verify = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => token_arg = Some(arg),
        }
    }

    // Load configuration
    let config = Config::load()?;

    let token = match token_arg.or_else(|| std::env::var("API_TOKEN").ok()) {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => return Err(other_error(USAGE)),
    };

    let redis_url = config
        .redis_url
        .clone()
        .ok_or_else(|| config_error("REDIS_URL must be set to store the token"))?;

    // Spawn the store actor
    let store_handle = spawn_redis_store(&redis_url, &config.store_key_prefix)?;

    store_handle.set(keys::TOKEN, &token).await?;
    println!("Token stored under '{}{}'", config.store_key_prefix, keys::TOKEN);

    if verify {
        let store: Arc<dyn LocalStore> = Arc::new(store_handle.clone());
        let api = ApiClient::from_config(&config, store)?;
        let reminders = api.get_reminders().await?;
        println!("Token accepted, {} reminders on the server", reminders.len());
    }

    store_handle.shutdown().await?;
    Ok(())
}
