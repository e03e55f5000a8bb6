use snippets_api::infra::config::{Config, StoreBackend};
use snippets_api::{storage, ServiceError, SnippetService};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--create-user <username> <password>]\n\
         \n\
         Reads env vars:\n\
           STORE_BACKEND (postgres|memory, default postgres)\n\
           DATABASE_URL (required for postgres), DB_MAX_CONNECTIONS\n\
           BIND_ADDR, PUBLIC_BASE_URL, LOG_FORMAT\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let create_user = match args.iter().position(|a| a == "--create-user") {
        Some(i) => match (args.get(i + 1), args.get(i + 2)) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => usage_and_exit(),
        },
        None => None,
    };

    // Force-read config (nice error messages if missing)
    let config = Config::from_env()?;

    println!("> Preflight:");
    println!("  STORE_BACKEND={:?}", config.store_backend);
    println!("  BIND_ADDR={}", config.bind_addr);
    println!("  DB_MAX_CONNECTIONS={}", config.max_connections);
    println!("  PUBLIC_BASE_URL={}", config.public_base_url.as_deref().unwrap_or("<from Host header>"));
    println!("  LOG_FORMAT={:?}", config.log_format);
    if config.store_backend == StoreBackend::Memory {
        eprintln!("  Warning: memory backend keeps nothing across restarts.");
    }

    // Connectivity + migrations
    let store = storage::open(&config).await?;
    store.ping().await?;
    println!("  Record store reachable, schema up to date.");

    let owners = store.list_owners().await?;
    let snippets = store.list_snippets().await?;
    println!("  Owners: {}  Snippets: {}", owners.len(), snippets.len());
    let unowned = snippets.iter().filter(|s| s.owner.is_none()).count();
    if unowned > 0 {
        eprintln!("  Warning: {} snippet(s) have no owner and are read-only for everyone.", unowned);
    }

    if let Some((username, password)) = create_user {
        let service = SnippetService::new(store);
        match service.register_owner(&username, &password).await {
            Ok(owner) => println!("  Created user '{}' (id={}).", owner.username, owner.id),
            Err(ServiceError::Conflict(msg)) => println!("  {} Leaving it unchanged.", msg),
            Err(e) => return Err(anyhow::anyhow!("Failed to create user '{}': {}", username, e)),
        }
    } else if owners.is_empty() {
        eprintln!("  Warning: no users yet; writes need one. Re-run with --create-user <username> <password>");
    }

    println!("> Preflight OK.");
    Ok(())
}
