use std::net::SocketAddr;

use sunstone::cli::{self, NotesArgs};
use sunstone::client::NotesClient;
use sunstone::config::Config;
use sunstone::store::NoteStore;
use tokio::net::TcpListener;

const USAGE: &str = "usage: sunstone [serve | import <file.json> | notes [--archived] [--q TEXT] [--tag TAG]... [--mood MOOD] | tags]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        None | Some("serve") => serve(&config).await,
        Some("import") => {
            let file = args.get(1).ok_or(USAGE)?;
            let store = NoteStore::connect(&config.database_url).await?;
            let result = cli::import_notes(&store, file).await;
            store.close().await;
            result.map(|_| ())
        }
        Some("notes") => {
            let notes_args = NotesArgs::parse(&args[1..])?;
            cli::print_notes(NotesClient::new(&config.api_url), &notes_args).await
        }
        Some("tags") => cli::print_tags(NotesClient::new(&config.api_url)).await,
        Some(_) => Err(USAGE.into()),
    }
}

async fn serve(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = NoteStore::connect(&config.database_url).await?;
    let app = sunstone::build_app(store.clone(), &config.allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    store.close().await;
    Ok(())
}
