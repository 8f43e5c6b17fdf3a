use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use quill_app::{auth, DashboardController, FsSessionStore, Notice, Notifier, Phase, SessionStore};
use quill_client::models::ImageUpload;
use quill_client::ApiClient;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (defaults to QUILL_SERVER or http://127.0.0.1:8000)
    #[arg(short, long)]
    server: Option<String>,

    /// Where the session is kept (defaults to QUILL_SESSION_DIR or ~/.quill)
    #[arg(long)]
    session_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Clear the stored session
    Logout,

    /// Show who is logged in and whether the token still verifies
    Whoami,

    /// List available categories
    Categories {
        /// Filter by name substring
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Show the dashboard post list, newest first
    List,

    /// Create a post
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Category id; creation is refused without one
        #[arg(long)]
        category: Option<i64>,

        /// Path to an image file to attach
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Edit one of your posts
    Update {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[arg(long)]
        category: Option<i64>,

        /// Replacement image; without it the existing one is kept
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Delete one of your posts
    Delete {
        #[arg(short, long)]
        id: i64,
    },
}

/// Prints workflow notifications the way a toast would show them.
struct TermNotifier;

impl Notifier for TermNotifier {
    fn notify(&self, level: Notice, message: &str) {
        match level {
            Notice::Success => println!("✅ {}", message),
            Notice::Error => println!("❌ {}", message),
            Notice::Info => println!("ℹ️  {}", message),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let server = cli
        .server
        .or_else(|| std::env::var("QUILL_SERVER").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());

    let session_dir = match cli.session_dir {
        Some(dir) => dir,
        None => FsSessionStore::default_dir()?,
    };
    let store = Arc::new(FsSessionStore::new(session_dir));
    let notifier = Arc::new(TermNotifier);
    let api = ApiClient::new(server.clone());

    match &cli.command {
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            println!("📝 Registering {}", email);
            let ok = auth::register(
                &api,
                notifier.as_ref(),
                name,
                email,
                password,
                confirm_password.as_deref(),
            )
            .await;
            if !ok {
                std::process::exit(1);
            }
            println!("   Now login: quill-cli login --email {} --password ...", email);
        }

        Commands::Login { email, password } => {
            println!("🔑 Logging in as {}", email);
            match auth::login(&api, store.as_ref(), notifier.as_ref(), email, password).await? {
                Some(session) => {
                    println!("   User ID: {}", session.user.id);
                    println!("   Name: {}", session.user.name);
                    println!("   Email: {}", session.user.email);
                }
                None => std::process::exit(1),
            }
        }

        Commands::Logout => {
            store.clear()?;
            println!("✅ Logged out; local session cleared");
        }

        Commands::Whoami => match store.load()? {
            Some(session) => {
                println!(
                    "👤 {} <{}> (id {})",
                    session.user.name, session.user.email, session.user.id
                );
                let mut authed = api.clone();
                authed.set_token(session.token);
                match authed.current_user().await {
                    Ok(user) => println!("✅ Token still valid for {}", user.email),
                    Err(e) if e.is_unauthorized() => {
                        println!("❌ Token no longer valid, please login again")
                    }
                    Err(e) => println!("❌ Could not verify token: {}", e),
                }
            }
            None => {
                println!("❌ Not logged in");
                std::process::exit(1);
            }
        },

        Commands::Categories { name } => {
            let categories = api
                .list_categories(name.as_deref())
                .await
                .context("Failed to fetch categories")?;
            if categories.is_empty() {
                println!("   No categories found");
            } else {
                for category in categories {
                    println!("   [{}] {}", category.id, category.name);
                }
            }
        }

        Commands::List => {
            let dashboard = mounted_dashboard(&api, &store, &notifier).await?;
            let posts = dashboard.posts();
            println!("📋 {} posts", posts.len());
            println!();
            for (i, post) in posts.iter().enumerate() {
                let category = post
                    .category
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                let yours = if dashboard.can_modify(post) {
                    " (yours)"
                } else {
                    ""
                };
                println!("   {}. [{}] {}{}", i + 1, post.id, post.title, yours);
                println!("      By {} in {}", post.author.name, category);
                println!(
                    "      At {}",
                    post.created_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                if let Some(image) = &post.image {
                    println!("      Image: {}", image);
                }
                println!("      {}", truncate(&post.content, 60));
                println!();
            }
        }

        Commands::Create {
            title,
            content,
            category,
            image,
        } => {
            let mut dashboard = mounted_dashboard(&api, &store, &notifier).await?;
            dashboard.open_create();
            dashboard.set_title(title.clone());
            dashboard.set_content(content.clone());
            if let Some(category_id) = category {
                if !dashboard.select_category(*category_id).await {
                    std::process::exit(1);
                }
            }
            if let Some(path) = image {
                dashboard.attach_image(load_image(path)?);
            }
            if !dashboard.submit_editor().await {
                std::process::exit(1);
            }
        }

        Commands::Update {
            id,
            title,
            content,
            category,
            image,
        } => {
            let mut dashboard = mounted_dashboard(&api, &store, &notifier).await?;
            if !dashboard.open_edit(*id).await {
                std::process::exit(1);
            }
            if let Some(title) = title {
                dashboard.set_title(title.clone());
            }
            if let Some(content) = content {
                dashboard.set_content(content.clone());
            }
            if let Some(category_id) = category {
                if !dashboard.select_category(*category_id).await {
                    std::process::exit(1);
                }
            }
            if let Some(path) = image {
                dashboard.attach_image(load_image(path)?);
            }
            if !dashboard.submit_editor().await {
                std::process::exit(1);
            }
        }

        Commands::Delete { id } => {
            let mut dashboard = mounted_dashboard(&api, &store, &notifier).await?;
            if !dashboard.delete_post(*id).await {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Mount the dashboard; exits when no session is stored, like the redirect
/// to the login page.
async fn mounted_dashboard(
    api: &ApiClient,
    store: &Arc<FsSessionStore>,
    notifier: &Arc<TermNotifier>,
) -> Result<DashboardController> {
    let mut dashboard = DashboardController::new(
        Arc::new(api.clone()),
        store.clone(),
        notifier.clone(),
    );
    if dashboard.mount().await? == Phase::Unauthenticated {
        println!("❌ Not logged in. Please login first:");
        println!("   quill-cli login --email <email> --password <password>");
        std::process::exit(1);
    }
    Ok(dashboard)
}

fn load_image(path: &Path) -> Result<ImageUpload> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read image file {:?}", path))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    Ok(ImageUpload { filename, bytes })
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
